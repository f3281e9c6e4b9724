use crate::{Error, NotificationApi, Result};
use hibari_type::{DeliveryStatus, Notification, NotificationId};
use iso8601_timestamp::Timestamp;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

/// In-process backend of the notification API
///
/// Holds the "remote" list in memory. Used when hibari is embedded next to
/// its host application and by tests that need a deterministic remote.
#[derive(Default)]
pub struct InProcessNotificationApi {
    state: Mutex<Vec<Notification>>,
    fail_mutations: AtomicBool,
    fail_list: AtomicBool,
}

impl InProcessNotificationApi {
    #[must_use]
    pub fn new(initial: Vec<Notification>) -> Self {
        Self {
            state: Mutex::new(initial),
            fail_mutations: AtomicBool::new(false),
            fail_list: AtomicBool::new(false),
        }
    }

    /// Make every mutating call fail until switched back
    pub fn set_fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    /// Make every list call fail until switched back
    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    fn check_mutations_enabled(&self) -> Result<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(Error::Unavailable);
        }

        Ok(())
    }
}

impl NotificationApi for InProcessNotificationApi {
    async fn list(&self) -> Result<Vec<Notification>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Error::Unavailable);
        }

        Ok(self.state.lock().unwrap().clone())
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<()> {
        self.check_mutations_enabled()?;

        let mut guard = self.state.lock().unwrap();
        if let Some(notification) = guard.iter_mut().find(|n| n.id == *id) {
            notification.status = DeliveryStatus::Read;
            notification.read_at.get_or_insert(Timestamp::now_utc());
        }

        Ok(())
    }

    async fn mark_unread(&self, id: &NotificationId) -> Result<()> {
        self.check_mutations_enabled()?;

        let mut guard = self.state.lock().unwrap();
        if let Some(notification) = guard.iter_mut().find(|n| n.id == *id) {
            notification.status = DeliveryStatus::Delivered;
            notification.read_at = None;
        }

        Ok(())
    }

    async fn mark_all_read(&self) -> Result<()> {
        self.check_mutations_enabled()?;

        let now = Timestamp::now_utc();
        let mut guard = self.state.lock().unwrap();
        for notification in guard.iter_mut() {
            notification.status = DeliveryStatus::Read;
            notification.read_at.get_or_insert(now);
        }

        Ok(())
    }

    async fn delete(&self, id: &NotificationId) -> Result<()> {
        self.check_mutations_enabled()?;

        self.state.lock().unwrap().retain(|n| n.id != *id);

        Ok(())
    }
}
