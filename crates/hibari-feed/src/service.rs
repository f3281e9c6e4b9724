use crate::{
    merge::FeedState,
    query::GetNotifications,
    reconcile::Reconciler,
    reducer::{self, Action},
    toast::{Toast, ToastQueue},
    LimitContext, Result,
};
use futures_util::StreamExt;
use garde::Validate;
use hibari_client::{retry, AnyNotificationApi, NotificationApi};
use hibari_config::{feed, toast};
use hibari_messaging::{ConsumeError, MessageConsumer};
use hibari_type::{ConnectionStatus, Notification, NotificationId, PushEvent};
use iso8601_timestamp::Timestamp;
use smol_str::SmolStr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use tokio::{
    sync::{watch, Notify},
    task::JoinHandle,
    time::Instant,
};
use typed_builder::TypedBuilder;

/// Progress of the one-time initial fetch
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadState {
    Loading,
    Loaded,

    /// The fetch failed; the feed runs on push events alone until
    /// [`FeedService::retry_initial_fetch`] succeeds
    Failed,
}

struct Shared {
    reconciler: Reconciler,
    api: Arc<AnyNotificationApi>,
    feed: Mutex<FeedState>,
    toasts: Mutex<ToastQueue>,
    list_tx: watch::Sender<Vec<Notification>>,
    toast_tx: watch::Sender<Vec<Toast>>,
    load_tx: watch::Sender<LoadState>,
    initial_applied: AtomicBool,
    wake: Notify,
    max_retries: u32,
    max_notifications: usize,
}

impl Shared {
    fn publish_list(&self) {
        let snapshot = self.feed.lock().unwrap().snapshot();
        self.list_tx.send_replace(snapshot);
    }

    fn publish_toasts(&self) {
        let snapshot = self.toasts.lock().unwrap().toasts().to_vec();
        self.toast_tx.send_replace(snapshot);
    }

    async fn fetch_initial(&self) {
        if self.initial_applied.load(Ordering::SeqCst) {
            return;
        }
        self.load_tx.send_replace(LoadState::Loading);

        match retry(self.max_retries, || self.api.list()).await {
            Ok(list) => {
                if self
                    .initial_applied
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    self.feed.lock().unwrap().extend(list);
                    self.publish_list();
                }
                self.load_tx.send_replace(LoadState::Loaded);
            }
            Err(error) => {
                warn!(?error, "initial fetch failed, starting with an empty feed");
                self.load_tx.send_replace(LoadState::Failed);
            }
        }
    }

    fn handle_push(&self, user_id: &str, event: PushEvent) {
        let notification = match event.into_notification(user_id) {
            Ok(notification) => notification,
            Err(error) => {
                warn!(?error, "dropping malformed push event");
                return;
            }
        };

        let newly_added = self.feed.lock().unwrap().upsert(notification.clone());
        self.publish_list();

        // Only fresh arrivals get a toast; updates to known entries would
        // re-toast on every status change
        if newly_added {
            self.toasts
                .lock()
                .unwrap()
                .show(notification, Instant::now());
            self.publish_toasts();
        }
    }

    fn advance_toasts(&self) {
        self.toasts.lock().unwrap().advance(Instant::now());
        self.publish_toasts();
    }

    fn next_toast_deadline(&self) -> Option<Instant> {
        self.toasts.lock().unwrap().next_deadline()
    }
}

#[derive(TypedBuilder)]
pub struct FeedServiceInit {
    consumer: MessageConsumer<PushEvent>,
    api: AnyNotificationApi,

    #[builder(setter(into))]
    user_id: SmolStr,

    #[builder(default)]
    feed_config: feed::Configuration,

    #[builder(default)]
    toast_config: toast::Configuration,

    #[builder(default = 1)]
    max_retries: u32,
}

impl FeedServiceInit {
    /// Wire the service together and start its driver task
    #[must_use]
    pub fn spawn(self) -> FeedService {
        let api = Arc::new(self.api);
        let (list_tx, _) = watch::channel(Vec::new());
        let (toast_tx, _) = watch::channel(Vec::new());
        let (load_tx, _) = watch::channel(LoadState::Loading);

        let shared = Arc::new(Shared {
            reconciler: Reconciler::new(api.clone(), self.max_retries),
            api,
            feed: Mutex::new(FeedState::new(self.feed_config.max_notifications)),
            toasts: Mutex::new(ToastQueue::new(&self.toast_config)),
            list_tx,
            toast_tx,
            load_tx,
            initial_applied: AtomicBool::new(false),
            wake: Notify::new(),
            max_retries: self.max_retries,
            max_notifications: self.feed_config.max_notifications,
        });

        let status_rx = self.consumer.status();
        let driver = tokio::spawn(drive(shared.clone(), self.consumer, self.user_id.clone()));

        FeedService {
            shared,
            status_rx,
            driver,
        }
    }
}

/// Driver loop: one-time initial fetch, then push events and toast timers
///
/// Everything that mutates state runs on this task or synchronously inside
/// a caller's action method; the locks are only ever held for the duration
/// of one synchronous mutation.
async fn drive(shared: Arc<Shared>, mut consumer: MessageConsumer<PushEvent>, user_id: SmolStr) {
    shared.fetch_initial().await;

    loop {
        let deadline = shared.next_toast_deadline();

        tokio::select! {
            event = consumer.next() => match event {
                Some(Ok(event)) => shared.handle_push(&user_id, event),
                Some(Err(ConsumeError::Lagged(skipped))) => {
                    warn!(skipped, "push channel lagged, dropped events are lost");
                }
                Some(Err(error)) => warn!(?error, "dropping undecodable push message"),
                None => {
                    if let Err(error) = consumer.reconnect().await {
                        error!(?error, "push channel closed and reconnection failed");
                        break;
                    }
                }
            },
            () = sleep_until_or_forever(deadline) => shared.advance_toasts(),
            () = shared.wake.notified() => {}
        }
    }
}

async fn sleep_until_or_forever(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// The notification feed, fully wired
///
/// Owns the merged list, the toast queue and the reconciler. Constructed
/// once per user session and passed around by reference; dropping it aborts
/// the driver (and with it all toast timers) while any in-flight
/// confirmation calls keep running to completion.
pub struct FeedService {
    shared: Arc<Shared>,
    status_rx: watch::Receiver<ConnectionStatus>,
    driver: JoinHandle<()>,
}

impl FeedService {
    /// Observe the merged, sorted notification list
    #[must_use]
    pub fn notifications(&self) -> watch::Receiver<Vec<Notification>> {
        self.shared.list_tx.subscribe()
    }

    /// Observe the toast queue
    #[must_use]
    pub fn toasts(&self) -> watch::Receiver<Vec<Toast>> {
        self.shared.toast_tx.subscribe()
    }

    /// Observe the initial-fetch state
    #[must_use]
    pub fn load_state(&self) -> watch::Receiver<LoadState> {
        self.shared.load_tx.subscribe()
    }

    /// Observe the push-channel connection status
    #[must_use]
    pub fn connection_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Re-run the initial fetch after a failure
    ///
    /// A no-op once the fetch has been applied; the initial list only ever
    /// merges in once.
    pub async fn retry_initial_fetch(&self) {
        self.shared.fetch_initial().await;
    }

    pub fn mark_read(&self, id: NotificationId) {
        self.apply_optimistic(Action::MarkRead(id));
    }

    pub fn mark_all_read(&self) {
        self.apply_optimistic(Action::MarkAllRead);
    }

    pub fn mark_unread(&self, id: NotificationId) {
        self.apply_optimistic(Action::MarkUnread(id));
    }

    pub fn delete(&self, id: NotificationId) {
        self.apply_optimistic(Action::Delete(id));
    }

    /// Apply an action locally, then confirm it remotely without waiting
    ///
    /// The local list is consistent with the action before the network call
    /// is even dispatched.
    fn apply_optimistic(&self, action: Action) {
        {
            let mut feed = self.shared.feed.lock().unwrap();
            let next = reducer::apply(
                &feed.snapshot(),
                &action,
                Timestamp::now_utc(),
                self.shared.max_notifications,
            );
            feed.replace(next);
        }
        self.shared.publish_list();

        drop(self.shared.reconciler.dispatch(&action));
    }

    /// Validated, filtered read over the merged feed
    ///
    /// # Errors
    ///
    /// - The query failed validation
    pub fn get_notifications(&self, query: &GetNotifications) -> Result<Vec<Notification>> {
        query.validate(&LimitContext::default())?;

        let snapshot = self.shared.feed.lock().unwrap().snapshot();
        Ok(snapshot
            .into_iter()
            .filter(|notification| query.matches(notification))
            .take(query.limit)
            .collect())
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.shared
            .feed
            .lock()
            .unwrap()
            .snapshot()
            .iter()
            .filter(|notification| !notification.status.is_read())
            .count()
    }

    /// Dismiss a specific toast ahead of its timer
    pub fn hide_toast(&self, id: &NotificationId) {
        self.shared.toasts.lock().unwrap().hide(id, Instant::now());
        self.shared.publish_toasts();
        self.shared.wake.notify_one();
    }

    /// Dismiss every toast
    pub fn clear_toasts(&self) {
        self.shared.toasts.lock().unwrap().clear(Instant::now());
        self.shared.publish_toasts();
        self.shared.wake.notify_one();
    }

    /// Swap in the user's display preferences for future toasts
    pub fn apply_toast_preferences(&self, preferences: &hibari_prefs::ToastPreferences) {
        self.shared
            .toasts
            .lock()
            .unwrap()
            .apply_preferences(preferences);
        self.shared.wake.notify_one();
    }
}

impl Drop for FeedService {
    fn drop(&mut self) {
        // Toast timers die with the driver; in-flight confirmations are
        // detached on purpose and finish on their own
        self.driver.abort();
    }
}
