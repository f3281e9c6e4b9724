use ahash::AHashMap;
use hibari_type::{Notification, NotificationId};

/// Merged view over the initial fetch and the push-event stream
///
/// Entries live in a map keyed by id; the sorted, truncated array is
/// re-derived after every update. Upserts are last-write-wins regardless of
/// timestamps, with a single carve-out: a notification that already reached
/// `Read` is never downgraded by an incoming event.
pub struct FeedState {
    entries: AHashMap<NotificationId, Notification>,
    derived: Vec<Notification>,
    max_notifications: usize,
}

impl FeedState {
    #[must_use]
    pub fn new(max_notifications: usize) -> Self {
        Self {
            entries: AHashMap::new(),
            derived: Vec::new(),
            max_notifications,
        }
    }

    /// Current sorted view, newest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        self.derived.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.derived.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.derived.is_empty()
    }

    /// Upsert one incoming notification, last write wins
    ///
    /// Returns whether the id was new to the feed, so the caller can tell
    /// fresh arrivals apart from updates to known entries.
    pub fn upsert(&mut self, incoming: Notification) -> bool {
        let newly_added = self.insert_clamped(incoming);
        self.rederive();
        newly_added
    }

    /// Apply a whole fetched list through the regular upsert path
    pub fn extend(&mut self, notifications: Vec<Notification>) {
        for notification in notifications {
            self.insert_clamped(notification);
        }
        self.rederive();
    }

    fn insert_clamped(&mut self, mut incoming: Notification) -> bool {
        if let Some(existing) = self.entries.get(&incoming.id) {
            if existing.status.is_read() && !incoming.status.is_read() {
                incoming.status = existing.status;
                incoming.read_at = incoming.read_at.or(existing.read_at);
            }
        }

        self.entries.insert(incoming.id.clone(), incoming).is_none()
    }

    /// Replace the whole state with a reduced list
    ///
    /// Used after the optimistic reducer produced a new list so map and
    /// derived view stay consistent.
    pub fn replace(&mut self, notifications: Vec<Notification>) {
        self.entries = notifications
            .into_iter()
            .map(|notification| (notification.id.clone(), notification))
            .collect();
        self.rederive();
    }

    fn rederive(&mut self) {
        let mut derived: Vec<Notification> = self.entries.values().cloned().collect();
        derived.sort_unstable_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_str().cmp(a.id.as_str()))
        });

        // Entries past the cap are evicted for good, otherwise they would
        // resurface once newer ones get deleted
        for evicted in derived.drain(self.max_notifications.min(derived.len())..) {
            self.entries.remove(&evicted.id);
        }

        self.derived = derived;
    }
}
