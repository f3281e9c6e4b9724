use hibari_type::{DeliveryStatus, Notification, NotificationId};
use iso8601_timestamp::Timestamp;

/// Optimistic action applied to the local list before remote confirmation
#[derive(Clone, Debug)]
pub enum Action {
    MarkRead(NotificationId),
    MarkAllRead,
    MarkUnread(NotificationId),
    Delete(NotificationId),
    Add(Box<Notification>),
}

/// Apply one action to the list
///
/// Pure and deterministic: the clock is an argument, nothing is mutated in
/// place, actions without a matching id are the identity. This keeps the
/// function replayable for speculative application.
#[must_use]
pub fn apply(
    list: &[Notification],
    action: &Action,
    now: Timestamp,
    max_retained: usize,
) -> Vec<Notification> {
    match action {
        Action::MarkRead(id) => list
            .iter()
            .map(|notification| {
                if notification.id == *id {
                    read(notification.clone(), now)
                } else {
                    notification.clone()
                }
            })
            .collect(),

        Action::MarkAllRead => list
            .iter()
            .map(|notification| read(notification.clone(), now))
            .collect(),

        Action::MarkUnread(id) => list
            .iter()
            .map(|notification| {
                if notification.id == *id {
                    let mut unread = notification.clone();
                    unread.status = DeliveryStatus::Delivered;
                    unread.read_at = None;
                    unread
                } else {
                    notification.clone()
                }
            })
            .collect(),

        Action::Delete(id) => list
            .iter()
            .filter(|notification| notification.id != *id)
            .cloned()
            .collect(),

        Action::Add(notification) => {
            let mut next = Vec::with_capacity(list.len() + 1);
            next.push((**notification).clone());
            next.extend(
                list.iter()
                    .filter(|existing| existing.id != notification.id)
                    .cloned(),
            );
            next.truncate(max_retained);
            next
        }
    }
}

fn read(mut notification: Notification, now: Timestamp) -> Notification {
    notification.status = DeliveryStatus::Read;
    notification.read_at.get_or_insert(now);
    notification
}
