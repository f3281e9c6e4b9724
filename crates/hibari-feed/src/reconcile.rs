use crate::reducer::Action;
use hibari_client::{retry, AnyNotificationApi, NotificationApi};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Best-effort confirmation of optimistic updates
///
/// Every dispatched confirmation is fire-and-forget: it runs detached from
/// the caller, success is logged at debug, failure at warn. The optimistic
/// state is never rolled back on failure; perceived responsiveness wins
/// over strict consistency here.
#[derive(Clone)]
pub struct Reconciler {
    api: Arc<AnyNotificationApi>,
    max_retries: u32,
}

impl Reconciler {
    #[must_use]
    pub fn new(api: Arc<AnyNotificationApi>, max_retries: u32) -> Self {
        Self { api, max_retries }
    }

    /// Dispatch the confirmation matching an optimistic action
    ///
    /// `Add` has no remote counterpart; new entries only ever originate
    /// remotely. The returned handle is only awaited by tests; dropping it
    /// leaves the task running, which is exactly what unmounting the
    /// consumer is supposed to do.
    pub fn dispatch(&self, action: &Action) -> Option<JoinHandle<()>> {
        let api = self.api.clone();
        let max_retries = self.max_retries;

        let handle = match action {
            Action::MarkRead(id) => {
                let id = id.clone();
                tokio::spawn(async move {
                    log_outcome(
                        "mark-read",
                        retry(max_retries, || api.mark_read(&id)).await,
                    );
                })
            }
            Action::MarkUnread(id) => {
                let id = id.clone();
                tokio::spawn(async move {
                    log_outcome(
                        "mark-unread",
                        retry(max_retries, || api.mark_unread(&id)).await,
                    );
                })
            }
            Action::MarkAllRead => tokio::spawn(async move {
                log_outcome(
                    "mark-all-read",
                    retry(max_retries, || api.mark_all_read()).await,
                );
            }),
            Action::Delete(id) => {
                let id = id.clone();
                tokio::spawn(async move {
                    log_outcome("delete", retry(max_retries, || api.delete(&id)).await);
                })
            }
            Action::Add(..) => return None,
        };

        Some(handle)
    }
}

fn log_outcome(operation: &str, result: hibari_client::Result<()>) {
    match result {
        Ok(()) => debug!(operation, "confirmation succeeded"),
        Err(error) => warn!(?error, operation, "confirmation failed, keeping optimistic state"),
    }
}

#[cfg(test)]
mod test {
    use super::Reconciler;
    use crate::reducer::Action;
    use hibari_client::{AnyNotificationApi, InProcessNotificationApi, NotificationApi};
    use hibari_type::{DeliveryStatus, Notification};
    use std::sync::Arc;

    fn notification(id: &str) -> Notification {
        Notification::builder()
            .id(id)
            .user_id("user-1")
            .title(id)
            .build()
    }

    #[tokio::test]
    async fn dispatch_confirms_remotely() {
        let api = Arc::new(AnyNotificationApi::from(InProcessNotificationApi::new(
            vec![notification("n1")],
        )));
        let reconciler = Reconciler::new(api.clone(), 1);

        reconciler
            .dispatch(&Action::MarkRead("n1".into()))
            .unwrap()
            .await
            .unwrap();

        let remote = api.list().await.unwrap();
        assert_eq!(remote[0].status, DeliveryStatus::Read);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let in_process = InProcessNotificationApi::new(vec![notification("n1")]);
        in_process.set_fail_mutations(true);
        let api = Arc::new(AnyNotificationApi::from(in_process));
        let reconciler = Reconciler::new(api, 1);

        // The task itself must not panic even though every attempt fails
        reconciler
            .dispatch(&Action::Delete("n1".into()))
            .unwrap()
            .await
            .unwrap();
    }
}
