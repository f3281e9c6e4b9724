use hibari_client::{AnyNotificationApi, InProcessNotificationApi};
use hibari_feed::{FeedServiceInit, GetNotifications, LoadState};
use hibari_messaging::{tokio_broadcast::TokioBroadcastMessagingBackend, MessagingHub};
use hibari_type::{Category, ConnectionStatus, DeliveryStatus, Notification, Payload, PushEvent};
use std::time::Duration;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn notification(id: &str, status: DeliveryStatus) -> Notification {
    Notification::builder()
        .id(id)
        .user_id("user-1")
        .title(id)
        .status(status)
        .build()
}

fn push_event(id: &str) -> PushEvent {
    PushEvent {
        id: Some(id.into()),
        title: Some("updated".into()),
        status: Some("delivered".into()),
        ..PushEvent::default()
    }
}

struct Harness {
    hub: MessagingHub,
    service: hibari_feed::FeedService,
}

async fn harness(api: InProcessNotificationApi) -> Harness {
    let hub = MessagingHub::new(TokioBroadcastMessagingBackend::default());
    let consumer = hub.consumer::<PushEvent>("user-1".into()).await.unwrap();

    let service = FeedServiceInit::builder()
        .consumer(consumer)
        .api(AnyNotificationApi::from(api))
        .user_id("user-1")
        .build()
        .spawn();

    Harness { hub, service }
}

#[tokio::test]
async fn push_event_wins_over_initial_fetch() {
    let api = InProcessNotificationApi::new(vec![notification("n1", DeliveryStatus::Sent)]);
    let Harness { hub, service } = harness(api).await;

    let mut load = service.load_state();
    timeout(WAIT, load.wait_for(|state| *state == LoadState::Loaded))
        .await
        .unwrap()
        .unwrap();

    hub.emitter::<PushEvent>("user-1".into())
        .emit(push_event("n1"))
        .await
        .unwrap();

    let mut list = service.notifications();
    let merged = timeout(
        WAIT,
        list.wait_for(|list| list.first().is_some_and(|n| n.status == DeliveryStatus::Delivered)),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].id.as_str(), "n1");
    assert_eq!(merged[0].title, "updated");
}

#[tokio::test]
async fn optimistic_mark_read_survives_failed_confirmation() {
    let api = InProcessNotificationApi::new(vec![notification("n1", DeliveryStatus::Delivered)]);
    api.set_fail_mutations(true);
    let Harness { service, .. } = harness(api).await;

    let mut load = service.load_state();
    timeout(WAIT, load.wait_for(|state| *state == LoadState::Loaded))
        .await
        .unwrap()
        .unwrap();

    service.mark_read("n1".into());

    // Applied synchronously, before any confirmation round-trip
    assert_eq!(
        service.notifications().borrow()[0].status,
        DeliveryStatus::Read
    );

    // Let the confirmation task fail its attempts; no rollback may happen
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        service.notifications().borrow()[0].status,
        DeliveryStatus::Read
    );
    assert_eq!(service.unread_count(), 0);
}

#[tokio::test]
async fn failed_initial_fetch_degrades_to_push_only() {
    let api = InProcessNotificationApi::new(vec![notification("n1", DeliveryStatus::Sent)]);
    api.set_fail_list(true);
    let Harness { hub, service } = harness(api).await;

    let mut load = service.load_state();
    timeout(WAIT, load.wait_for(|state| *state == LoadState::Failed))
        .await
        .unwrap()
        .unwrap();
    assert!(service.notifications().borrow().is_empty());

    // Push events still populate the feed
    hub.emitter::<PushEvent>("user-1".into())
        .emit(push_event("n2"))
        .await
        .unwrap();

    let mut list = service.notifications();
    timeout(WAIT, list.wait_for(|list| list.len() == 1))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn malformed_push_events_are_dropped() {
    let api = InProcessNotificationApi::new(Vec::new());
    let Harness { hub, service } = harness(api).await;

    let mut load = service.load_state();
    timeout(WAIT, load.wait_for(|state| *state == LoadState::Loaded))
        .await
        .unwrap()
        .unwrap();

    let emitter = hub.emitter::<PushEvent>("user-1".into());
    emitter
        .emit(PushEvent {
            title: Some("no id".into()),
            ..PushEvent::default()
        })
        .await
        .unwrap();
    emitter.emit(push_event("n1")).await.unwrap();

    let mut list = service.notifications();
    let merged = timeout(WAIT, list.wait_for(|list| !list.is_empty()))
        .await
        .unwrap()
        .unwrap()
        .clone();

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].id.as_str(), "n1");
}

#[tokio::test]
async fn updates_to_known_ids_do_not_retoast() {
    let api = InProcessNotificationApi::new(Vec::new());
    let Harness { hub, service } = harness(api).await;

    let mut load = service.load_state();
    timeout(WAIT, load.wait_for(|state| *state == LoadState::Loaded))
        .await
        .unwrap()
        .unwrap();

    let emitter = hub.emitter::<PushEvent>("user-1".into());
    emitter.emit(push_event("n1")).await.unwrap();

    let mut toasts = service.toasts();
    timeout(WAIT, toasts.wait_for(|toasts| toasts.len() == 1))
        .await
        .unwrap()
        .unwrap();

    // A status update for the same id merges into the list without a toast
    emitter
        .emit(PushEvent {
            status: Some("read".into()),
            ..push_event("n1")
        })
        .await
        .unwrap();

    let mut list = service.notifications();
    timeout(
        WAIT,
        list.wait_for(|list| list.first().is_some_and(|n| n.status == DeliveryStatus::Read)),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(service.toasts().borrow().len(), 1);
}

#[tokio::test]
async fn retry_after_successful_load_is_a_noop() {
    let api = InProcessNotificationApi::new(vec![notification("n1", DeliveryStatus::Sent)]);
    let Harness { service, .. } = harness(api).await;

    let mut load = service.load_state();
    timeout(WAIT, load.wait_for(|state| *state == LoadState::Loaded))
        .await
        .unwrap()
        .unwrap();

    service.delete("n1".into());
    service.retry_initial_fetch().await;

    // The initial list only ever merges in once; the deleted entry must
    // not come back
    assert!(service.notifications().borrow().is_empty());
}

#[tokio::test]
async fn connection_status_is_observable() {
    let api = InProcessNotificationApi::new(Vec::new());
    let Harness { service, .. } = harness(api).await;

    assert_eq!(
        *service.connection_status().borrow(),
        ConnectionStatus::Connected
    );
}

#[tokio::test]
async fn queries_filter_the_merged_feed() {
    let mut with_order = notification("n1", DeliveryStatus::Delivered);
    with_order.payload = Payload::Order {
        order_id: "ord-1".into(),
        total_cents: None,
    };
    let api =
        InProcessNotificationApi::new(vec![with_order, notification("n2", DeliveryStatus::Sent)]);
    let Harness { service, .. } = harness(api).await;

    let mut load = service.load_state();
    timeout(WAIT, load.wait_for(|state| *state == LoadState::Loaded))
        .await
        .unwrap()
        .unwrap();

    let query = GetNotifications::builder()
        .included_categories(vec![Category::Order])
        .limit(10)
        .build();
    let matches = service.get_notifications(&query).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id.as_str(), "n1");

    let over_limit = GetNotifications::builder().limit(10_000).build();
    assert!(service.get_notifications(&over_limit).is_err());
}
