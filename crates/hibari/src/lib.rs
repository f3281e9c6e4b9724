//! Umbrella crate
//!
//! Wires the push channel, the confirmation client, the preference store
//! and the feed service together from one [`Configuration`]. Construction
//! is explicit; the caller owns the resulting [`NotificationCenter`] and
//! passes it to whoever needs it.

use hibari_client::{AnyNotificationApi, HttpNotificationApi, InProcessNotificationApi};
use hibari_config::{api, messaging as messaging_config, preferences, Configuration};
use hibari_error::{Error, ErrorType, Result};
use hibari_feed::{FeedService, FeedServiceInit};
use hibari_messaging::{tokio_broadcast::TokioBroadcastMessagingBackend, MessagingHub};
use hibari_prefs::{AnyStore, FileStore, InMemoryStore, NoopStore, PreferencesService};
use hibari_type::PushEvent;
use std::time::Duration;

pub use hibari_client as client;
pub use hibari_config as config;
pub use hibari_error as error;
pub use hibari_feed as feed;
pub use hibari_messaging as messaging;
pub use hibari_prefs as prefs;
pub use hibari_type as types;

/// Everything one user session needs, explicitly constructed
pub struct NotificationCenter {
    pub feed: FeedService,
    pub preferences: PreferencesService,

    /// The push hub; the host application keeps emitting into it
    pub hub: MessagingHub,
}

impl NotificationCenter {
    /// Build the full stack for one user from the configuration
    ///
    /// # Errors
    ///
    /// - The API backend could not be constructed
    /// - The push channel could not be subscribed
    pub async fn prepare(config: &Configuration, user_id: &str) -> Result<Self> {
        let hub = match &config.messaging {
            messaging_config::Configuration::InProcess(in_process) => MessagingHub::new(
                TokioBroadcastMessagingBackend::new(in_process.channel_capacity),
            ),
        };

        let api = match &config.api {
            api::Configuration::Http(http) => AnyNotificationApi::from(HttpNotificationApi::new(
                http.base_url.as_str(),
                Some(Duration::from_secs(http.timeout_secs)),
            )?),
            api::Configuration::InProcess => {
                AnyNotificationApi::from(InProcessNotificationApi::default())
            }
        };

        let store = match &config.preferences {
            preferences::Configuration::File(file) => {
                AnyStore::from(FileStore::new(file.path.as_str()))
            }
            preferences::Configuration::InMemory => AnyStore::from(InMemoryStore::default()),
            preferences::Configuration::None => AnyStore::from(NoopStore),
        };
        let preferences = PreferencesService::load(store).await;

        let consumer = hub
            .consumer::<PushEvent>(channel_name(user_id))
            .await
            .map_err(|err| Error::msg(err).with_error_type(ErrorType::Unavailable))?;

        let max_retries = match &config.api {
            api::Configuration::Http(http) => http.max_retries,
            api::Configuration::InProcess => 1,
        };

        let feed = FeedServiceInit::builder()
            .consumer(consumer)
            .api(api)
            .user_id(user_id)
            .feed_config(config.feed.clone())
            .toast_config(config.toast.clone())
            .max_retries(max_retries)
            .build()
            .spawn();
        feed.apply_toast_preferences(&preferences.toast_preferences().await);

        Ok(Self {
            feed,
            preferences,
            hub,
        })
    }
}

/// Per-user push channel name
#[must_use]
pub fn channel_name(user_id: &str) -> String {
    format!("notifications:{user_id}")
}

#[cfg(test)]
mod test {
    use super::{channel_name, NotificationCenter};
    use hibari_config::Configuration;
    use hibari_feed::LoadState;
    use hibari_type::PushEvent;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn prepare_and_receive_a_push_event() {
        let config = Configuration::default();
        let center = NotificationCenter::prepare(&config, "user-1").await.unwrap();

        let mut load = center.feed.load_state();
        timeout(
            Duration::from_secs(5),
            load.wait_for(|state| *state == LoadState::Loaded),
        )
        .await
        .unwrap()
        .unwrap();

        center
            .hub
            .emitter::<PushEvent>(channel_name("user-1"))
            .emit(PushEvent {
                id: Some("n1".into()),
                title: Some("hello".into()),
                ..PushEvent::default()
            })
            .await
            .unwrap();

        let mut list = center.feed.notifications();
        timeout(Duration::from_secs(5), list.wait_for(|list| !list.is_empty()))
            .await
            .unwrap()
            .unwrap();
    }
}
