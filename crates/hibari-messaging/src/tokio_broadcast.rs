//!
//! Implementation over Tokio broadcast channels
//!

use crate::{MessagingBackend, Result};
use ahash::AHashMap;
use futures_util::{stream::BoxStream, StreamExt, TryStreamExt};
use std::sync::Mutex;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

const DEFAULT_CHANNEL_CAPACITY: usize = 512;

/// Messaging backend over per-channel Tokio broadcast channels
///
/// Channels are created lazily on first use and pruned once their last
/// subscriber is gone, so the registry stays bounded by the set of live
/// consumers. The per-channel buffer capacity is configurable; a consumer
/// that falls further behind than the capacity lags and loses the oldest
/// messages.
pub struct TokioBroadcastMessagingBackend {
    channel_capacity: usize,
    registry: Mutex<AHashMap<String, broadcast::Sender<Vec<u8>>>>,
}

impl TokioBroadcastMessagingBackend {
    #[must_use]
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            channel_capacity,
            registry: Mutex::new(AHashMap::new()),
        }
    }

    /// Sender for a channel, creating the channel on first use
    ///
    /// Entries whose last subscriber went away are pruned on the way
    /// through.
    fn sender(&self, channel_name: &str) -> broadcast::Sender<Vec<u8>> {
        let mut registry = self.registry.lock().unwrap();
        registry.retain(|name, sender| name == channel_name || sender.receiver_count() > 0);

        registry
            .entry(channel_name.to_string())
            .or_insert_with(|| broadcast::channel(self.channel_capacity).0)
            .clone()
    }
}

impl Default for TokioBroadcastMessagingBackend {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl MessagingBackend for TokioBroadcastMessagingBackend {
    async fn enqueue(&self, channel_name: &str, message: Vec<u8>) -> Result<()> {
        // A send without any subscribers has nowhere to deliver to; that is
        // not an error on a fire-and-forget channel
        let _ = self.sender(channel_name).send(message);

        Ok(())
    }

    async fn message_stream(
        &self,
        channel_name: String,
    ) -> Result<BoxStream<'static, Result<Vec<u8>>>> {
        let receiver = self.sender(&channel_name).subscribe();

        Ok(BroadcastStream::new(receiver).map_err(Into::into).boxed())
    }
}

#[cfg(test)]
mod test {
    use crate::{ConsumeError, MessagingBackend, MessagingHub, Result};
    use futures_util::StreamExt;
    use hibari_type::ConnectionStatus;
    use serde::{Deserialize, Serialize};

    use super::TokioBroadcastMessagingBackend;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Ping {
        seq: u32,
    }

    #[tokio::test]
    async fn emit_and_consume() -> Result<()> {
        let hub = MessagingHub::new(TokioBroadcastMessagingBackend::default());

        let mut consumer = hub.consumer::<Ping>("user-1".into()).await?;
        assert_eq!(*consumer.status().borrow(), ConnectionStatus::Connected);

        let emitter = hub.emitter::<Ping>("user-1".into());
        emitter.emit(Ping { seq: 7 }).await?;

        let received = consumer.next().await.unwrap()?;
        assert_eq!(received, Ping { seq: 7 });

        Ok(())
    }

    #[tokio::test]
    async fn reconnect_settles_on_connected() -> Result<()> {
        let hub = MessagingHub::new(TokioBroadcastMessagingBackend::default());
        let mut consumer = hub.consumer::<Ping>("user-1".into()).await?;

        consumer.reconnect().await?;
        assert_eq!(*consumer.status().borrow(), ConnectionStatus::Connected);

        Ok(())
    }

    #[tokio::test]
    async fn dead_channels_are_pruned() -> Result<()> {
        let backend = TokioBroadcastMessagingBackend::default();

        let stream = backend.message_stream("gone".into()).await?;
        drop(stream);
        backend.enqueue("alive", b"{}".to_vec()).await?;

        let registry = backend.registry.lock().unwrap();
        assert!(!registry.contains_key("gone"));
        assert!(registry.contains_key("alive"));

        Ok(())
    }

    #[tokio::test]
    async fn overflow_lags_instead_of_erroring_out() -> Result<()> {
        let hub = MessagingHub::new(TokioBroadcastMessagingBackend::new(1));
        let mut consumer = hub.consumer::<Ping>("user-1".into()).await?;

        let emitter = hub.emitter::<Ping>("user-1".into());
        emitter.emit(Ping { seq: 1 }).await?;
        emitter.emit(Ping { seq: 2 }).await?;

        let lagged = consumer.next().await.unwrap().unwrap_err();
        assert!(matches!(lagged, ConsumeError::Lagged(1)));

        // The stream stays usable and yields the newest message
        let received = consumer.next().await.unwrap()?;
        assert_eq!(received, Ping { seq: 2 });

        Ok(())
    }
}
