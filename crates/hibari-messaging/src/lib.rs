//! Push-channel seam
//!
//! The hub hands out typed emitters and consumers over an exchangeable
//! byte-transport backend. The backend only has to move bytes; framing is
//! JSON on both sides. The hub also owns the [`ConnectionStatus`] feed that
//! the rest of the stack merely observes.

#[macro_use]
extern crate tracing;

use enum_dispatch::enum_dispatch;
use futures_util::{stream::BoxStream, Stream};
use hibari_type::ConnectionStatus;
use pin_project_lite::pin_project;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    error::Error,
    marker::PhantomData,
    pin::Pin,
    sync::Arc,
    task::{self, ready, Poll},
};
use tokio::sync::watch;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// Boxed error
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Type alias for Result, defaulting to [`BoxError`] on the error branch
pub type Result<T, E = BoxError> = std::result::Result<T, E>;

pub mod tokio_broadcast;

/// Failure while consuming a single message
///
/// A lagged consumer is told how many messages it lost; everything else is
/// either a decode failure of one message or a backend transport error.
#[derive(Debug, thiserror::Error)]
pub enum ConsumeError {
    #[error(transparent)]
    Decode(simd_json::Error),

    #[error("consumer lagged behind, {0} messages were dropped")]
    Lagged(u64),

    #[error(transparent)]
    Transport(BoxError),
}

impl ConsumeError {
    fn transport(err: BoxError) -> Self {
        match err.downcast::<BroadcastStreamRecvError>() {
            Ok(lagged) => {
                let BroadcastStreamRecvError::Lagged(skipped) = *lagged;
                Self::Lagged(skipped)
            }
            Err(err) => Self::Transport(err),
        }
    }
}

/// Enum dispatch over all supported backends
#[enum_dispatch(MessagingBackend)]
pub enum AnyMessagingBackend {
    /// In-process Tokio broadcast backend
    Tokio(tokio_broadcast::TokioBroadcastMessagingBackend),
}

/// Messaging backend
///
/// The trait that lets the hub create emitters and consumers. The backend
/// just needs to be able to transport bytes, that's all.
#[enum_dispatch]
#[allow(async_fn_in_trait)] // Because of `enum_dispatch`
pub trait MessagingBackend {
    /// Enqueue a new message onto the backend
    async fn enqueue(&self, channel_name: &str, message: Vec<u8>) -> Result<()>;

    /// Open a new stream of messages from the backend
    async fn message_stream(
        &self,
        channel_name: String,
    ) -> Result<BoxStream<'static, Result<Vec<u8>>>>;
}

pin_project! {
    /// Consumer of messages
    pub struct MessageConsumer<M> {
        backend: Arc<AnyMessagingBackend>,
        channel_name: String,
        status_tx: watch::Sender<ConnectionStatus>,
        #[pin]
        inner: BoxStream<'static, Result<Vec<u8>>>,
        _ty: PhantomData<M>,
    }
}

impl<M> MessageConsumer<M>
where
    M: DeserializeOwned + Serialize,
{
    /// Observe the connection status of this consumer
    #[must_use]
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// Create an emitter that emits messages to this consumer
    #[must_use]
    pub fn emitter(&self) -> MessageEmitter<M> {
        MessagingHub {
            backend: self.backend.clone(),
        }
        .emitter(self.channel_name.clone())
    }

    /// Reconnect the message consumer
    ///
    /// Use this if the stream ever ends and you think it really shouldn't.
    /// The status feed passes through `Reconnecting` and settles on either
    /// `Connected` or `Error`.
    ///
    /// # Errors
    ///
    /// - Reconnection failed
    pub async fn reconnect(&mut self) -> Result<()> {
        self.status_tx.send_replace(ConnectionStatus::Reconnecting);

        match self.backend.message_stream(self.channel_name.clone()).await {
            Ok(stream) => {
                self.inner = stream;
                self.status_tx.send_replace(ConnectionStatus::Connected);
                Ok(())
            }
            Err(error) => {
                self.status_tx.send_replace(ConnectionStatus::Error);
                Err(error)
            }
        }
    }
}

impl<M> Stream for MessageConsumer<M>
where
    M: DeserializeOwned,
{
    type Item = Result<M, ConsumeError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match ready!(this.inner.poll_next(cx)) {
            Some(Ok(mut msg)) => Poll::Ready(Some(
                simd_json::from_slice(&mut msg).map_err(ConsumeError::Decode),
            )),
            Some(Err(err)) => Poll::Ready(Some(Err(ConsumeError::transport(err)))),
            None => {
                this.status_tx.send_replace(ConnectionStatus::Disconnected);
                Poll::Ready(None)
            }
        }
    }
}

/// Message emitter
///
/// Cheaply clonable. Internally it is a string for the channel name and an
/// `Arc` referencing the backend.
#[derive(Clone)]
pub struct MessageEmitter<M> {
    backend: Arc<AnyMessagingBackend>,
    channel_name: String,
    _ty: PhantomData<M>,
}

impl<M> MessageEmitter<M>
where
    M: DeserializeOwned + Serialize,
{
    /// Emit a new message
    ///
    /// # Errors
    ///
    /// - Message failed to serialise
    /// - Message failed to enqueue
    pub async fn emit(&self, message: M) -> Result<()> {
        let message = simd_json::to_vec(&message)?;
        self.backend.enqueue(&self.channel_name, message).await
    }
}

/// Central hub for messaging
///
/// Allows for the registration of new emitters and consumers. Using the same
/// backend instance ensures that channels with the same name are connected.
pub struct MessagingHub {
    backend: Arc<AnyMessagingBackend>,
}

impl MessagingHub {
    /// Create a new messaging hub
    pub fn new<B>(backend: B) -> Self
    where
        B: Into<AnyMessagingBackend>,
    {
        Self {
            backend: Arc::new(backend.into()),
        }
    }

    /// Create a new consumer of messages emitted to the channel
    ///
    /// The consumer starts out `Connecting` and flips to `Connected` once
    /// the backend stream is open.
    ///
    /// # Errors
    ///
    /// - Consumer failed to be created
    pub async fn consumer<M>(&self, channel_name: String) -> Result<MessageConsumer<M>>
    where
        M: DeserializeOwned + Serialize,
    {
        let (status_tx, _status_rx) = watch::channel(ConnectionStatus::Connecting);

        let message_stream = match self.backend.message_stream(channel_name.clone()).await {
            Ok(stream) => stream,
            Err(error) => {
                debug!(%channel_name, "failed to open message stream");
                status_tx.send_replace(ConnectionStatus::Error);
                return Err(error);
            }
        };
        status_tx.send_replace(ConnectionStatus::Connected);

        Ok(MessageConsumer {
            backend: self.backend.clone(),
            channel_name,
            status_tx,
            inner: message_stream,
            _ty: PhantomData,
        })
    }

    /// Create a new emitter for a channel
    #[must_use]
    pub fn emitter<M>(&self, channel_name: String) -> MessageEmitter<M>
    where
        M: DeserializeOwned + Serialize,
    {
        MessageEmitter {
            channel_name,
            backend: self.backend.clone(),
            _ty: PhantomData,
        }
    }
}
