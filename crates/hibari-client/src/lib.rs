//! Remote notification API
//!
//! Confirmation calls for optimistic updates plus the one-time initial
//! fetch. All operations are idempotent on the remote side; the caller
//! decides what to do with failures (the feed layer logs and swallows
//! them).

#[macro_use]
extern crate tracing;

use enum_dispatch::enum_dispatch;
use hibari_type::{Notification, NotificationId};
use std::error::Error as StdError;
use thiserror::Error;

pub use self::http::HttpNotificationApi;
pub use self::in_process::InProcessNotificationApi;
pub use self::retry::retry;

mod http;
mod in_process;
mod retry;

pub type BoxError = Box<dyn StdError + Send + Sync>;
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("remote endpoint responded with status {0}")]
    BadStatus(::http::StatusCode),

    #[error("backend is switched into failure mode")]
    Unavailable,

    #[error(transparent)]
    Serialisation(#[from] simd_json::Error),

    #[error(transparent)]
    Transport(BoxError),

    #[error(transparent)]
    Uri(#[from] ::http::uri::InvalidUri),
}

/// Enum dispatch over all supported API backends
#[enum_dispatch(NotificationApi)]
pub enum AnyNotificationApi {
    /// REST backend over HTTP
    Http(HttpNotificationApi),

    /// In-process backend for embedding and tests
    InProcess(InProcessNotificationApi),
}

/// Remote notification API
///
/// One implementation per storage/transport backend, selected by
/// configuration at startup.
#[enum_dispatch]
#[allow(async_fn_in_trait)] // Because of `enum_dispatch`
pub trait NotificationApi {
    /// Fetch the current notification list
    async fn list(&self) -> Result<Vec<Notification>>;

    /// Confirm that a single notification was read
    async fn mark_read(&self, id: &NotificationId) -> Result<()>;

    /// Confirm that a single notification was reverted to unread
    async fn mark_unread(&self, id: &NotificationId) -> Result<()>;

    /// Confirm that the whole feed was read
    async fn mark_all_read(&self) -> Result<()>;

    /// Confirm the deletion of a single notification
    async fn delete(&self, id: &NotificationId) -> Result<()>;
}
