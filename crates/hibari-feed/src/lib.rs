//! Real-time notification feed
//!
//! The moving parts, in data-flow order: the initial list is fetched once
//! per session, push events stream in and are merged by id, user actions
//! are applied optimistically and confirmed remotely without blocking, and
//! the toast queue surfaces the latest arrivals with auto-dismiss timers.

#[macro_use]
extern crate tracing;

pub use self::error::{Error, Result};
pub use self::query::GetNotifications;
pub use self::reducer::{apply, Action};
pub use self::service::{FeedService, FeedServiceInit, LoadState};
pub use self::toast::{Toast, ToastQueue, ToastStage};

mod error;
pub mod merge;
mod query;
mod reconcile;
mod reducer;
mod service;
mod toast;

/// Hard ceiling for query limits
const MAX_QUERY_LIMIT: usize = 100;

pub struct LimitContext {
    limit: usize,
}

impl Default for LimitContext {
    fn default() -> Self {
        Self {
            limit: MAX_QUERY_LIMIT,
        }
    }
}
