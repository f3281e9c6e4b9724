//! Canonical types shared across the hibari crates
//!
//! Everything in here is plain data. The conversion from the raw push-event
//! wire shape into the canonical [`Notification`] lives on [`PushEvent`].

pub use self::connection::ConnectionStatus;
pub use self::event::{InvalidPushEvent, PushEvent};
pub use self::notification::{
    Action, Category, DeliveryStatus, Notification, NotificationId, Payload, Priority,
};

mod connection;
mod event;
mod notification;
