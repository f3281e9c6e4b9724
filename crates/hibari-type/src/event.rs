use crate::notification::{DeliveryStatus, Notification, NotificationId, Payload, Priority};
use iso8601_timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use simd_json::OwnedValue;
use smol_str::SmolStr;
use thiserror::Error;

/// The event failed canonicalisation and has to be dropped
#[derive(Debug, Error)]
pub enum InvalidPushEvent {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

/// Raw wire shape of an event delivered over the push channel
///
/// Everything is optional at this level. Required-field enforcement happens
/// in [`PushEvent::into_notification`], not during deserialisation, so a
/// malformed event can be dropped with a log line instead of tearing down
/// the consumer stream.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PushEvent {
    #[serde(default)]
    pub id: Option<SmolStr>,

    #[serde(default)]
    pub title: Option<SmolStr>,

    #[serde(default)]
    pub body: Option<SmolStr>,

    #[serde(default, rename = "type")]
    pub category: Option<SmolStr>,

    #[serde(default)]
    pub priority: Option<SmolStr>,

    #[serde(default)]
    pub status: Option<SmolStr>,

    #[serde(default)]
    pub timestamp: Option<Timestamp>,

    #[serde(default)]
    pub data: Option<OwnedValue>,
}

impl PushEvent {
    /// Convert the wire shape into a canonical [`Notification`]
    ///
    /// Priority labels map onto [`Priority`], unknown ones fold into
    /// `Normal`. A missing timestamp is taken as "now".
    ///
    /// # Errors
    ///
    /// - `id` or `title` is absent
    pub fn into_notification(self, user_id: &str) -> Result<Notification, InvalidPushEvent> {
        let id = self.id.ok_or(InvalidPushEvent::MissingField("id"))?;
        let title = self.title.ok_or(InvalidPushEvent::MissingField("title"))?;

        let status = self
            .status
            .as_deref()
            .map_or(DeliveryStatus::Delivered, DeliveryStatus::from_label);
        let created_at = self.timestamp.unwrap_or_else(Timestamp::now_utc);
        let read_at = status.is_read().then_some(created_at);

        Ok(Notification {
            id: NotificationId::new(id),
            user_id: SmolStr::new(user_id),
            title,
            body: self.body.unwrap_or_default(),
            payload: payload_from_parts(self.category.as_deref(), self.data),
            priority: self
                .priority
                .as_deref()
                .map_or(Priority::Normal, Priority::from_label),
            status,
            created_at,
            read_at,
            action: None,
        })
    }
}

/// Assemble a [`Payload`] from the wire event's category label and data map
///
/// The label becomes the payload tag. Anything that does not fit a known
/// variant ends up in [`Payload::Unknown`] with the raw value preserved.
fn payload_from_parts(category: Option<&str>, data: Option<OwnedValue>) -> Payload {
    let Some(label) = category else {
        return data.map_or(Payload::System, Payload::Unknown);
    };

    let mut map = match data {
        Some(OwnedValue::Object(map)) => *map,
        Some(other) => return Payload::Unknown(other),
        None => simd_json::owned::Object::default(),
    };
    map.insert(
        "type".into(),
        OwnedValue::String(label.to_string()),
    );
    let tagged = OwnedValue::Object(Box::new(map));

    simd_json::serde::from_owned_value(tagged.clone()).unwrap_or(Payload::Unknown(tagged))
}
