use iso8601_timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use simd_json::OwnedValue;
use smol_str::SmolStr;
use std::fmt;
use typed_builder::TypedBuilder;

/// Identifier of a notification, unique within one user's feed
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NotificationId(SmolStr);

impl NotificationId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(SmolStr::new(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for NotificationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NotificationId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<SmolStr> for NotificationId {
    fn from(value: SmolStr) -> Self {
        Self(value)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// Map an external priority label onto the enum
    ///
    /// Unknown labels fold into [`Priority::Normal`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "low" => Self::Low,
            "high" => Self::High,
            "urgent" => Self::Urgent,
            _ => Self::Normal,
        }
    }
}

/// Delivery status of a notification
///
/// The variants are ordered. Merge logic relies on the ordering to never
/// downgrade a notification that already reached [`DeliveryStatus::Read`].
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

impl DeliveryStatus {
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "sent" => Self::Sent,
            "read" => Self::Read,
            _ => Self::Delivered,
        }
    }

    #[must_use]
    pub fn is_read(self) -> bool {
        matches!(self, Self::Read)
    }
}

/// Category-specific payload
///
/// Each category carries only the fields it needs. Payloads with an
/// unrecognised tag land in [`Payload::Unknown`] with the raw value intact.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Message {
        sender: SmolStr,
        #[serde(default)]
        thread_id: Option<SmolStr>,
    },
    Order {
        order_id: SmolStr,
        #[serde(default)]
        total_cents: Option<i64>,
    },
    Security {
        #[serde(default)]
        ip_address: Option<SmolStr>,
    },
    System,
    #[serde(untagged)]
    Unknown(OwnedValue),
}

impl Default for Payload {
    fn default() -> Self {
        Self::System
    }
}

/// Category discriminant of a [`Payload`]
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Message,
    Order,
    Security,
    System,
    Unknown,
}

impl Payload {
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Self::Message { .. } => Category::Message,
            Self::Order { .. } => Category::Order,
            Self::Security { .. } => Category::Security,
            Self::System => Category::System,
            Self::Unknown(..) => Category::Unknown,
        }
    }
}

/// Optional call-to-action attached to a notification
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Action {
    pub url: SmolStr,
    pub label: SmolStr,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, TypedBuilder)]
pub struct Notification {
    #[builder(setter(into))]
    pub id: NotificationId,

    /// Owner of the feed this notification belongs to
    #[builder(setter(into))]
    pub user_id: SmolStr,

    #[builder(setter(into))]
    pub title: SmolStr,

    #[builder(default, setter(into))]
    pub body: SmolStr,

    #[builder(default)]
    pub payload: Payload,

    #[builder(default)]
    pub priority: Priority,

    #[builder(default)]
    pub status: DeliveryStatus,

    #[builder(default = Timestamp::now_utc())]
    pub created_at: Timestamp,

    #[builder(default)]
    pub read_at: Option<Timestamp>,

    #[builder(default)]
    pub action: Option<Action>,
}

#[cfg(test)]
mod test {
    use super::{Payload, Priority};
    use pretty_assertions::assert_eq;
    use smol_str::SmolStr;

    #[test]
    fn unknown_priority_folds_to_normal() {
        assert_eq!(Priority::from_label("urgent"), Priority::Urgent);
        assert_eq!(Priority::from_label("catastrophic"), Priority::Normal);
        assert_eq!(Priority::from_label(""), Priority::Normal);
    }

    #[test]
    fn payload_tag_roundtrip() {
        let payload = Payload::Order {
            order_id: SmolStr::new("ord-1"),
            total_cents: Some(1299),
        };
        let mut serialised = simd_json::to_vec(&payload).unwrap();
        let parsed: Payload = simd_json::from_slice(&mut serialised).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn unrecognised_payload_tag_falls_back() {
        let mut raw = br#"{"type":"loyalty_points","points":420}"#.to_vec();
        let parsed: Payload = simd_json::from_slice(&mut raw).unwrap();
        assert!(matches!(parsed, Payload::Unknown(..)));
    }
}
