//! Domain event plumbing.
//!
//! Aggregates return typed events (`OrderPaid`, `SubscriptionResumed`, ...).
//! The application layer wraps them in an [`EventEnvelope`] and hands the
//! envelope to an `EventPublisher`. The schema version is carried in the
//! event type suffix: `order.paid.v2` is version 2.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

use super::Timestamp;

/// Identity and routing data every billing event exposes.
///
/// Implement with [`domain_event!`](crate::domain_event).
pub trait DomainEvent: Send + Sync {
    /// Versioned type, e.g. `order.paid.v1`.
    fn event_type(&self) -> &'static str;

    fn aggregate_id(&self) -> String;

    /// `Order` or `Subscription`.
    fn aggregate_type(&self) -> &'static str;

    fn occurred_at(&self) -> Timestamp;

    fn event_id(&self) -> EventId;
}

/// `to_envelope()` for every serializable event.
pub trait SerializableDomainEvent: DomainEvent + Serialize {
    fn to_envelope(&self) -> Result<EventEnvelope, serde_json::Error> {
        let event_type = self.event_type();
        Ok(EventEnvelope {
            event_id: self.event_id(),
            event_type: event_type.to_string(),
            schema_version: schema_version_of(event_type),
            aggregate_id: self.aggregate_id(),
            aggregate_type: self.aggregate_type().to_string(),
            occurred_at: self.occurred_at(),
            payload: serde_json::to_value(self)?,
            metadata: EventMetadata::default(),
        })
    }
}

impl<T: DomainEvent + Serialize> SerializableDomainEvent for T {}

/// Implements [`DomainEvent`] from the event's own fields.
///
/// ```ignore
/// domain_event!(
///     OrderPaid,
///     event_type = "order.paid.v1",
///     aggregate_id = order_id,
///     aggregate_type = "Order",
///     occurred_at = paid_at,
///     event_id = event_id
/// );
/// ```
#[macro_export]
macro_rules! domain_event {
    (
        $event:ident,
        event_type = $event_type:expr,
        aggregate_id = $aggregate_id:ident,
        aggregate_type = $aggregate_type:expr,
        occurred_at = $occurred_at:ident,
        event_id = $event_id:ident
    ) => {
        impl $crate::domain::foundation::DomainEvent for $event {
            fn event_type(&self) -> &'static str {
                $event_type
            }

            fn aggregate_id(&self) -> String {
                self.$aggregate_id.to_string()
            }

            fn aggregate_type(&self) -> &'static str {
                $aggregate_type
            }

            fn occurred_at(&self) -> $crate::domain::foundation::Timestamp {
                self.$occurred_at
            }

            fn event_id(&self) -> $crate::domain::foundation::EventId {
                self.$event_id.clone()
            }
        }
    };
}

pub use crate::domain_event;

/// Deduplication key for one emitted event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who triggered the event and which request it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// Actor behind the transition. Provider notifications carry the
    /// order owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Transport wrapper handed to an `EventPublisher`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,
    pub event_type: String,
    pub schema_version: u32,
    pub aggregate_id: String,
    pub aggregate_type: String,
    pub occurred_at: Timestamp,
    pub payload: JsonValue,
    pub metadata: EventMetadata,
}

impl EventEnvelope {
    /// An envelope for an ad-hoc payload, stamped now with a fresh id.
    pub fn new(
        event_type: impl Into<String>,
        aggregate_id: impl Into<String>,
        aggregate_type: impl Into<String>,
        payload: JsonValue,
    ) -> Self {
        let event_type = event_type.into();
        Self {
            event_id: EventId::new(),
            schema_version: schema_version_of(&event_type),
            event_type,
            aggregate_id: aggregate_id.into(),
            aggregate_type: aggregate_type.into(),
            occurred_at: Timestamp::now(),
            payload,
            metadata: EventMetadata::default(),
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.correlation_id = Some(id.into());
        self
    }

    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.user_id = Some(id.into());
        self
    }

    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Version from a `.vN` suffix; unversioned types are version 1.
fn schema_version_of(event_type: &str) -> u32 {
    event_type
        .rsplit_once(".v")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_version_comes_from_suffix() {
        assert_eq!(schema_version_of("order.paid.v2"), 2);
        assert_eq!(schema_version_of("subscription.resumed.v10"), 10);
        assert_eq!(schema_version_of("legacy"), 1);
        assert_eq!(schema_version_of("order.v"), 1);
    }

    #[test]
    fn metadata_omits_unset_fields() {
        let envelope = EventEnvelope::new("order.paid.v1", "order-1", "Order", json!({}))
            .with_user_id("user-456");

        let json = serde_json::to_value(&envelope.metadata).unwrap();
        assert_eq!(json, json!({ "user_id": "user-456" }));
    }

    #[test]
    fn builder_sets_correlation() {
        let envelope = EventEnvelope::new("order.refunded.v1", "order-1", "Order", json!({}))
            .with_correlation_id("req-123");
        assert_eq!(envelope.metadata.correlation_id.as_deref(), Some("req-123"));
        assert_eq!(envelope.schema_version, 1);
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct InvoiceIssued {
        event_id: EventId,
        invoice_id: String,
        issued_at: Timestamp,
    }

    domain_event!(
        InvoiceIssued,
        event_type = "invoice.issued.v3",
        aggregate_id = invoice_id,
        aggregate_type = "Invoice",
        occurred_at = issued_at,
        event_id = event_id
    );

    #[test]
    fn to_envelope_keeps_event_identity_and_payload() {
        let event = InvoiceIssued {
            event_id: EventId::from_string("evt-9"),
            invoice_id: "inv-1".to_string(),
            issued_at: Timestamp::now(),
        };

        let envelope = event.to_envelope().unwrap();

        assert_eq!(envelope.event_id.as_str(), "evt-9");
        assert_eq!(envelope.schema_version, 3);
        assert_eq!(envelope.aggregate_type, "Invoice");
        assert_eq!(envelope.aggregate_id, "inv-1");
        assert_eq!(envelope.payload_as::<InvoiceIssued>().unwrap(), event);
    }
}
