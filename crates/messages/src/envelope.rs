//! Message envelope wrapping commands and events for the bus.

use chrono::{DateTime, Utc};
use common::{MessageId, OrderId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A publishable message: carries a type discriminator and the order ID
/// used as correlation and partition key.
pub trait Message: Serialize {
    /// The wire-level type discriminator.
    fn message_type(&self) -> &'static str;

    /// The correlation key of the saga this message belongs to.
    fn order_id(&self) -> OrderId;
}

/// Wire wrapper around a serialized command or event.
///
/// The payload holds the message in its tagged JSON representation, so
/// consumers decode it back into the matching union without consulting
/// `message_type` (which exists for routing and observability).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Unique ID of this envelope, assigned at publish time.
    pub message_id: MessageId,

    /// Correlation and partition key.
    pub order_id: OrderId,

    /// Type discriminator of the wrapped message.
    pub message_type: String,

    /// The message in its serialized form.
    pub payload: serde_json::Value,

    /// When the envelope was created.
    pub published_at: DateTime<Utc>,
}

impl MessageEnvelope {
    /// Wraps a command or event into an envelope.
    pub fn wrap<M: Message>(message: &M) -> Result<Self, serde_json::Error> {
        Ok(Self {
            message_id: MessageId::new(),
            order_id: message.order_id(),
            message_type: message.message_type().to_string(),
            payload: serde_json::to_value(message)?,
            published_at: Utc::now(),
        })
    }

    /// Decodes the payload back into a command or event union.
    ///
    /// Fails for message types unknown to the target union; consumers
    /// treat that as an ignorable, forward-compatible message.
    pub fn decode<M: DeserializeOwned>(&self) -> Result<M, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use crate::events::Event;
    use common::{Money, ProductId};

    #[test]
    fn test_wrap_carries_correlation_key() {
        let order_id = OrderId::new();
        let event = Event::order_created(order_id, ProductId::new("SKU-001"), 2);

        let envelope = MessageEnvelope::wrap(&event).unwrap();
        assert_eq!(envelope.order_id, order_id);
        assert_eq!(envelope.message_type, "OrderCreated");
    }

    #[test]
    fn test_wrap_decode_roundtrip() {
        let order_id = OrderId::new();
        let command =
            Command::process_payment(order_id, ProductId::new("SKU-001"), Money::from_cents(1000), 3);

        let envelope = MessageEnvelope::wrap(&command).unwrap();
        let decoded: Command = envelope.decode().unwrap();
        assert_eq!(decoded, command);
    }

    #[test]
    fn test_decode_wrong_union_fails() {
        let event = Event::payment_processed(OrderId::new());
        let envelope = MessageEnvelope::wrap(&event).unwrap();

        // An event envelope does not decode as a command.
        let decoded: Result<Command, _> = envelope.decode();
        assert!(decoded.is_err());
    }

    #[test]
    fn test_envelopes_get_unique_message_ids() {
        let event = Event::payment_processed(OrderId::new());
        let e1 = MessageEnvelope::wrap(&event).unwrap();
        let e2 = MessageEnvelope::wrap(&event).unwrap();
        assert_ne!(e1.message_id, e2.message_id);
    }
}
