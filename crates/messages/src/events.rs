//! Domain events published by the order, product, and payment services.

use common::{Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::envelope::Message;

/// Events that drive the order fulfillment saga.
///
/// The coordinator dispatches on this union exhaustively: a new variant
/// forces every consumer to decide how to react at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A new order was placed.
    OrderCreated(OrderCreatedData),

    /// Stock was reserved for the order.
    ProductReserved(ProductReservedData),

    /// Stock could not be reserved (insufficient stock or domain error).
    ProductReservationFailed(ProductReservationFailedData),

    /// Payment for the order was charged.
    PaymentProcessed(PaymentProcessedData),

    /// Payment was declined or failed.
    PaymentFailed(PaymentFailedData),

    /// The order reached its approved terminal state.
    OrderApproved(OrderApprovedData),

    /// A previously held reservation was released back to stock.
    ProductReservationCancelled(ProductReservationCancelledData),
}

/// Discriminator for [`Event`] variants, used as a deduplication key
/// alongside the order ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    OrderCreated,
    ProductReserved,
    ProductReservationFailed,
    PaymentProcessed,
    PaymentFailed,
    OrderApproved,
    ProductReservationCancelled,
}

impl Event {
    /// Returns the discriminator for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::OrderCreated(_) => EventKind::OrderCreated,
            Event::ProductReserved(_) => EventKind::ProductReserved,
            Event::ProductReservationFailed(_) => EventKind::ProductReservationFailed,
            Event::PaymentProcessed(_) => EventKind::PaymentProcessed,
            Event::PaymentFailed(_) => EventKind::PaymentFailed,
            Event::OrderApproved(_) => EventKind::OrderApproved,
            Event::ProductReservationCancelled(_) => EventKind::ProductReservationCancelled,
        }
    }
}

impl Message for Event {
    fn message_type(&self) -> &'static str {
        match self {
            Event::OrderCreated(_) => "OrderCreated",
            Event::ProductReserved(_) => "ProductReserved",
            Event::ProductReservationFailed(_) => "ProductReservationFailed",
            Event::PaymentProcessed(_) => "PaymentProcessed",
            Event::PaymentFailed(_) => "PaymentFailed",
            Event::OrderApproved(_) => "OrderApproved",
            Event::ProductReservationCancelled(_) => "ProductReservationCancelled",
        }
    }

    fn order_id(&self) -> OrderId {
        match self {
            Event::OrderCreated(d) => d.order_id,
            Event::ProductReserved(d) => d.order_id,
            Event::ProductReservationFailed(d) => d.order_id,
            Event::PaymentProcessed(d) => d.order_id,
            Event::PaymentFailed(d) => d.order_id,
            Event::OrderApproved(d) => d.order_id,
            Event::ProductReservationCancelled(d) => d.order_id,
        }
    }
}

/// Data for OrderCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedData {
    /// The new order.
    pub order_id: OrderId,

    /// The product being ordered.
    pub product_id: ProductId,

    /// Ordered quantity.
    pub quantity: u32,
}

/// Data for ProductReserved event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReservedData {
    /// The order the reservation belongs to.
    pub order_id: OrderId,

    /// The reserved product.
    pub product_id: ProductId,

    /// Unit price recorded by the product service at reservation time.
    pub price: Money,

    /// Reserved quantity.
    pub quantity: u32,
}

/// Data for ProductReservationFailed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReservationFailedData {
    /// The product that could not be reserved.
    pub product_id: ProductId,

    /// The order the failed reservation belongs to.
    pub order_id: OrderId,

    /// Quantity that was requested.
    pub quantity: u32,
}

/// Data for PaymentProcessed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentProcessedData {
    /// The order whose payment was charged.
    pub order_id: OrderId,
}

/// Data for PaymentFailed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentFailedData {
    /// The order whose payment failed.
    pub order_id: OrderId,

    /// The reserved product, needed for the compensating cancellation.
    pub product_id: ProductId,

    /// Reserved quantity, needed for the compensating cancellation.
    pub quantity: u32,
}

/// Data for OrderApproved event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderApprovedData {
    /// The approved order.
    pub order_id: OrderId,
}

/// Data for ProductReservationCancelled event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReservationCancelledData {
    /// The product whose reservation was released.
    pub product_id: ProductId,

    /// The order the released reservation belonged to.
    pub order_id: OrderId,
}

// Convenience constructors
impl Event {
    /// Creates an OrderCreated event.
    pub fn order_created(order_id: OrderId, product_id: ProductId, quantity: u32) -> Self {
        Event::OrderCreated(OrderCreatedData {
            order_id,
            product_id,
            quantity,
        })
    }

    /// Creates a ProductReserved event.
    pub fn product_reserved(
        order_id: OrderId,
        product_id: ProductId,
        price: Money,
        quantity: u32,
    ) -> Self {
        Event::ProductReserved(ProductReservedData {
            order_id,
            product_id,
            price,
            quantity,
        })
    }

    /// Creates a ProductReservationFailed event.
    pub fn product_reservation_failed(
        product_id: ProductId,
        order_id: OrderId,
        quantity: u32,
    ) -> Self {
        Event::ProductReservationFailed(ProductReservationFailedData {
            product_id,
            order_id,
            quantity,
        })
    }

    /// Creates a PaymentProcessed event.
    pub fn payment_processed(order_id: OrderId) -> Self {
        Event::PaymentProcessed(PaymentProcessedData { order_id })
    }

    /// Creates a PaymentFailed event.
    pub fn payment_failed(order_id: OrderId, product_id: ProductId, quantity: u32) -> Self {
        Event::PaymentFailed(PaymentFailedData {
            order_id,
            product_id,
            quantity,
        })
    }

    /// Creates an OrderApproved event.
    pub fn order_approved(order_id: OrderId) -> Self {
        Event::OrderApproved(OrderApprovedData { order_id })
    }

    /// Creates a ProductReservationCancelled event.
    pub fn product_reservation_cancelled(product_id: ProductId, order_id: OrderId) -> Self {
        Event::ProductReservationCancelled(ProductReservationCancelledData {
            product_id,
            order_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type() {
        let order_id = OrderId::new();
        let product_id = ProductId::new("SKU-001");

        assert_eq!(
            Event::order_created(order_id, product_id.clone(), 2).message_type(),
            "OrderCreated"
        );
        assert_eq!(
            Event::product_reserved(order_id, product_id.clone(), Money::from_cents(1000), 2)
                .message_type(),
            "ProductReserved"
        );
        assert_eq!(
            Event::product_reservation_failed(product_id.clone(), order_id, 2).message_type(),
            "ProductReservationFailed"
        );
        assert_eq!(
            Event::payment_processed(order_id).message_type(),
            "PaymentProcessed"
        );
        assert_eq!(
            Event::payment_failed(order_id, product_id.clone(), 2).message_type(),
            "PaymentFailed"
        );
        assert_eq!(
            Event::order_approved(order_id).message_type(),
            "OrderApproved"
        );
        assert_eq!(
            Event::product_reservation_cancelled(product_id, order_id).message_type(),
            "ProductReservationCancelled"
        );
    }

    #[test]
    fn test_order_id_present_on_every_variant() {
        let order_id = OrderId::new();
        let product_id = ProductId::new("SKU-001");

        let events = vec![
            Event::order_created(order_id, product_id.clone(), 2),
            Event::product_reserved(order_id, product_id.clone(), Money::from_cents(1000), 2),
            Event::product_reservation_failed(product_id.clone(), order_id, 2),
            Event::payment_processed(order_id),
            Event::payment_failed(order_id, product_id.clone(), 2),
            Event::order_approved(order_id),
            Event::product_reservation_cancelled(product_id, order_id),
        ];

        for event in events {
            assert_eq!(event.order_id(), order_id);
        }
    }

    #[test]
    fn test_serialization_roundtrip() {
        let order_id = OrderId::new();
        let product_id = ProductId::new("SKU-001");

        let event = Event::product_reserved(order_id, product_id, Money::from_cents(1000), 3);
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_tagged_representation() {
        let event = Event::payment_processed(OrderId::new());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "PaymentProcessed");
        assert!(value["data"]["order_id"].is_string());
    }

    #[test]
    fn test_kind_matches_variant() {
        let order_id = OrderId::new();
        assert_eq!(
            Event::order_approved(order_id).kind(),
            EventKind::OrderApproved
        );
        assert_ne!(
            Event::order_approved(order_id).kind(),
            EventKind::OrderCreated
        );
    }
}
