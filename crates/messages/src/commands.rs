//! Commands issued by the saga coordinator to the domain services.

use common::{Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::envelope::Message;

/// Commands consumed by the product, payment, and order services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Command {
    /// Hold stock for an order.
    ReserveProduct(ReserveProductData),

    /// Release a previously held reservation (compensating action).
    CancelProductReservation(CancelProductReservationData),

    /// Charge the payment for an order.
    ProcessPayment(ProcessPaymentData),

    /// Move the order to its approved terminal state.
    ApproveOrder(ApproveOrderData),

    /// Move the order to its rejected terminal state.
    RejectOrder(RejectOrderData),
}

/// Discriminator for [`Command`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    ReserveProduct,
    CancelProductReservation,
    ProcessPayment,
    ApproveOrder,
    RejectOrder,
}

impl Command {
    /// Returns the discriminator for this command.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::ReserveProduct(_) => CommandKind::ReserveProduct,
            Command::CancelProductReservation(_) => CommandKind::CancelProductReservation,
            Command::ProcessPayment(_) => CommandKind::ProcessPayment,
            Command::ApproveOrder(_) => CommandKind::ApproveOrder,
            Command::RejectOrder(_) => CommandKind::RejectOrder,
        }
    }
}

impl Message for Command {
    fn message_type(&self) -> &'static str {
        match self {
            Command::ReserveProduct(_) => "ReserveProduct",
            Command::CancelProductReservation(_) => "CancelProductReservation",
            Command::ProcessPayment(_) => "ProcessPayment",
            Command::ApproveOrder(_) => "ApproveOrder",
            Command::RejectOrder(_) => "RejectOrder",
        }
    }

    fn order_id(&self) -> OrderId {
        match self {
            Command::ReserveProduct(d) => d.order_id,
            Command::CancelProductReservation(d) => d.order_id,
            Command::ProcessPayment(d) => d.order_id,
            Command::ApproveOrder(d) => d.order_id,
            Command::RejectOrder(d) => d.order_id,
        }
    }
}

/// Data for ReserveProduct command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReserveProductData {
    /// The product to reserve.
    pub product_id: ProductId,

    /// Quantity to reserve.
    pub quantity: u32,

    /// The order the reservation belongs to.
    pub order_id: OrderId,
}

/// Data for CancelProductReservation command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelProductReservationData {
    /// The product whose reservation should be released.
    pub product_id: ProductId,

    /// The order the reservation belongs to.
    pub order_id: OrderId,

    /// Quantity to return to available stock.
    pub quantity: u32,
}

/// Data for ProcessPayment command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessPaymentData {
    /// The order to charge.
    pub order_id: OrderId,

    /// The reserved product.
    pub product_id: ProductId,

    /// Unit price at reservation time.
    pub price: Money,

    /// Reserved quantity.
    pub quantity: u32,
}

/// Data for ApproveOrder command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveOrderData {
    /// The order to approve.
    pub order_id: OrderId,
}

/// Data for RejectOrder command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectOrderData {
    /// The order to reject.
    pub order_id: OrderId,
}

// Convenience constructors
impl Command {
    /// Creates a ReserveProduct command.
    pub fn reserve_product(product_id: ProductId, quantity: u32, order_id: OrderId) -> Self {
        Command::ReserveProduct(ReserveProductData {
            product_id,
            quantity,
            order_id,
        })
    }

    /// Creates a CancelProductReservation command.
    pub fn cancel_product_reservation(
        product_id: ProductId,
        order_id: OrderId,
        quantity: u32,
    ) -> Self {
        Command::CancelProductReservation(CancelProductReservationData {
            product_id,
            order_id,
            quantity,
        })
    }

    /// Creates a ProcessPayment command.
    pub fn process_payment(
        order_id: OrderId,
        product_id: ProductId,
        price: Money,
        quantity: u32,
    ) -> Self {
        Command::ProcessPayment(ProcessPaymentData {
            order_id,
            product_id,
            price,
            quantity,
        })
    }

    /// Creates an ApproveOrder command.
    pub fn approve_order(order_id: OrderId) -> Self {
        Command::ApproveOrder(ApproveOrderData { order_id })
    }

    /// Creates a RejectOrder command.
    pub fn reject_order(order_id: OrderId) -> Self {
        Command::RejectOrder(RejectOrderData { order_id })
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
            Command::reserve_product(product_id.clone(), 2, order_id).message_type(),
            "ReserveProduct"
        );
        assert_eq!(
            Command::cancel_product_reservation(product_id.clone(), order_id, 2).message_type(),
            "CancelProductReservation"
        );
        assert_eq!(
            Command::process_payment(order_id, product_id, Money::from_cents(1000), 2)
                .message_type(),
            "ProcessPayment"
        );
        assert_eq!(
            Command::approve_order(order_id).message_type(),
            "ApproveOrder"
        );
        assert_eq!(Command::reject_order(order_id).message_type(), "RejectOrder");
    }

    #[test]
    fn test_order_id_present_on_every_variant() {
        let order_id = OrderId::new();
        let product_id = ProductId::new("SKU-001");

        let commands = vec![
            Command::reserve_product(product_id.clone(), 2, order_id),
            Command::cancel_product_reservation(product_id.clone(), order_id, 2),
            Command::process_payment(order_id, product_id, Money::from_cents(1000), 2),
            Command::approve_order(order_id),
            Command::reject_order(order_id),
        ];

        for command in commands {
            assert_eq!(command.order_id(), order_id);
        }
    }

    #[test]
    fn test_serialization_roundtrip() {
        let command =
            Command::process_payment(OrderId::new(), ProductId::new("SKU-001"), Money::from_cents(1000), 3);
        let json = serde_json::to_string(&command).unwrap();
        let deserialized: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(command, deserialized);
    }
}
