//! Service and handler error types.

use common::{OrderId, ProductId};
use thiserror::Error;

/// Errors from the reservation domain service.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// Not enough stock to satisfy the reservation.
    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The product does not exist.
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    /// The service could not be reached.
    #[error("reservation service unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the payment domain service.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The charge was declined.
    #[error("payment declined for order {order_id}: {reason}")]
    Declined { order_id: OrderId, reason: String },
}

/// Errors from the order domain service.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order does not exist.
    #[error("order not found: {0}")]
    NotFound(OrderId),
}

/// Errors a command handler can surface to its consumer loop.
///
/// Anything surfaced here means the command was not fully handled and
/// should be retried by redelivery. Domain failures that have their own
/// failure event never appear as a `HandlerError`.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Publishing the outcome event failed.
    #[error("bus error: {0}")]
    Bus(#[from] bus::BusError),

    /// The outcome event could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A reservation cancellation could not reach the domain service.
    #[error("reservation service error: {0}")]
    Reservation(#[from] ReservationError),

    /// The order domain service rejected the state change.
    #[error("order service error: {0}")]
    Order(#[from] OrderError),
}

/// Convenience type alias for handler results.
pub type Result<T> = std::result::Result<T, HandlerError>;
