//! Shared value types used across the order saga services.

mod types;

pub use types::{MessageId, Money, OrderId, OrderStatus, ProductId};
