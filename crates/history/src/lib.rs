//! Append-only order history audit log.
//!
//! The saga coordinator only ever appends `(order_id, status, timestamp)`
//! records; it never reads them back. Queries exist for audit, tests,
//! and the demo binary.

mod error;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, OrderStatus};

pub use error::{HistoryError, Result};
pub use memory::InMemoryOrderHistory;

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHistoryRecord {
    /// The order the record belongs to.
    pub order_id: OrderId,

    /// The status reached.
    pub status: OrderStatus,

    /// When the record was appended.
    pub recorded_at: DateTime<Utc>,
}

/// Append-only store of order status records.
///
/// Appends are fire-and-forget from the coordinator's perspective and
/// safe for concurrent writers.
#[async_trait]
pub trait OrderHistory: Send + Sync {
    /// Appends a status record for an order.
    async fn append(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        recorded_at: DateTime<Utc>,
    ) -> Result<()>;
}
