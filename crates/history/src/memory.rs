//! In-memory order history for testing and local runs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, OrderStatus};
use tokio::sync::RwLock;

use crate::{OrderHistory, OrderHistoryRecord, Result};

/// In-memory append-only history log.
///
/// Records are kept in append order; duplicates are stored as-is — the
/// log does not deduplicate, that is the coordinator's concern.
#[derive(Clone, Default)]
pub struct InMemoryOrderHistory {
    records: Arc<RwLock<Vec<OrderHistoryRecord>>>,
}

impl InMemoryOrderHistory {
    /// Creates a new empty history log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all records in append order.
    pub async fn records(&self) -> Vec<OrderHistoryRecord> {
        self.records.read().await.clone()
    }

    /// Returns the statuses appended for one order, in append order.
    pub async fn statuses_for(&self, order_id: OrderId) -> Vec<OrderStatus> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.order_id == order_id)
            .map(|r| r.status)
            .collect()
    }

    /// Returns the total number of records.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl OrderHistory for InMemoryOrderHistory {
    async fn append(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        recorded_at: DateTime<Utc>,
    ) -> Result<()> {
        self.records.write().await.push(OrderHistoryRecord {
            order_id,
            status,
            recorded_at,
        });
        Ok(())
    }
}
