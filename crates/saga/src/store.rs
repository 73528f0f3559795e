//! Saga instance store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderId;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::step::{SagaInstance, SagaStep};

/// Persisted cursor of every saga, keyed by order ID.
///
/// Updated alongside each transition so that progress survives outside
/// the message flow and stalled sagas can be found.
#[async_trait]
pub trait SagaStore: Send + Sync {
    /// Records the step an order's saga has advanced to.
    async fn upsert(&self, order_id: OrderId, step: SagaStep) -> Result<()>;

    /// Returns the saga instance for an order, if one was recorded.
    async fn get(&self, order_id: OrderId) -> Result<Option<SagaInstance>>;

    /// Returns all non-terminal sagas whose last advance is older than
    /// the cutoff.
    async fn stuck(&self, cutoff: DateTime<Utc>) -> Result<Vec<SagaInstance>>;
}

/// In-memory saga store for testing and local runs.
#[derive(Clone, Default)]
pub struct InMemorySagaStore {
    instances: Arc<RwLock<HashMap<OrderId, SagaInstance>>>,
}

impl InMemorySagaStore {
    /// Creates a new empty saga store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of recorded sagas.
    pub async fn instance_count(&self) -> usize {
        self.instances.read().await.len()
    }
}

#[async_trait]
impl SagaStore for InMemorySagaStore {
    async fn upsert(&self, order_id: OrderId, step: SagaStep) -> Result<()> {
        let now = Utc::now();
        let mut instances = self.instances.write().await;
        instances
            .entry(order_id)
            .and_modify(|instance| {
                instance.step = step;
                instance.updated_at = now;
            })
            .or_insert_with(|| SagaInstance::new(order_id, step, now));
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<SagaInstance>> {
        Ok(self.instances.read().await.get(&order_id).cloned())
    }

    async fn stuck(&self, cutoff: DateTime<Utc>) -> Result<Vec<SagaInstance>> {
        Ok(self
            .instances
            .read()
            .await
            .values()
            .filter(|i| !i.is_terminal() && i.updated_at < cutoff)
            .cloned()
            .collect())
    }
}
