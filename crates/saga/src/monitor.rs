//! Stuck-saga detection.
//!
//! A saga with no applicable transition left stays non-terminal forever;
//! since the coordinator is purely reactive, the only way to notice is
//! to watch the saga store. The monitor flags sagas whose last advance
//! is older than the SLA window.

use chrono::{Duration, Utc};

use crate::error::Result;
use crate::step::SagaInstance;
use crate::store::SagaStore;

/// Periodically scans the saga store for sagas that stopped advancing.
pub struct StuckSagaMonitor<S>
where
    S: SagaStore,
{
    store: S,
    sla: Duration,
    check_interval: std::time::Duration,
}

impl<S> StuckSagaMonitor<S>
where
    S: SagaStore,
{
    /// Creates a monitor flagging sagas stalled longer than `sla`.
    pub fn new(store: S, sla: Duration) -> Self {
        Self {
            store,
            sla,
            check_interval: std::time::Duration::from_secs(30),
        }
    }

    /// Overrides how often [`run`](Self::run) scans the store.
    pub fn with_check_interval(mut self, interval: std::time::Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Scans once and returns the stuck sagas, warning about each.
    pub async fn check(&self) -> Result<Vec<SagaInstance>> {
        let cutoff = Utc::now() - self.sla;
        let stuck = self.store.stuck(cutoff).await?;

        metrics::gauge!("saga_stuck_count").set(stuck.len() as f64);
        for instance in &stuck {
            tracing::warn!(
                order_id = %instance.order_id,
                step = %instance.step,
                updated_at = %instance.updated_at,
                "saga stuck past SLA"
            );
        }

        Ok(stuck)
    }

    /// Scans the store on an interval until the task is dropped.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.check_interval);
        loop {
            ticker.tick().await;
            if let Err(err) = self.check().await {
                tracing::error!(error = %err, "stuck-saga scan failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::SagaStep;
    use crate::store::InMemorySagaStore;
    use common::OrderId;

    #[tokio::test]
    async fn test_flags_stalled_saga() {
        let store = InMemorySagaStore::new();
        let order_id = OrderId::new();
        store
            .upsert(order_id, SagaStep::AwaitingPayment)
            .await
            .unwrap();

        // Zero SLA: anything recorded before the scan counts as stalled.
        let monitor = StuckSagaMonitor::new(store, Duration::zero());
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let stuck = monitor.check().await.unwrap();
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].order_id, order_id);
    }

    #[tokio::test]
    async fn test_ignores_terminal_and_fresh_sagas() {
        let store = InMemorySagaStore::new();
        store
            .upsert(OrderId::new(), SagaStep::Approved)
            .await
            .unwrap();
        store
            .upsert(OrderId::new(), SagaStep::AwaitingReservation)
            .await
            .unwrap();

        let monitor = StuckSagaMonitor::new(store, Duration::hours(1));
        assert!(monitor.check().await.unwrap().is_empty());
    }
}
