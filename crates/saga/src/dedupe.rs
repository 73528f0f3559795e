//! Bounded deduplication set for at-least-once delivery.

use std::collections::{HashSet, VecDeque};

use tokio::sync::Mutex;

use common::OrderId;
use messages::EventKind;

/// Default number of processed keys retained.
pub const DEFAULT_DEDUPE_CAPACITY: usize = 4096;

struct DedupeState {
    seen: HashSet<(OrderId, EventKind)>,
    order: VecDeque<(OrderId, EventKind)>,
}

/// Remembers which `(order, event)` pairs were already processed.
///
/// Retention is bounded: once capacity is reached the oldest keys are
/// evicted, so a very late duplicate may slip through. That is
/// acceptable under at-least-once semantics — downstream operations are
/// idempotent — the set only keeps the common redelivery window cheap.
pub struct DedupeSet {
    state: Mutex<DedupeState>,
    capacity: usize,
}

impl DedupeSet {
    /// Creates a set retaining up to `capacity` processed keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(DedupeState {
                seen: HashSet::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    /// Returns true if the pair was already marked processed.
    pub async fn seen(&self, order_id: OrderId, kind: EventKind) -> bool {
        let state = self.state.lock().await;
        state.seen.contains(&(order_id, kind))
    }

    /// Marks a pair as processed, evicting the oldest key if full.
    pub async fn mark(&self, order_id: OrderId, kind: EventKind) {
        let mut state = self.state.lock().await;
        let key = (order_id, kind);
        if !state.seen.insert(key) {
            return;
        }
        state.order.push_back(key);
        while state.order.len() > self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.seen.remove(&oldest);
            }
        }
    }

    /// Returns the number of retained keys.
    pub async fn len(&self) -> usize {
        self.state.lock().await.seen.len()
    }

    /// Returns true if nothing has been marked yet.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for DedupeSet {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUPE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mark_and_seen() {
        let set = DedupeSet::new(16);
        let order_id = OrderId::new();

        assert!(!set.seen(order_id, EventKind::OrderCreated).await);
        set.mark(order_id, EventKind::OrderCreated).await;
        assert!(set.seen(order_id, EventKind::OrderCreated).await);

        // A different event for the same order is not a duplicate.
        assert!(!set.seen(order_id, EventKind::ProductReserved).await);
    }

    #[tokio::test]
    async fn test_mark_is_idempotent() {
        let set = DedupeSet::new(16);
        let order_id = OrderId::new();

        set.mark(order_id, EventKind::OrderCreated).await;
        set.mark(order_id, EventKind::OrderCreated).await;
        assert_eq!(set.len().await, 1);
    }

    #[tokio::test]
    async fn test_bounded_retention_evicts_oldest() {
        let set = DedupeSet::new(2);
        let first = OrderId::new();
        let second = OrderId::new();
        let third = OrderId::new();

        set.mark(first, EventKind::OrderCreated).await;
        set.mark(second, EventKind::OrderCreated).await;
        set.mark(third, EventKind::OrderCreated).await;

        assert_eq!(set.len().await, 2);
        assert!(!set.seen(first, EventKind::OrderCreated).await);
        assert!(set.seen(second, EventKind::OrderCreated).await);
        assert!(set.seen(third, EventKind::OrderCreated).await);
    }
}
