//! In-memory message bus implementation for testing and local runs.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use messages::MessageEnvelope;
use tokio::sync::{RwLock, mpsc};

use crate::Result;
use crate::bus::{MessageBus, Subscription};
use crate::topic::Topic;

struct SubscriberEntry {
    topics: HashSet<Topic>,
    tx: mpsc::UnboundedSender<MessageEnvelope>,
}

#[derive(Default)]
struct InMemoryBusState {
    subscribers: Vec<SubscriberEntry>,
    log: Vec<(Topic, MessageEnvelope)>,
}

/// In-memory message bus.
///
/// Delivers every published envelope to all matching subscriptions in
/// publish order per topic, which trivially satisfies the per-key
/// ordering contract. The full publish log is retained so tests can
/// assert on outgoing traffic.
#[derive(Clone, Default)]
pub struct InMemoryMessageBus {
    state: Arc<RwLock<InMemoryBusState>>,
}

impl InMemoryMessageBus {
    /// Creates a new empty in-memory bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all envelopes published to a topic, in publish order.
    pub async fn published_on(&self, topic: &Topic) -> Vec<MessageEnvelope> {
        self.state
            .read()
            .await
            .log
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Returns the total number of published envelopes.
    pub async fn publish_count(&self) -> usize {
        self.state.read().await.log.len()
    }

    /// Redelivers an already-published envelope to current subscribers.
    ///
    /// Models the at-least-once contract in tests: the duplicate is not
    /// re-appended to the publish log.
    pub async fn redeliver(&self, topic: &Topic, envelope: MessageEnvelope) {
        let mut state = self.state.write().await;
        state.subscribers.retain(|s| !s.tx.is_closed());
        for subscriber in &state.subscribers {
            if subscriber.topics.contains(topic) {
                let _ = subscriber.tx.send(envelope.clone());
            }
        }
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, topic: &Topic, envelope: MessageEnvelope) -> Result<()> {
        let mut state = self.state.write().await;

        tracing::debug!(
            topic = %topic,
            message_type = %envelope.message_type,
            order_id = %envelope.order_id,
            "publishing message"
        );

        state.subscribers.retain(|s| !s.tx.is_closed());
        for subscriber in &state.subscribers {
            if subscriber.topics.contains(topic) {
                let _ = subscriber.tx.send(envelope.clone());
            }
        }

        state.log.push((topic.clone(), envelope));
        Ok(())
    }

    async fn subscribe(&self, topics: &[Topic]) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.write().await;
        state.subscribers.push(SubscriberEntry {
            topics: topics.iter().cloned().collect(),
            tx,
        });
        Ok(Subscription::new(rx))
    }
}
