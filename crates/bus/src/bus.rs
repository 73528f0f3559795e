use async_trait::async_trait;
use messages::MessageEnvelope;
use tokio::sync::mpsc;

use crate::Result;
use crate::topic::Topic;

/// A durable, partitioned publish/subscribe channel.
///
/// Delivery contract:
/// - **at-least-once**: a published envelope reaches every subscriber one
///   or more times; consumers must tolerate duplicates;
/// - **per-key ordering**: envelopes sharing an order ID are delivered to
///   a given consumer in publish order within one topic;
/// - publish is fire-and-forget: the bus acknowledges receipt, not
///   downstream processing.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes an envelope to a topic.
    async fn publish(&self, topic: &Topic, envelope: MessageEnvelope) -> Result<()>;

    /// Subscribes to one or more topics.
    ///
    /// Each subscription gets its own copy of every envelope published to
    /// the subscribed topics after the subscription was created.
    async fn subscribe(&self, topics: &[Topic]) -> Result<Subscription>;
}

/// The consuming end of a bus subscription.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<MessageEnvelope>,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<MessageEnvelope>) -> Self {
        Self { rx }
    }

    /// Waits for the next envelope. Returns `None` once the bus side of
    /// the subscription is dropped.
    pub async fn recv(&mut self) -> Option<MessageEnvelope> {
        self.rx.recv().await
    }

    /// Returns the next already-delivered envelope without waiting.
    pub fn try_recv(&mut self) -> Option<MessageEnvelope> {
        self.rx.try_recv().ok()
    }
}
