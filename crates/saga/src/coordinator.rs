//! The choreography saga coordinator.

use std::sync::Arc;

use bus::{MessageBus, Subscription, Topics};
use chrono::Utc;
use history::OrderHistory;
use messages::{Event, Message, MessageEnvelope};

use crate::dedupe::DedupeSet;
use crate::error::Result;
use crate::store::SagaStore;
use crate::transition::transition;

/// Reacts to domain events by issuing the next command and appending an
/// audit record.
///
/// The coordinator holds no business state of its own: each event is
/// mapped through the pure rule table, the side effects are performed,
/// and the saga store records how far the order got. The bus handle is
/// injected at construction and owned by the coordinator.
///
/// The publish and the history append are independent I/O operations
/// with no atomicity between them; consistency comes from at-least-once
/// redelivery plus the dedupe gate, not from transactions.
#[derive(Clone)]
pub struct OrderSaga<B, H, S>
where
    B: MessageBus,
    H: OrderHistory,
    S: SagaStore,
{
    bus: B,
    history: H,
    store: S,
    topics: Topics,
    dedupe: Arc<DedupeSet>,
}

impl<B, H, S> OrderSaga<B, H, S>
where
    B: MessageBus,
    H: OrderHistory,
    S: SagaStore,
{
    /// Creates a new coordinator.
    pub fn new(bus: B, history: H, store: S, topics: Topics) -> Self {
        Self {
            bus,
            history,
            store,
            topics,
            dedupe: Arc::new(DedupeSet::default()),
        }
    }

    /// Handles one domain event.
    ///
    /// A duplicate delivery of an already-processed event is dropped
    /// before any side effect. The event is marked processed only after
    /// its side effects succeed, so a failed publish or append stays
    /// eligible for redelivery.
    #[tracing::instrument(
        skip(self, event),
        fields(order_id = %event.order_id(), event = event.message_type())
    )]
    pub async fn handle_event(&self, event: Event) -> Result<()> {
        metrics::counter!("saga_events_total").increment(1);

        let order_id = event.order_id();
        let kind = event.kind();

        if self.dedupe.seen(order_id, kind).await {
            metrics::counter!("saga_duplicate_events_total").increment(1);
            tracing::debug!("dropping duplicate event");
            return Ok(());
        }

        let reaction = transition(&event);

        if let Some(command) = &reaction.command {
            let topic = self.topics.command_topic(command);
            let envelope = MessageEnvelope::wrap(command)?;
            tracing::info!(command = command.message_type(), topic = %topic, "issuing command");
            self.bus.publish(topic, envelope).await?;
        }

        if let Some(status) = reaction.status {
            self.history.append(order_id, status, Utc::now()).await?;
            match status {
                common::OrderStatus::Approved => {
                    metrics::counter!("saga_orders_approved_total").increment(1);
                    tracing::info!("order approved");
                }
                common::OrderStatus::Rejected => {
                    metrics::counter!("saga_orders_rejected_total").increment(1);
                    tracing::info!("order rejected");
                }
                common::OrderStatus::Created => {}
            }
        }

        self.store.upsert(order_id, reaction.step).await?;
        self.dedupe.mark(order_id, kind).await;

        Ok(())
    }

    /// Handles one envelope from the bus.
    ///
    /// Message types outside the event union are skipped so unknown
    /// producers can share the topics without breaking the saga.
    pub async fn handle_envelope(&self, envelope: MessageEnvelope) -> Result<()> {
        match envelope.decode::<Event>() {
            Ok(event) => self.handle_event(event).await,
            Err(err) => {
                tracing::debug!(
                    message_type = %envelope.message_type,
                    error = %err,
                    "skipping unhandled message type"
                );
                Ok(())
            }
        }
    }

    /// Consumes domain events from a subscription until it closes.
    ///
    /// A handling error is logged and does not stop the loop: the
    /// failure is local to one order, never fatal to the process.
    pub async fn run(&self, mut subscription: Subscription) {
        while let Some(envelope) = subscription.recv().await {
            if let Err(err) = self.handle_envelope(envelope).await {
                metrics::counter!("saga_handler_errors_total").increment(1);
                tracing::error!(error = %err, "event handling failed");
            }
        }
        tracing::debug!("event subscription closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus::InMemoryMessageBus;
    use common::{Money, OrderId, OrderStatus, ProductId};
    use history::InMemoryOrderHistory;
    use messages::Command;

    use crate::step::SagaStep;
    use crate::store::InMemorySagaStore;

    type TestSaga = OrderSaga<InMemoryMessageBus, InMemoryOrderHistory, InMemorySagaStore>;

    fn setup() -> (
        TestSaga,
        InMemoryMessageBus,
        InMemoryOrderHistory,
        InMemorySagaStore,
        Topics,
    ) {
        let bus = InMemoryMessageBus::new();
        let history = InMemoryOrderHistory::new();
        let store = InMemorySagaStore::new();
        let topics = Topics::default();
        let saga = OrderSaga::new(
            bus.clone(),
            history.clone(),
            store.clone(),
            topics.clone(),
        );
        (saga, bus, history, store, topics)
    }

    async fn commands_on(bus: &InMemoryMessageBus, topic: &bus::Topic) -> Vec<Command> {
        bus.published_on(topic)
            .await
            .iter()
            .map(|e| e.decode().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_order_created_reserves_and_records_created() {
        let (saga, bus, history, store, topics) = setup();
        let order_id = OrderId::new();
        let product_id = ProductId::new("P1");

        saga.handle_event(Event::order_created(order_id, product_id.clone(), 2))
            .await
            .unwrap();

        assert_eq!(
            commands_on(&bus, &topics.product_commands).await,
            vec![Command::reserve_product(product_id, 2, order_id)]
        );
        assert_eq!(
            history.statuses_for(order_id).await,
            vec![OrderStatus::Created]
        );
        let instance = store.get(order_id).await.unwrap().unwrap();
        assert_eq!(instance.step, SagaStep::AwaitingReservation);
    }

    #[tokio::test]
    async fn test_product_reserved_requests_payment() {
        let (saga, bus, history, _, topics) = setup();
        let order_id = OrderId::new();
        let product_id = ProductId::new("P1");
        let price = Money::from_cents(1000);

        saga.handle_event(Event::product_reserved(order_id, product_id.clone(), price, 3))
            .await
            .unwrap();

        assert_eq!(
            commands_on(&bus, &topics.payment_commands).await,
            vec![Command::process_payment(order_id, product_id, price, 3)]
        );
        assert!(history.statuses_for(order_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_reservation_failure_rejects_the_order() {
        let (saga, bus, history, store, topics) = setup();
        let order_id = OrderId::new();

        saga.handle_event(Event::product_reservation_failed(
            ProductId::new("P1"),
            order_id,
            2,
        ))
        .await
        .unwrap();

        assert_eq!(
            commands_on(&bus, &topics.order_commands).await,
            vec![Command::reject_order(order_id)]
        );
        assert_eq!(
            history.statuses_for(order_id).await,
            vec![OrderStatus::Rejected]
        );
        assert!(store.get(order_id).await.unwrap().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn test_payment_failure_compensates_then_cancellation_rejects() {
        let (saga, bus, history, _, topics) = setup();
        let order_id = OrderId::new();
        let product_id = ProductId::new("P1");

        saga.handle_event(Event::payment_failed(order_id, product_id.clone(), 3))
            .await
            .unwrap();
        assert_eq!(
            commands_on(&bus, &topics.product_commands).await,
            vec![Command::cancel_product_reservation(
                product_id.clone(),
                order_id,
                3
            )]
        );

        saga.handle_event(Event::product_reservation_cancelled(product_id, order_id))
            .await
            .unwrap();
        assert_eq!(
            commands_on(&bus, &topics.order_commands).await,
            vec![Command::reject_order(order_id)]
        );
        assert_eq!(
            history.statuses_for(order_id).await,
            vec![OrderStatus::Rejected]
        );
    }

    #[tokio::test]
    async fn test_order_approved_records_terminal_success() {
        let (saga, bus, history, store, _) = setup();
        let order_id = OrderId::new();

        saga.handle_event(Event::order_approved(order_id))
            .await
            .unwrap();

        assert_eq!(bus.publish_count().await, 0);
        assert_eq!(
            history.statuses_for(order_id).await,
            vec![OrderStatus::Approved]
        );
        assert_eq!(
            store.get(order_id).await.unwrap().unwrap().step,
            SagaStep::Approved
        );
    }

    #[tokio::test]
    async fn test_duplicate_event_produces_no_second_side_effect() {
        let (saga, bus, history, _, _) = setup();
        let order_id = OrderId::new();
        let event = Event::order_created(order_id, ProductId::new("P1"), 2);

        saga.handle_event(event.clone()).await.unwrap();
        saga.handle_event(event).await.unwrap();

        assert_eq!(bus.publish_count().await, 1);
        assert_eq!(
            history.statuses_for(order_id).await,
            vec![OrderStatus::Created]
        );
    }

    #[tokio::test]
    async fn test_distinct_events_for_same_order_are_not_duplicates() {
        let (saga, bus, _, _, _) = setup();
        let order_id = OrderId::new();
        let product_id = ProductId::new("P1");

        saga.handle_event(Event::order_created(order_id, product_id.clone(), 2))
            .await
            .unwrap();
        saga.handle_event(Event::product_reserved(
            order_id,
            product_id,
            Money::from_cents(1000),
            2,
        ))
        .await
        .unwrap();

        assert_eq!(bus.publish_count().await, 2);
    }

    #[tokio::test]
    async fn test_unknown_message_types_are_skipped() {
        let (saga, bus, history, store, _) = setup();

        // A command envelope arriving on an event subscription must not
        // disturb the saga.
        let envelope =
            MessageEnvelope::wrap(&Command::approve_order(OrderId::new())).unwrap();
        saga.handle_envelope(envelope).await.unwrap();

        assert_eq!(bus.publish_count().await, 0);
        assert_eq!(history.record_count().await, 0);
        assert_eq!(store.instance_count().await, 0);
    }
}
