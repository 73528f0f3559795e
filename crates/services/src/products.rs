//! Reservation domain service and the product command handler.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bus::{MessageBus, Subscription, Topics};
use common::{Money, OrderId, ProductId};
use messages::{
    Command, Event, MessageEnvelope,
    commands::{CancelProductReservationData, ReserveProductData},
};
use tokio::sync::RwLock;

use crate::error::{HandlerError, ReservationError, Result};

/// Trait for the service owning product stock.
#[async_trait]
pub trait ReservationService: Send + Sync {
    /// Holds `quantity` units of a product for an order.
    ///
    /// Returns the unit price recorded at reservation time.
    async fn reserve(
        &self,
        product_id: &ProductId,
        quantity: u32,
        order_id: OrderId,
    ) -> std::result::Result<Money, ReservationError>;

    /// Releases a previously held reservation back to available stock.
    ///
    /// Releasing a reservation that no longer exists is a no-op.
    async fn cancel_reservation(
        &self,
        product_id: &ProductId,
        quantity: u32,
        order_id: OrderId,
    ) -> std::result::Result<(), ReservationError>;
}

#[derive(Debug, Clone)]
struct StockEntry {
    price: Money,
    available: u32,
}

#[derive(Debug, Clone)]
struct Reservation {
    quantity: u32,
    price: Money,
}

#[derive(Debug, Default)]
struct InMemoryReservationState {
    stock: HashMap<ProductId, StockEntry>,
    reservations: HashMap<(ProductId, OrderId), Reservation>,
    fail_on_cancel: bool,
}

/// In-memory reservation service for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationService {
    state: Arc<RwLock<InMemoryReservationState>>,
}

impl InMemoryReservationService {
    /// Creates a new service with no stock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) stock for a product.
    pub async fn add_product(&self, product_id: ProductId, price: Money, available: u32) {
        self.state
            .write()
            .await
            .stock
            .insert(product_id, StockEntry { price, available });
    }

    /// Configures the service to fail cancellation calls.
    pub async fn set_fail_on_cancel(&self, fail: bool) {
        self.state.write().await.fail_on_cancel = fail;
    }

    /// Returns the available stock for a product.
    pub async fn available(&self, product_id: &ProductId) -> Option<u32> {
        self.state
            .read()
            .await
            .stock
            .get(product_id)
            .map(|s| s.available)
    }

    /// Returns the number of active reservations.
    pub async fn reservation_count(&self) -> usize {
        self.state.read().await.reservations.len()
    }

    /// Returns true if a reservation exists for the given product/order.
    pub async fn has_reservation(&self, product_id: &ProductId, order_id: OrderId) -> bool {
        self.state
            .read()
            .await
            .reservations
            .contains_key(&(product_id.clone(), order_id))
    }
}

#[async_trait]
impl ReservationService for InMemoryReservationService {
    async fn reserve(
        &self,
        product_id: &ProductId,
        quantity: u32,
        order_id: OrderId,
    ) -> std::result::Result<Money, ReservationError> {
        let mut state = self.state.write().await;
        let key = (product_id.clone(), order_id);

        // Redelivered reserve for the same order is a no-op.
        if let Some(existing) = state.reservations.get(&key) {
            return Ok(existing.price);
        }

        let entry = state
            .stock
            .get_mut(product_id)
            .ok_or_else(|| ReservationError::UnknownProduct(product_id.clone()))?;

        if entry.available < quantity {
            return Err(ReservationError::InsufficientStock {
                product_id: product_id.clone(),
                requested: quantity,
                available: entry.available,
            });
        }

        entry.available -= quantity;
        let price = entry.price;
        state.reservations.insert(key, Reservation { quantity, price });

        Ok(price)
    }

    async fn cancel_reservation(
        &self,
        product_id: &ProductId,
        _quantity: u32,
        order_id: OrderId,
    ) -> std::result::Result<(), ReservationError> {
        let mut state = self.state.write().await;

        if state.fail_on_cancel {
            return Err(ReservationError::Unavailable("service down".to_string()));
        }

        // Already-cancelled reservations stay a no-op.
        if let Some(reservation) = state.reservations.remove(&(product_id.clone(), order_id))
            && let Some(entry) = state.stock.get_mut(product_id)
        {
            entry.available += reservation.quantity;
        }

        Ok(())
    }
}

/// Consumes `product-commands` and publishes the correlated outcome to
/// `product-events`.
#[derive(Clone)]
pub struct ProductCommandsHandler<B, R>
where
    B: MessageBus,
    R: ReservationService,
{
    bus: B,
    reservations: R,
    topics: Topics,
}

impl<B, R> ProductCommandsHandler<B, R>
where
    B: MessageBus,
    R: ReservationService,
{
    /// Creates a new product command handler.
    pub fn new(bus: B, reservations: R, topics: Topics) -> Self {
        Self {
            bus,
            reservations,
            topics,
        }
    }

    /// Handles a single command.
    ///
    /// Commands not owned by the product service are ignored.
    pub async fn handle(&self, command: Command) -> Result<()> {
        match command {
            Command::ReserveProduct(data) => self.handle_reserve(data).await,
            Command::CancelProductReservation(data) => self.handle_cancel(data).await,
            other => {
                tracing::trace!(message_type = ?other.kind(), "ignoring unrelated command");
                Ok(())
            }
        }
    }

    async fn handle_reserve(&self, data: ReserveProductData) -> Result<()> {
        match self
            .reservations
            .reserve(&data.product_id, data.quantity, data.order_id)
            .await
        {
            Ok(price) => {
                // The price comes from the domain service, never from the
                // command payload.
                let event =
                    Event::product_reserved(data.order_id, data.product_id, price, data.quantity);
                self.publish(&event).await
            }
            Err(err) => {
                tracing::warn!(
                    order_id = %data.order_id,
                    product_id = %data.product_id,
                    error = %err,
                    "product reservation failed"
                );
                let event = Event::product_reservation_failed(
                    data.product_id,
                    data.order_id,
                    data.quantity,
                );
                self.publish(&event).await
            }
        }
    }

    async fn handle_cancel(&self, data: CancelProductReservationData) -> Result<()> {
        // A cancellation that cannot reach the domain service propagates:
        // redelivery retries it, the failure is never swallowed.
        self.reservations
            .cancel_reservation(&data.product_id, data.quantity, data.order_id)
            .await?;

        let event = Event::product_reservation_cancelled(data.product_id, data.order_id);
        self.publish(&event).await
    }

    async fn publish(&self, event: &Event) -> Result<()> {
        let envelope = MessageEnvelope::wrap(event)?;
        self.bus
            .publish(&self.topics.product_events, envelope)
            .await?;
        Ok(())
    }

    /// Consumes commands from a subscription until it closes.
    pub async fn run(&self, mut subscription: Subscription) {
        while let Some(envelope) = subscription.recv().await {
            let command: Command = match envelope.decode() {
                Ok(command) => command,
                Err(err) => {
                    tracing::debug!(
                        message_type = %envelope.message_type,
                        error = %err,
                        "skipping undecodable message"
                    );
                    continue;
                }
            };

            if let Err(err) = self.handle(command).await {
                tracing::error!(order_id = %envelope.order_id, error = %err, "command handling failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus::InMemoryMessageBus;
    use messages::EventKind;

    fn handler() -> (
        ProductCommandsHandler<InMemoryMessageBus, InMemoryReservationService>,
        InMemoryMessageBus,
        InMemoryReservationService,
        Topics,
    ) {
        let bus = InMemoryMessageBus::new();
        let reservations = InMemoryReservationService::new();
        let topics = Topics::default();
        let handler = ProductCommandsHandler::new(bus.clone(), reservations.clone(), topics.clone());
        (handler, bus, reservations, topics)
    }

    async fn published_events(bus: &InMemoryMessageBus, topics: &Topics) -> Vec<Event> {
        bus.published_on(&topics.product_events)
            .await
            .iter()
            .map(|e| e.decode().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_reserve_publishes_reserved_with_service_price() {
        let (handler, bus, reservations, topics) = handler();
        let product_id = ProductId::new("P1");
        let order_id = OrderId::new();
        reservations
            .add_product(product_id.clone(), Money::from_cents(1000), 5)
            .await;

        handler
            .handle(Command::reserve_product(product_id.clone(), 2, order_id))
            .await
            .unwrap();

        let events = published_events(&bus, &topics).await;
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            Event::product_reserved(order_id, product_id.clone(), Money::from_cents(1000), 2)
        );
        assert_eq!(reservations.available(&product_id).await, Some(3));
        assert!(reservations.has_reservation(&product_id, order_id).await);
    }

    #[tokio::test]
    async fn test_insufficient_stock_publishes_failure_never_reserved() {
        let (handler, bus, reservations, topics) = handler();
        let product_id = ProductId::new("P1");
        let order_id = OrderId::new();
        reservations
            .add_product(product_id.clone(), Money::from_cents(1000), 0)
            .await;

        handler
            .handle(Command::reserve_product(product_id.clone(), 2, order_id))
            .await
            .unwrap();

        let events = published_events(&bus, &topics).await;
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            Event::product_reservation_failed(product_id, order_id, 2)
        );
        assert!(
            !events
                .iter()
                .any(|e| e.kind() == EventKind::ProductReserved)
        );
    }

    #[tokio::test]
    async fn test_unknown_product_publishes_failure() {
        let (handler, bus, _, topics) = handler();
        let product_id = ProductId::new("MISSING");
        let order_id = OrderId::new();

        handler
            .handle(Command::reserve_product(product_id.clone(), 1, order_id))
            .await
            .unwrap();

        let events = published_events(&bus, &topics).await;
        assert_eq!(
            events,
            vec![Event::product_reservation_failed(product_id, order_id, 1)]
        );
    }

    #[tokio::test]
    async fn test_redelivered_reserve_is_idempotent() {
        let (handler, bus, reservations, topics) = handler();
        let product_id = ProductId::new("P1");
        let order_id = OrderId::new();
        reservations
            .add_product(product_id.clone(), Money::from_cents(1000), 5)
            .await;

        let command = Command::reserve_product(product_id.clone(), 2, order_id);
        handler.handle(command.clone()).await.unwrap();
        handler.handle(command).await.unwrap();

        // Stock is held once; both deliveries answer with the same event.
        assert_eq!(reservations.available(&product_id).await, Some(3));
        let events = published_events(&bus, &topics).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], events[1]);
    }

    #[tokio::test]
    async fn test_cancel_publishes_exactly_one_cancelled() {
        let (handler, bus, reservations, topics) = handler();
        let product_id = ProductId::new("P1");
        let order_id = OrderId::new();
        reservations
            .add_product(product_id.clone(), Money::from_cents(1000), 5)
            .await;

        handler
            .handle(Command::reserve_product(product_id.clone(), 2, order_id))
            .await
            .unwrap();
        handler
            .handle(Command::cancel_product_reservation(
                product_id.clone(),
                order_id,
                2,
            ))
            .await
            .unwrap();

        let events = published_events(&bus, &topics).await;
        assert_eq!(
            events.last(),
            Some(&Event::product_reservation_cancelled(
                product_id.clone(),
                order_id
            ))
        );
        assert_eq!(reservations.available(&product_id).await, Some(5));
        assert_eq!(reservations.reservation_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancel_of_absent_reservation_still_publishes_cancelled() {
        let (handler, bus, reservations, topics) = handler();
        let product_id = ProductId::new("P1");
        let order_id = OrderId::new();
        reservations
            .add_product(product_id.clone(), Money::from_cents(1000), 5)
            .await;

        handler
            .handle(Command::cancel_product_reservation(
                product_id.clone(),
                order_id,
                2,
            ))
            .await
            .unwrap();

        let events = published_events(&bus, &topics).await;
        assert_eq!(
            events,
            vec![Event::product_reservation_cancelled(product_id.clone(), order_id)]
        );
        // No-op cancel must not inflate stock.
        assert_eq!(reservations.available(&product_id).await, Some(5));
    }

    #[tokio::test]
    async fn test_cancel_failure_propagates_without_event() {
        let (handler, bus, reservations, _) = handler();
        let product_id = ProductId::new("P1");
        let order_id = OrderId::new();
        reservations.set_fail_on_cancel(true).await;

        let result = handler
            .handle(Command::cancel_product_reservation(product_id, order_id, 2))
            .await;

        assert!(matches!(result, Err(HandlerError::Reservation(_))));
        assert_eq!(bus.publish_count().await, 0);
    }

    #[tokio::test]
    async fn test_unrelated_commands_are_ignored() {
        let (handler, bus, _, _) = handler();

        handler
            .handle(Command::approve_order(OrderId::new()))
            .await
            .unwrap();

        assert_eq!(bus.publish_count().await, 0);
    }
}
