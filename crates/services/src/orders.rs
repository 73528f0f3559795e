//! Order domain service, order placement, and the order command handler.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bus::{MessageBus, Subscription, Topics};
use common::{OrderId, OrderStatus, ProductId};
use messages::{Command, Event, MessageEnvelope};
use tokio::sync::RwLock;

use crate::error::{OrderError, Result};

/// Trait for the service owning the order lifecycle.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Records a newly placed order.
    async fn create(
        &self,
        order_id: OrderId,
        product_id: &ProductId,
        quantity: u32,
    ) -> std::result::Result<(), OrderError>;

    /// Moves an order to its approved terminal state.
    async fn approve(&self, order_id: OrderId) -> std::result::Result<(), OrderError>;

    /// Moves an order to its rejected terminal state.
    async fn reject(&self, order_id: OrderId) -> std::result::Result<(), OrderError>;
}

#[derive(Debug, Clone)]
struct OrderRecord {
    #[allow(dead_code)]
    product_id: ProductId,
    #[allow(dead_code)]
    quantity: u32,
    status: OrderStatus,
}

/// In-memory order service for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderService {
    orders: Arc<RwLock<HashMap<OrderId, OrderRecord>>>,
}

impl InMemoryOrderService {
    /// Creates a new empty order service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current status of an order.
    pub async fn status_of(&self, order_id: OrderId) -> Option<OrderStatus> {
        self.orders.read().await.get(&order_id).map(|o| o.status)
    }

    /// Returns the number of known orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn create(
        &self,
        order_id: OrderId,
        product_id: &ProductId,
        quantity: u32,
    ) -> std::result::Result<(), OrderError> {
        self.orders.write().await.insert(
            order_id,
            OrderRecord {
                product_id: product_id.clone(),
                quantity,
                status: OrderStatus::Created,
            },
        );
        Ok(())
    }

    async fn approve(&self, order_id: OrderId) -> std::result::Result<(), OrderError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(OrderError::NotFound(order_id))?;
        // Safe under redelivery.
        order.status = OrderStatus::Approved;
        Ok(())
    }

    async fn reject(&self, order_id: OrderId) -> std::result::Result<(), OrderError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(OrderError::NotFound(order_id))?;
        order.status = OrderStatus::Rejected;
        Ok(())
    }
}

/// Entry point of the saga: records a new order and publishes
/// `OrderCreated` to `order-events`.
#[derive(Clone)]
pub struct OrderPlacement<B, O>
where
    B: MessageBus,
    O: OrderService,
{
    bus: B,
    orders: O,
    topics: Topics,
}

impl<B, O> OrderPlacement<B, O>
where
    B: MessageBus,
    O: OrderService,
{
    /// Creates a new order placement service.
    pub fn new(bus: B, orders: O, topics: Topics) -> Self {
        Self { bus, orders, topics }
    }

    /// Places an order and kicks off its saga.
    pub async fn place_order(&self, product_id: ProductId, quantity: u32) -> Result<OrderId> {
        let order_id = OrderId::new();
        self.orders.create(order_id, &product_id, quantity).await?;

        let event = Event::order_created(order_id, product_id, quantity);
        let envelope = MessageEnvelope::wrap(&event)?;
        self.bus.publish(&self.topics.order_events, envelope).await?;

        tracing::info!(%order_id, "order placed");
        Ok(order_id)
    }
}

/// Consumes `order-commands` and finalizes the order lifecycle.
///
/// `ApproveOrder` is confirmed with an `OrderApproved` event;
/// `RejectOrder` has no confirmation event — the saga already recorded
/// the rejection when it issued the command.
#[derive(Clone)]
pub struct OrderCommandsHandler<B, O>
where
    B: MessageBus,
    O: OrderService,
{
    bus: B,
    orders: O,
    topics: Topics,
}

impl<B, O> OrderCommandsHandler<B, O>
where
    B: MessageBus,
    O: OrderService,
{
    /// Creates a new order command handler.
    pub fn new(bus: B, orders: O, topics: Topics) -> Self {
        Self { bus, orders, topics }
    }

    /// Handles a single command.
    pub async fn handle(&self, command: Command) -> Result<()> {
        match command {
            Command::ApproveOrder(data) => {
                self.orders.approve(data.order_id).await?;

                let event = Event::order_approved(data.order_id);
                let envelope = MessageEnvelope::wrap(&event)?;
                self.bus.publish(&self.topics.order_events, envelope).await?;
                Ok(())
            }
            Command::RejectOrder(data) => {
                self.orders.reject(data.order_id).await?;
                Ok(())
            }
            other => {
                tracing::trace!(message_type = ?other.kind(), "ignoring unrelated command");
                Ok(())
            }
        }
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
