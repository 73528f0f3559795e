//! Payment domain service and the payment command handler.

use std::sync::Arc;

use async_trait::async_trait;
use bus::{MessageBus, Subscription, Topics};
use common::{Money, OrderId, ProductId};
use messages::{Command, Event, MessageEnvelope, commands::ProcessPaymentData};
use tokio::sync::RwLock;

use crate::error::{PaymentError, Result};

/// Trait for the service owning charge processing.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Charges the payment for an order.
    async fn charge(
        &self,
        order_id: OrderId,
        product_id: &ProductId,
        price: Money,
        quantity: u32,
    ) -> std::result::Result<(), PaymentError>;
}

#[derive(Debug, Clone)]
struct PaymentRecord {
    #[allow(dead_code)]
    order_id: OrderId,
    amount: Money,
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    payments: Vec<PaymentRecord>,
    fail_on_charge: bool,
}

/// In-memory payment service for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentService {
    /// Creates a new payment service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to decline the next charges.
    pub async fn set_fail_on_charge(&self, fail: bool) {
        self.state.write().await.fail_on_charge = fail;
    }

    /// Returns the number of successful charges.
    pub async fn payment_count(&self) -> usize {
        self.state.read().await.payments.len()
    }

    /// Returns the sum of all charged amounts.
    pub async fn total_charged(&self) -> Money {
        self.state
            .read()
            .await
            .payments
            .iter()
            .fold(Money::zero(), |acc, p| acc + p.amount)
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn charge(
        &self,
        order_id: OrderId,
        _product_id: &ProductId,
        price: Money,
        quantity: u32,
    ) -> std::result::Result<(), PaymentError> {
        let mut state = self.state.write().await;

        if state.fail_on_charge {
            return Err(PaymentError::Declined {
                order_id,
                reason: "card declined".to_string(),
            });
        }

        state.payments.push(PaymentRecord {
            order_id,
            amount: price.multiply(quantity),
        });
        Ok(())
    }
}

/// Consumes `payment-commands` and publishes the correlated outcome to
/// `payment-events`.
#[derive(Clone)]
pub struct PaymentCommandsHandler<B, P>
where
    B: MessageBus,
    P: PaymentService,
{
    bus: B,
    payments: P,
    topics: Topics,
}

impl<B, P> PaymentCommandsHandler<B, P>
where
    B: MessageBus,
    P: PaymentService,
{
    /// Creates a new payment command handler.
    pub fn new(bus: B, payments: P, topics: Topics) -> Self {
        Self {
            bus,
            payments,
            topics,
        }
    }

    /// Handles a single command.
    pub async fn handle(&self, command: Command) -> Result<()> {
        match command {
            Command::ProcessPayment(data) => self.handle_process(data).await,
            other => {
                tracing::trace!(message_type = ?other.kind(), "ignoring unrelated command");
                Ok(())
            }
        }
    }

    async fn handle_process(&self, data: ProcessPaymentData) -> Result<()> {
        let event = match self
            .payments
            .charge(data.order_id, &data.product_id, data.price, data.quantity)
            .await
        {
            Ok(()) => Event::payment_processed(data.order_id),
            Err(err) => {
                tracing::warn!(order_id = %data.order_id, error = %err, "payment failed");
                Event::payment_failed(data.order_id, data.product_id, data.quantity)
            }
        };

        let envelope = MessageEnvelope::wrap(&event)?;
        self.bus
            .publish(&self.topics.payment_events, envelope)
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
