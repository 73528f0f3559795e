//! Order saga demo binary.
//!
//! Wires the in-memory bus, the three command handlers, and the saga
//! coordinator together, then drives two orders through the flow: one
//! that completes and one whose payment is declined and compensated.

mod config;

use bus::{InMemoryMessageBus, MessageBus};
use common::{Money, ProductId};
use history::InMemoryOrderHistory;
use saga::{InMemorySagaStore, OrderSaga, SagaStore, StuckSagaMonitor};
use services::{
    InMemoryOrderService, InMemoryPaymentService, InMemoryReservationService,
    OrderCommandsHandler, OrderPlacement, PaymentCommandsHandler, ProductCommandsHandler,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::Config;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Infrastructure: bus, topics, stores
    let bus = InMemoryMessageBus::new();
    let topics = bus::Topics::default();
    let order_history = InMemoryOrderHistory::new();
    let saga_store = InMemorySagaStore::default();

    // 3. Services behind the command handlers
    let orders = InMemoryOrderService::new();
    let reservations = InMemoryReservationService::new();
    let payments = InMemoryPaymentService::new();

    reservations
        .add_product(ProductId::new("widget"), Money::from_dollars(10), 100)
        .await;
    reservations
        .add_product(ProductId::new("gadget"), Money::from_dollars(25), 50)
        .await;

    // 4. Subscriptions taken before anything publishes
    let saga_sub = bus
        .subscribe(&topics.event_topics())
        .await
        .expect("subscribe saga");
    let product_sub = bus
        .subscribe(std::slice::from_ref(&topics.product_commands))
        .await
        .expect("subscribe product handler");
    let payment_sub = bus
        .subscribe(std::slice::from_ref(&topics.payment_commands))
        .await
        .expect("subscribe payment handler");
    let order_sub = bus
        .subscribe(std::slice::from_ref(&topics.order_commands))
        .await
        .expect("subscribe order handler");

    // 5. Spawn the coordinator, the handlers, and the stuck-saga monitor
    let saga = OrderSaga::new(
        bus.clone(),
        order_history.clone(),
        saga_store.clone(),
        topics.clone(),
    );
    tokio::spawn({
        let saga = saga.clone();
        async move { saga.run(saga_sub).await }
    });

    let product_handler =
        ProductCommandsHandler::new(bus.clone(), reservations.clone(), topics.clone());
    tokio::spawn(async move { product_handler.run(product_sub).await });

    let payment_handler =
        PaymentCommandsHandler::new(bus.clone(), payments.clone(), topics.clone());
    tokio::spawn(async move { payment_handler.run(payment_sub).await });

    let order_handler = OrderCommandsHandler::new(bus.clone(), orders.clone(), topics.clone());
    tokio::spawn(async move { order_handler.run(order_sub).await });

    let monitor = StuckSagaMonitor::new(
        saga_store.clone(),
        chrono::Duration::seconds(config.saga_sla_secs as i64),
    )
    .with_check_interval(std::time::Duration::from_secs(config.monitor_interval_secs));
    tokio::spawn(async move { monitor.run().await });

    // 6. Drive two orders through the choreography
    let placement = OrderPlacement::new(bus.clone(), orders.clone(), topics.clone());

    let approved_order = placement
        .place_order(ProductId::new("widget"), 3)
        .await
        .expect("place order");
    tracing::info!(order_id = %approved_order, "placed order, expecting approval");

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    payments.set_fail_on_charge(true).await;
    let rejected_order = placement
        .place_order(ProductId::new("gadget"), 2)
        .await
        .expect("place order");
    tracing::info!(order_id = %rejected_order, "placed order, payment will decline");

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    // 7. Report where each order ended up
    for order_id in [approved_order, rejected_order] {
        let statuses = order_history.statuses_for(order_id).await;
        let step = saga_store
            .get(order_id)
            .await
            .expect("read saga store")
            .map(|instance| instance.step.to_string());
        tracing::info!(%order_id, ?statuses, ?step, "order finished");
    }
}
