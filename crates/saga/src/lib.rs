//! Choreography-based saga coordinator for order fulfillment.
//!
//! The saga spans three services (orders, inventory, payments) with no
//! shared database: each step succeeds or fails independently, and the
//! coordinator reacts to domain events by issuing the next command,
//! appending an audit record, and issuing compensating commands when a
//! step fails. Every order ends in exactly one terminal state, approved
//! or rejected.
//!
//! Happy path:
//! `OrderCreated → ReserveProduct → ProductReserved → ProcessPayment →
//! PaymentProcessed → ApproveOrder → OrderApproved`.
//!
//! On payment failure the held reservation is compensated
//! (`CancelProductReservation`) before the order is rejected; on
//! reservation failure nothing was held and the order is rejected
//! directly.

pub mod coordinator;
pub mod dedupe;
pub mod error;
pub mod monitor;
pub mod step;
pub mod store;
pub mod transition;

pub use coordinator::OrderSaga;
pub use dedupe::DedupeSet;
pub use error::SagaError;
pub use monitor::StuckSagaMonitor;
pub use step::{SagaInstance, SagaStep};
pub use store::{InMemorySagaStore, SagaStore};
pub use transition::{Transition, transition};
