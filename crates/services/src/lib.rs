//! Domain services and their command handlers.
//!
//! Each handler subscribes to one command topic, performs the local
//! state change against its domain service, and publishes the correlated
//! outcome event. The event is the error channel for domain failures;
//! infrastructure failures propagate so redelivery can retry them.

pub mod error;
pub mod orders;
pub mod payments;
pub mod products;

pub use error::{HandlerError, OrderError, PaymentError, ReservationError};
pub use orders::{InMemoryOrderService, OrderCommandsHandler, OrderPlacement, OrderService};
pub use payments::{InMemoryPaymentService, PaymentCommandsHandler, PaymentService};
pub use products::{InMemoryReservationService, ProductCommandsHandler, ReservationService};
