//! Message bus abstraction for the order saga.
//!
//! The bus is a durable, partitioned publish/subscribe channel with
//! at-least-once delivery: consumers must tolerate duplicates. Ordering
//! is preserved only among messages sharing the same partition key (the
//! order ID); nothing is guaranteed across topics.

pub mod error;
pub mod memory;
pub mod topic;

mod bus;

pub use bus::{MessageBus, Subscription};
pub use error::{BusError, Result};
pub use memory::InMemoryMessageBus;
pub use topic::{Topic, Topics};
