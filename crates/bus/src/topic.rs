//! Topic names and routing.
//!
//! Channel names are configuration, not part of the wire contract: every
//! component receives its topics at construction instead of hardcoding
//! them.

use messages::Command;

/// A named bus channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(String);

impl Topic {
    /// Creates a topic from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the topic name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// The six logical channels of the order saga.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    /// `OrderCreated`, `OrderApproved`.
    pub order_events: Topic,

    /// `ProductReserved`, `ProductReservationFailed`,
    /// `ProductReservationCancelled`.
    pub product_events: Topic,

    /// `PaymentProcessed`, `PaymentFailed`.
    pub payment_events: Topic,

    /// `ReserveProduct`, `CancelProductReservation`.
    pub product_commands: Topic,

    /// `ProcessPayment`.
    pub payment_commands: Topic,

    /// `ApproveOrder`, `RejectOrder`.
    pub order_commands: Topic,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            order_events: Topic::new("order-events"),
            product_events: Topic::new("product-events"),
            payment_events: Topic::new("payment-events"),
            product_commands: Topic::new("product-commands"),
            payment_commands: Topic::new("payment-commands"),
            order_commands: Topic::new("order-commands"),
        }
    }
}

impl Topics {
    /// The event topics the saga coordinator subscribes to.
    pub fn event_topics(&self) -> Vec<Topic> {
        vec![
            self.order_events.clone(),
            self.product_events.clone(),
            self.payment_events.clone(),
        ]
    }

    /// Returns the command topic a given command is routed to.
    pub fn command_topic(&self, command: &Command) -> &Topic {
        match command {
            Command::ReserveProduct(_) | Command::CancelProductReservation(_) => {
                &self.product_commands
            }
            Command::ProcessPayment(_) => &self.payment_commands,
            Command::ApproveOrder(_) | Command::RejectOrder(_) => &self.order_commands,
        }
    }
}
