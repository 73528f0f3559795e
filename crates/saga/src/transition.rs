//! The choreography rule table.

use common::OrderStatus;
use messages::{Command, Event};

use crate::step::SagaStep;

/// The reaction to one incoming event: at most one outgoing command, at
/// most one history append, and the step the saga advances to.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Command to issue, if any.
    pub command: Option<Command>,

    /// Status to append to the history log, if any.
    pub status: Option<OrderStatus>,

    /// The step the saga is in after this event.
    pub step: SagaStep,
}

/// Maps an incoming event to its reaction.
///
/// | Event | Command | History | Step |
/// |---|---|---|---|
/// | `OrderCreated` | `ReserveProduct` | `CREATED` | AwaitingReservation |
/// | `ProductReserved` | `ProcessPayment` | — | AwaitingPayment |
/// | `ProductReservationFailed` | `RejectOrder` | `REJECTED` | Rejected |
/// | `PaymentProcessed` | `ApproveOrder` | — | AwaitingApproval |
/// | `PaymentFailed` | `CancelProductReservation` | — | Compensating |
/// | `OrderApproved` | — | `APPROVED` | Approved |
/// | `ProductReservationCancelled` | `RejectOrder` | `REJECTED` | Rejected |
///
/// The function is pure and total over [`Event`]: every failure event
/// maps to exactly one compensating or terminal transition, so every
/// saga reaches exactly one terminal step. A reservation that failed was
/// never held, so `ProductReservationFailed` rejects the order directly
/// with nothing to compensate.
pub fn transition(event: &Event) -> Transition {
    match event {
        Event::OrderCreated(data) => Transition {
            command: Some(Command::reserve_product(
                data.product_id.clone(),
                data.quantity,
                data.order_id,
            )),
            status: Some(OrderStatus::Created),
            step: SagaStep::AwaitingReservation,
        },
        Event::ProductReserved(data) => Transition {
            command: Some(Command::process_payment(
                data.order_id,
                data.product_id.clone(),
                data.price,
                data.quantity,
            )),
            status: None,
            step: SagaStep::AwaitingPayment,
        },
        Event::ProductReservationFailed(data) => Transition {
            command: Some(Command::reject_order(data.order_id)),
            status: Some(OrderStatus::Rejected),
            step: SagaStep::Rejected,
        },
        Event::PaymentProcessed(data) => Transition {
            command: Some(Command::approve_order(data.order_id)),
            status: None,
            step: SagaStep::AwaitingApproval,
        },
        Event::PaymentFailed(data) => Transition {
            command: Some(Command::cancel_product_reservation(
                data.product_id.clone(),
                data.order_id,
                data.quantity,
            )),
            status: None,
            step: SagaStep::Compensating,
        },
        Event::OrderApproved(_) => Transition {
            command: None,
            status: Some(OrderStatus::Approved),
            step: SagaStep::Approved,
        },
        Event::ProductReservationCancelled(data) => Transition {
            command: Some(Command::reject_order(data.order_id)),
            status: Some(OrderStatus::Rejected),
            step: SagaStep::Rejected,
        },
    }
}
