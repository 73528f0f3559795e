//! Saga step cursor and the persisted saga instance record.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

/// The current step of one order's saga.
///
/// ```text
/// AwaitingReservation ──► AwaitingPayment ──► AwaitingApproval ──► Approved
///          │                     │
///          │                     └──► Compensating ──┐
///          └─────────────────────────────────────────┴──► Rejected
/// ```
/// `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SagaStep {
    /// `ReserveProduct` was issued; waiting for the reservation outcome.
    AwaitingReservation,

    /// `ProcessPayment` was issued; waiting for the charge outcome.
    AwaitingPayment,

    /// `ApproveOrder` was issued; waiting for the approval confirmation.
    AwaitingApproval,

    /// `CancelProductReservation` was issued; waiting for the
    /// compensation confirmation.
    Compensating,

    /// The order was approved (terminal).
    Approved,

    /// The order was rejected (terminal).
    Rejected,
}

impl SagaStep {
    /// Returns true if this is a terminal step.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaStep::Approved | SagaStep::Rejected)
    }

    /// Returns the step name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStep::AwaitingReservation => "AwaitingReservation",
            SagaStep::AwaitingPayment => "AwaitingPayment",
            SagaStep::AwaitingApproval => "AwaitingApproval",
            SagaStep::Compensating => "Compensating",
            SagaStep::Approved => "Approved",
            SagaStep::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One order's saga as recorded in the saga store.
///
/// The record makes saga progress observable outside the message flow,
/// which is what allows stuck sagas to be detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaInstance {
    /// The order this saga belongs to.
    pub order_id: OrderId,

    /// Current step.
    pub step: SagaStep,

    /// When the saga was first recorded.
    pub started_at: DateTime<Utc>,

    /// When the step last advanced.
    pub updated_at: DateTime<Utc>,
}

impl SagaInstance {
    /// Creates a new instance at the given step.
    pub fn new(order_id: OrderId, step: SagaStep, now: DateTime<Utc>) -> Self {
        Self {
            order_id,
            step,
            started_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the saga reached a terminal step.
    pub fn is_terminal(&self) -> bool {
        self.step.is_terminal()
    }
}
