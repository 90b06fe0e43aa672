//! Invoice status state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Invoice lifecycle status.
///
/// Strictly forward: `draft -> sent -> {paid | overdue}`. Overdue is
/// terminal here; recovering an overdue invoice is a manual-intervention
/// workflow above this core, not a state transition inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Line items still being assembled.
    Draft,

    /// Issued to the customer; payment attempts run in this state.
    Sent,

    /// Settled in full.
    Paid,

    /// Payment retries exhausted without settlement.
    Overdue,
}

impl StateMachine for InvoiceStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use InvoiceStatus::*;
        matches!((self, target), (Draft, Sent) | (Sent, Paid) | (Sent, Overdue))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use InvoiceStatus::*;
        match self {
            Draft => vec![Sent],
            Sent => vec![Paid, Overdue],
            Paid => vec![],
            Overdue => vec![],
        }
    }
}
