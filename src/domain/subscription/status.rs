//! Subscription status state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Subscription lifecycle status.
///
/// The machine is `active ⇄ paused`, with `canceled` reachable from both
/// and terminal. There is no pending state: a subscription exists only
/// once payment setup succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Billing normally.
    Active,

    /// Temporarily paused; no charges occur while paused.
    Paused,

    /// Canceled. Terminal; history is retained.
    Canceled,
}

impl SubscriptionStatus {
    /// Returns true if renewal charges may be scheduled in this status.
    pub fn is_billable(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            (Active, Paused) | (Paused, Active) | (Active, Canceled) | (Paused, Canceled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Active => vec![Paused, Canceled],
            Paused => vec![Active, Canceled],
            Canceled => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_pauses_and_resumes() {
        let paused = SubscriptionStatus::Active
            .transition_to(SubscriptionStatus::Paused)
            .unwrap();
        assert_eq!(
            paused.transition_to(SubscriptionStatus::Active),
            Ok(SubscriptionStatus::Active)
        );
    }

    #[test]
    fn canceled_is_terminal() {
        assert!(SubscriptionStatus::Canceled.is_terminal());
        assert!(SubscriptionStatus::Canceled
            .transition_to(SubscriptionStatus::Active)
            .is_err());
        assert!(SubscriptionStatus::Canceled
            .transition_to(SubscriptionStatus::Paused)
            .is_err());
    }

    #[test]
    fn cancel_allowed_from_both_active_and_paused() {
        assert!(SubscriptionStatus::Active.can_transition_to(&SubscriptionStatus::Canceled));
        assert!(SubscriptionStatus::Paused.can_transition_to(&SubscriptionStatus::Canceled));
    }

    #[test]
    fn only_active_is_billable() {
        assert!(SubscriptionStatus::Active.is_billable());
        assert!(!SubscriptionStatus::Paused.is_billable());
        assert!(!SubscriptionStatus::Canceled.is_billable());
    }
}
