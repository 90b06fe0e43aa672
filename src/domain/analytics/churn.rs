//! Churn-risk scoring from the event log.
//!
//! A customer is at risk when their last recurring charge is older than
//! one expected billing period plus a grace window: they were due to
//! renew and no renewal event arrived. The score is the at-risk fraction
//! of all customers with recurring history.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::foundation::{CustomerId, Timestamp};
use crate::domain::revenue::RevenueEvent;

/// Tunables for churn-risk scoring.
#[derive(Debug, Clone, Copy)]
pub struct ChurnParams {
    /// Expected days between recurring charges.
    pub expected_period_days: i64,

    /// Days past the expected renewal before a customer counts as at risk.
    pub grace_days: i64,
}

impl Default for ChurnParams {
    fn default() -> Self {
        Self {
            expected_period_days: 30,
            grace_days: 3,
        }
    }
}

/// Churn-risk reduction result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnRisk {
    /// Customers past their expected renewal with no renewal event.
    pub at_risk_customers: u64,

    /// Customers with any recurring charge history.
    pub total_customers: u64,

    /// `at_risk / total`, zero when there is no history.
    pub score: f64,
}

/// Scores churn risk over an event slice as of a given instant.
///
/// Deterministic: the reduction keys on customer id in sorted order and
/// uses only event timestamps, never wall-clock reads.
pub fn churn_risk(events: &[RevenueEvent], as_of: Timestamp, params: ChurnParams) -> ChurnRisk {
    // Latest recurring charge per customer.
    let mut last_recurring: BTreeMap<CustomerId, Timestamp> = BTreeMap::new();
    for event in events {
        if !event.event_type.is_recurring() {
            continue;
        }
        let Some(customer_id) = event.customer_id else {
            continue;
        };
        last_recurring
            .entry(customer_id)
            .and_modify(|at| {
                if event.occurred_at > *at {
                    *at = event.occurred_at;
                }
            })
            .or_insert(event.occurred_at);
    }

    let overdue_cutoff = params.expected_period_days + params.grace_days;
    let at_risk = last_recurring
        .values()
        .filter(|last| last.whole_days_until(&as_of) > overdue_cutoff)
        .count() as u64;
    let total = last_recurring.len() as u64;

    let score = if total == 0 {
        0.0
    } else {
        at_risk as f64 / total as f64
    };

    ChurnRisk {
        at_risk_customers: at_risk,
        total_customers: total,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CurrencyCode, Money, RevenueEventId, TenantId};
    use crate::domain::revenue::{EventSource, RevenueEventType};

    fn renewal(id: &str, customer: CustomerId, at: Timestamp) -> RevenueEvent {
        RevenueEvent::new(
            RevenueEventId::new(id).unwrap(),
            TenantId::new(),
            RevenueEventType::SubscriptionRenewed,
            Money::from_cents(150_000, CurrencyCode::USD),
            at,
            EventSource::Internal,
        )
        .unwrap()
        .with_customer(customer)
    }

    #[test]
    fn current_customers_are_not_at_risk() {
        let now = Timestamp::now();
        let events = vec![renewal("r1", CustomerId::new(), now.minus_days(10))];

        let risk = churn_risk(&events, now, ChurnParams::default());
        assert_eq!(risk.at_risk_customers, 0);
        assert_eq!(risk.total_customers, 1);
        assert_eq!(risk.score, 0.0);
    }

    #[test]
    fn customer_past_period_plus_grace_is_at_risk() {
        let now = Timestamp::now();
        let events = vec![renewal("r1", CustomerId::new(), now.minus_days(34))];

        let risk = churn_risk(&events, now, ChurnParams::default());
        assert_eq!(risk.at_risk_customers, 1);
        assert_eq!(risk.score, 1.0);
    }

    #[test]
    fn grace_window_holds_the_line() {
        let now = Timestamp::now();
        // Exactly period + grace days old: still inside the line.
        let events = vec![renewal("r1", CustomerId::new(), now.minus_days(33))];

        let risk = churn_risk(&events, now, ChurnParams::default());
        assert_eq!(risk.at_risk_customers, 0);
    }

    #[test]
    fn latest_renewal_wins_per_customer() {
        let now = Timestamp::now();
        let customer = CustomerId::new();
        let events = vec![
            renewal("r1", customer, now.minus_days(70)),
            renewal("r2", customer, now.minus_days(5)),
        ];

        let risk = churn_risk(&events, now, ChurnParams::default());
        assert_eq!(risk.total_customers, 1);
        assert_eq!(risk.at_risk_customers, 0);
    }

    #[test]
    fn score_is_fraction_of_customer_base() {
        let now = Timestamp::now();
        let events = vec![
            renewal("r1", CustomerId::new(), now.minus_days(60)),
            renewal("r2", CustomerId::new(), now.minus_days(5)),
            renewal("r3", CustomerId::new(), now.minus_days(2)),
            renewal("r4", CustomerId::new(), now.minus_days(90)),
        ];

        let risk = churn_risk(&events, now, ChurnParams::default());
        assert_eq!(risk.total_customers, 4);
        assert_eq!(risk.at_risk_customers, 2);
        assert_eq!(risk.score, 0.5);
    }

    #[test]
    fn empty_history_scores_zero() {
        let risk = churn_risk(&[], Timestamp::now(), ChurnParams::default());
        assert_eq!(risk.total_customers, 0);
        assert_eq!(risk.score, 0.0);
    }
}
