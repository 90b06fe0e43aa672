//! Customer lifetime value projection.
//!
//! CLV is the customer's observed monthly value projected over a bounded
//! horizon: historical charges divided by observed tenure in months
//! (minimum one), times the horizon. All inputs come from the ledger
//! slice, so the figure is reproducible byte for byte.

use serde::Serialize;

use crate::domain::foundation::{CurrencyCode, CustomerId, DomainError, Money, Timestamp};
use crate::domain::revenue::RevenueEvent;

/// Months a tenure bucket spans; tenure is counted in 30-day months.
const DAYS_PER_MONTH: i64 = 30;

/// Tunables for lifetime-value projection.
#[derive(Debug, Clone, Copy)]
pub struct ClvParams {
    /// Months of future value to project.
    pub projection_horizon_months: i64,
}

impl Default for ClvParams {
    fn default() -> Self {
        Self {
            projection_horizon_months: 24,
        }
    }
}

/// Lifetime-value reduction result for one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLifetimeValue {
    /// Customer the figure belongs to.
    pub customer_id: CustomerId,

    /// Sum of the customer's historical charges (refunds subtract).
    pub historical_total: Money,

    /// Whole 30-day months from first charge to `as_of`, minimum one.
    pub tenure_months: i64,

    /// `historical_total / tenure_months`, rounded half-even.
    pub monthly_value: Money,

    /// `monthly_value x horizon`: the projected lifetime value.
    pub projected_value: Money,
}

/// Projects lifetime value for one customer over an event slice.
pub fn customer_lifetime_value(
    events: &[RevenueEvent],
    customer_id: CustomerId,
    as_of: Timestamp,
    currency: CurrencyCode,
    params: ClvParams,
) -> Result<CustomerLifetimeValue, DomainError> {
    let mut total = Money::zero(currency);
    let mut first_seen: Option<Timestamp> = None;

    for event in events {
        if event.customer_id != Some(customer_id) || event.amount.currency != currency {
            continue;
        }
        total = total.checked_add(&event.amount)?;
        first_seen = Some(match first_seen {
            Some(seen) if seen <= event.occurred_at => seen,
            _ => event.occurred_at,
        });
    }

    let tenure_months = first_seen
        .map(|first| (first.whole_days_until(&as_of) / DAYS_PER_MONTH).max(1))
        .unwrap_or(1);

    let monthly_value = total.mul_ratio_half_even(1, tenure_months)?;
    let projected_value = monthly_value.mul_ratio_half_even(params.projection_horizon_months, 1)?;

    Ok(CustomerLifetimeValue {
        customer_id,
        historical_total: total,
        tenure_months,
        monthly_value,
        projected_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{RevenueEventId, TenantId};
    use crate::domain::revenue::{EventSource, RevenueEventType};

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, CurrencyCode::USD)
    }

    fn charge(id: &str, customer: CustomerId, cents: i64, at: Timestamp) -> RevenueEvent {
        RevenueEvent::new(
            RevenueEventId::new(id).unwrap(),
            TenantId::new(),
            RevenueEventType::SubscriptionRenewed,
            usd(cents),
            at,
            EventSource::Internal,
        )
        .unwrap()
        .with_customer(customer)
    }

    #[test]
    fn clv_projects_monthly_value_over_horizon() {
        let now = Timestamp::now();
        let customer = CustomerId::new();
        // Three months of $1500 charges, first one 90 days ago.
        let events = vec![
            charge("r1", customer, 150_000, now.minus_days(90)),
            charge("r2", customer, 150_000, now.minus_days(60)),
            charge("r3", customer, 150_000, now.minus_days(30)),
        ];

        let clv = customer_lifetime_value(
            &events,
            customer,
            now,
            CurrencyCode::USD,
            ClvParams::default(),
        )
        .unwrap();

        assert_eq!(clv.historical_total, usd(450_000));
        assert_eq!(clv.tenure_months, 3);
        assert_eq!(clv.monthly_value, usd(150_000));
        assert_eq!(clv.projected_value, usd(150_000 * 24));
    }

    #[test]
    fn new_customer_tenure_floors_at_one_month() {
        let now = Timestamp::now();
        let customer = CustomerId::new();
        let events = vec![charge("r1", customer, 150_000, now.minus_days(3))];

        let clv = customer_lifetime_value(
            &events,
            customer,
            now,
            CurrencyCode::USD,
            ClvParams::default(),
        )
        .unwrap();

        assert_eq!(clv.tenure_months, 1);
        assert_eq!(clv.monthly_value, usd(150_000));
    }

    #[test]
    fn other_customers_events_are_ignored() {
        let now = Timestamp::now();
        let customer = CustomerId::new();
        let events = vec![
            charge("r1", customer, 100_000, now.minus_days(10)),
            charge("r2", CustomerId::new(), 999_999, now.minus_days(10)),
        ];

        let clv = customer_lifetime_value(
            &events,
            customer,
            now,
            CurrencyCode::USD,
            ClvParams::default(),
        )
        .unwrap();

        assert_eq!(clv.historical_total, usd(100_000));
    }

    #[test]
    fn no_history_projects_zero() {
        let clv = customer_lifetime_value(
            &[],
            CustomerId::new(),
            Timestamp::now(),
            CurrencyCode::USD,
            ClvParams::default(),
        )
        .unwrap();

        assert!(clv.historical_total.is_zero());
        assert!(clv.projected_value.is_zero());
        assert_eq!(clv.tenure_months, 1);
    }
}
