//! Mid-cycle tier change proration.
//!
//! A tier change bills the price delta for the unused remainder of the
//! current period, never a full new charge:
//!
//! `prorated = (new_price - old_price) x remaining_days / total_days`
//!
//! rounded half-even to the currency's minor unit. Upgrades produce a
//! positive charge; downgrades a negative credit.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, Money};

/// Result of a proration computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proration {
    /// Full-period price difference (new minus old).
    pub delta_per_period: Money,

    /// Whole days remaining in the current period at change time.
    pub remaining_days: i64,

    /// Total days in the current period.
    pub total_days: i64,

    /// The prorated amount to charge (positive) or credit (negative).
    pub amount: Money,
}

/// Computes the prorated delta for a mid-cycle price change.
///
/// # Errors
///
/// Returns an error for mismatched currencies, a non-positive period
/// length, or remaining days outside `[0, total_days]`.
pub fn prorate(
    old_price: &Money,
    new_price: &Money,
    remaining_days: i64,
    total_days: i64,
) -> Result<Proration, DomainError> {
    if total_days <= 0 {
        return Err(DomainError::validation(
            "total_days",
            "billing period must be at least one day",
        ));
    }
    if remaining_days < 0 || remaining_days > total_days {
        return Err(DomainError::validation(
            "remaining_days",
            format!(
                "remaining days {} outside period of {} days",
                remaining_days, total_days
            ),
        ));
    }

    let delta = new_price.checked_add(&old_price.negated())?;
    let amount = delta.mul_ratio_half_even(remaining_days, total_days)?;

    Ok(Proration {
        delta_per_period: delta,
        remaining_days,
        total_days,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::CurrencyCode;

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, CurrencyCode::USD)
    }

    // The spec's worked example: $500 -> $1200, 10 days into a 30-day
    // cycle, leaves 20 remaining days: (1200-500) x 20/30 = $466.67.
    #[test]
    fn upgrade_twenty_of_thirty_days_remaining() {
        let result = prorate(&usd(50_000), &usd(120_000), 20, 30).unwrap();

        assert_eq!(result.delta_per_period, usd(70_000));
        assert_eq!(result.amount, usd(46_667));
    }

    #[test]
    fn downgrade_produces_negative_credit() {
        let result = prorate(&usd(120_000), &usd(50_000), 20, 30).unwrap();
        assert_eq!(result.amount, usd(-46_667));
        assert!(result.amount.is_negative());
    }

    #[test]
    fn change_on_last_day_bills_nothing() {
        let result = prorate(&usd(50_000), &usd(120_000), 0, 30).unwrap();
        assert!(result.amount.is_zero());
    }

    #[test]
    fn change_on_first_day_bills_full_delta() {
        let result = prorate(&usd(50_000), &usd(120_000), 30, 30).unwrap();
        assert_eq!(result.amount, usd(70_000));
    }

    #[test]
    fn rejects_remaining_days_beyond_period() {
        assert!(prorate(&usd(100), &usd(200), 31, 30).is_err());
        assert!(prorate(&usd(100), &usd(200), -1, 30).is_err());
    }

    #[test]
    fn rejects_empty_period() {
        assert!(prorate(&usd(100), &usd(200), 0, 0).is_err());
    }

    #[test]
    fn rejects_currency_mismatch() {
        let eur = Money::from_cents(100, CurrencyCode::new("EUR").unwrap());
        assert!(prorate(&usd(100), &eur, 10, 30).is_err());
    }
}
