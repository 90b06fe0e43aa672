//! Bounded revenue forecast.
//!
//! The forecast applies the period-over-period MRR growth rate to current
//! MRR, compounding per projected period. The growth rate is clamped
//! before projection so a short or noisy historical window cannot send
//! the forecast diverging. Integer arithmetic throughout; half-even
//! rounding per step.

use serde::Serialize;

use crate::domain::foundation::{DomainError, Money};

/// Tunables for the forecast.
#[derive(Debug, Clone, Copy)]
pub struct ForecastParams {
    /// Growth clamp in permille per period (500 = +/-50%).
    pub max_growth_permille: i64,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            max_growth_permille: 500,
        }
    }
}

/// Forecast reduction result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueForecast {
    /// Observed growth rate in permille, after clamping.
    pub growth_permille: i64,

    /// Projected MRR per future period, one entry per period ahead.
    pub projected: Vec<Money>,
}

/// Projects MRR forward from two observed periods.
///
/// `previous` and `current` are the MRR of the last two closed periods.
/// With no previous-period revenue the growth rate is taken as zero
/// rather than infinite.
pub fn forecast_mrr(
    previous: Money,
    current: Money,
    periods_ahead: u32,
    params: ForecastParams,
) -> Result<RevenueForecast, DomainError> {
    if previous.currency != current.currency {
        return Err(DomainError::validation(
            "currency",
            "forecast inputs must share a currency",
        ));
    }

    let growth_permille = if previous.is_zero() {
        0
    } else {
        let delta = current.amount_cents as i128 - previous.amount_cents as i128;
        let raw = delta * 1_000 / previous.amount_cents.abs() as i128;
        (raw as i64).clamp(-params.max_growth_permille, params.max_growth_permille)
    };

    let mut projected = Vec::with_capacity(periods_ahead as usize);
    let mut mrr = current;
    for _ in 0..periods_ahead {
        mrr = mrr.mul_ratio_half_even(1_000 + growth_permille, 1_000)?;
        projected.push(mrr);
    }

    Ok(RevenueForecast {
        growth_permille,
        projected,
    })
}

#[cfg(test)]
#[path = "forecast_test.rs"]
mod forecast_test;
