//! Quota types, included allowances, and overage pricing.
//!
//! Overage is computed per quota type at period close:
//! `overage_units = max(0, actual - included)`, `amount = units x rate`,
//! then summed across quota types. Units are the quota's native unit:
//! API calls bill per call; storage and bandwidth bill per GiB started
//! beyond the included bytes.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CurrencyCode, Money, ValidationError};

const GIB: u64 = 1 << 30;

/// The quota dimensions a tenant is metered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaType {
    /// API calls per billing period.
    ApiCalls,

    /// Stored bytes.
    StorageBytes,

    /// Transferred bytes per billing period.
    BandwidthBytes,
}

impl QuotaType {
    /// All quota types, in billing order.
    pub const ALL: [QuotaType; 3] = [
        QuotaType::ApiCalls,
        QuotaType::StorageBytes,
        QuotaType::BandwidthBytes,
    ];

    /// Stable string form used in metadata and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaType::ApiCalls => "api_calls",
            QuotaType::StorageBytes => "storage_bytes",
            QuotaType::BandwidthBytes => "bandwidth_bytes",
        }
    }
}

impl std::fmt::Display for QuotaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Included allowances for a billing period, by quota type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludedQuotas {
    /// Included API calls per period.
    pub api_calls: u64,

    /// Included stored bytes.
    pub storage_bytes: u64,

    /// Included transferred bytes per period.
    pub bandwidth_bytes: u64,
}

impl IncludedQuotas {
    /// Returns the included allowance for a quota type, in native units.
    pub fn included(&self, quota: QuotaType) -> u64 {
        match quota {
            QuotaType::ApiCalls => self.api_calls,
            QuotaType::StorageBytes => self.storage_bytes,
            QuotaType::BandwidthBytes => self.bandwidth_bytes,
        }
    }
}

/// Per-unit overage rates, by quota type.
///
/// API calls are priced per call; storage and bandwidth per started GiB
/// beyond the included bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverageRates {
    /// Price per API call beyond the included quota.
    pub per_api_call: Money,

    /// Price per started GiB stored beyond the included quota.
    pub per_storage_gib: Money,

    /// Price per started GiB transferred beyond the included quota.
    pub per_bandwidth_gib: Money,
}

impl OverageRates {
    /// Zero rates (no overage billing), used by trial tiers.
    pub fn free(currency: CurrencyCode) -> Self {
        Self {
            per_api_call: Money::zero(currency),
            per_storage_gib: Money::zero(currency),
            per_bandwidth_gib: Money::zero(currency),
        }
    }

    /// Returns the per-unit rate for a quota type.
    pub fn rate(&self, quota: QuotaType) -> Money {
        match quota {
            QuotaType::ApiCalls => self.per_api_call,
            QuotaType::StorageBytes => self.per_storage_gib,
            QuotaType::BandwidthBytes => self.per_bandwidth_gib,
        }
    }
}

/// Actual consumption for a billing period, in native units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodUsage {
    /// API calls made in the period.
    pub api_calls: u64,

    /// Peak stored bytes during the period.
    pub storage_bytes: u64,

    /// Bytes transferred in the period.
    pub bandwidth_bytes: u64,
}

impl PeriodUsage {
    /// Returns actual consumption for a quota type.
    pub fn actual(&self, quota: QuotaType) -> u64 {
        match quota {
            QuotaType::ApiCalls => self.api_calls,
            QuotaType::StorageBytes => self.storage_bytes,
            QuotaType::BandwidthBytes => self.bandwidth_bytes,
        }
    }
}

/// One quota type's overage for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverageLine {
    /// Which quota overran.
    pub quota: QuotaType,

    /// Billable units beyond the included allowance.
    pub units: u64,

    /// Per-unit rate applied.
    pub rate: Money,

    /// `units x rate`.
    pub amount: Money,
}

/// Quota standing reported by `check_quota`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    /// False once consumption exceeds the included allowance.
    pub within_limit: bool,

    /// Units consumed so far.
    pub used: u64,

    /// Included allowance.
    pub limit: u64,
}

impl QuotaStatus {
    /// Builds a status from used/limit counters.
    pub fn from_counts(used: u64, limit: u64) -> Self {
        Self {
            within_limit: used <= limit,
            used,
            limit,
        }
    }
}

/// Converts raw over-quota consumption into billable units.
fn billable_units(quota: QuotaType, over: u64) -> u64 {
    match quota {
        QuotaType::ApiCalls => over,
        // Storage and bandwidth bill per started GiB.
        QuotaType::StorageBytes | QuotaType::BandwidthBytes => over.div_ceil(GIB),
    }
}

/// Computes the overage lines for a period, one per overrun quota type.
///
/// Quota types with no overrun produce no line. The total is the sum of
/// line amounts; an empty result means no usage charge this period.
pub fn compute_overage(
    usage: &PeriodUsage,
    included: &IncludedQuotas,
    rates: &OverageRates,
) -> Result<Vec<OverageLine>, ValidationError> {
    let mut lines = Vec::new();

    for quota in QuotaType::ALL {
        let over = usage.actual(quota).saturating_sub(included.included(quota));
        if over == 0 {
            continue;
        }

        let units = billable_units(quota, over);
        let rate = rates.rate(quota);
        let amount = rate.mul_ratio_half_even(i64::try_from(units).map_err(|_| {
            ValidationError::invalid_format("overage_units", "unit count exceeds i64")
        })?, 1)?;

        if amount.is_zero() {
            continue;
        }
        lines.push(OverageLine {
            quota,
            units,
            rate,
            amount,
        });
    }

    Ok(lines)
}

/// Sums overage line amounts in the given currency.
pub fn overage_total(
    lines: &[OverageLine],
    currency: CurrencyCode,
) -> Result<Money, ValidationError> {
    let mut total = Money::zero(currency);
    for line in lines {
        total = total.checked_add(&line.amount)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, CurrencyCode::USD)
    }

    fn one_cent_per_call() -> OverageRates {
        OverageRates {
            per_api_call: usd(1),
            per_storage_gib: usd(10),
            per_bandwidth_gib: usd(9),
        }
    }

    fn thousand_calls_included() -> IncludedQuotas {
        IncludedQuotas {
            api_calls: 1_000,
            storage_bytes: 10 * (1 << 30),
            bandwidth_bytes: 10 * (1 << 30),
        }
    }

    // The spec's worked example: 1,500 calls against 1,000 included at
    // $0.01/call is exactly $5.00 of overage.
    #[test]
    fn overage_matches_quota_example() {
        let usage = PeriodUsage {
            api_calls: 1_500,
            ..Default::default()
        };

        let lines =
            compute_overage(&usage, &thousand_calls_included(), &one_cent_per_call()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quota, QuotaType::ApiCalls);
        assert_eq!(lines[0].units, 500);
        assert_eq!(lines[0].amount, usd(500));

        let total = overage_total(&lines, CurrencyCode::USD).unwrap();
        assert_eq!(total, usd(500));
    }

    #[test]
    fn no_lines_when_within_quota() {
        let usage = PeriodUsage {
            api_calls: 999,
            ..Default::default()
        };
        let lines =
            compute_overage(&usage, &thousand_calls_included(), &one_cent_per_call()).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn storage_bills_per_started_gib() {
        let included = thousand_calls_included();
        let usage = PeriodUsage {
            storage_bytes: included.storage_bytes + 1, // one byte over
            ..Default::default()
        };

        let lines = compute_overage(&usage, &included, &one_cent_per_call()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quota, QuotaType::StorageBytes);
        assert_eq!(lines[0].units, 1);
        assert_eq!(lines[0].amount, usd(10));
    }

    #[test]
    fn multiple_overruns_sum_across_quota_types() {
        let included = thousand_calls_included();
        let usage = PeriodUsage {
            api_calls: 1_100,
            bandwidth_bytes: included.bandwidth_bytes + 3 * (1 << 30),
            ..Default::default()
        };

        let lines = compute_overage(&usage, &included, &one_cent_per_call()).unwrap();
        assert_eq!(lines.len(), 2);

        let total = overage_total(&lines, CurrencyCode::USD).unwrap();
        // 100 calls x $0.01 + 3 GiB x $0.09
        assert_eq!(total, usd(100 + 27));
    }

    #[test]
    fn zero_rates_produce_no_lines() {
        let usage = PeriodUsage {
            api_calls: 5_000,
            ..Default::default()
        };
        let lines = compute_overage(
            &usage,
            &thousand_calls_included(),
            &OverageRates::free(CurrencyCode::USD),
        )
        .unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn quota_status_flips_past_limit() {
        assert!(QuotaStatus::from_counts(1_000, 1_000).within_limit);
        let status = QuotaStatus::from_counts(1_001, 1_000);
        assert!(!status.within_limit);
        assert_eq!(status.used, 1_001);
        assert_eq!(status.limit, 1_000);
    }
}
