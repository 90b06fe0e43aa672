//! Period revenue metrics as a pure reduction over the event log.
//!
//! Nothing here holds state: every figure is recomputable from the raw
//! event sequence alone, so reports can never drift from the ledger.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::foundation::{CurrencyCode, CustomerId, DomainError, Money, Timestamp};
use crate::domain::revenue::{RevenueEvent, RevenueStream};

/// Half-open reporting window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingPeriod {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl ReportingPeriod {
    /// Creates a period, validating ordering.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, DomainError> {
        if end <= start {
            return Err(DomainError::validation(
                "period",
                "period end must be after start",
            ));
        }
        Ok(Self { start, end })
    }

    /// The trailing `days` ending at `end`.
    pub fn trailing_days(end: Timestamp, days: i64) -> Self {
        Self {
            start: end.minus_days(days),
            end,
        }
    }

    /// Returns true if the instant falls inside the window.
    pub fn contains(&self, at: &Timestamp) -> bool {
        *at >= self.start && *at < self.end
    }
}

/// Revenue attributed per product stream; a typed breakdown, so the
/// aggregator's contract is statically checkable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamBreakdown {
    pub consumer: Money,
    pub white_label: Money,
    pub analytics: Money,
    pub api: Money,
}

impl StreamBreakdown {
    fn zero(currency: CurrencyCode) -> Self {
        Self {
            consumer: Money::zero(currency),
            white_label: Money::zero(currency),
            analytics: Money::zero(currency),
            api: Money::zero(currency),
        }
    }

    fn slot(&mut self, stream: RevenueStream) -> &mut Money {
        match stream {
            RevenueStream::Consumer => &mut self.consumer,
            RevenueStream::WhiteLabel => &mut self.white_label,
            RevenueStream::Analytics => &mut self.analytics,
            RevenueStream::Api => &mut self.api,
        }
    }
}

/// Reduced revenue figures for one period and currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueMetrics {
    /// The window the figures cover.
    pub period: ReportingPeriod,

    /// Sum of all event amounts in the window (refunds subtract).
    pub total_revenue: Money,

    /// Sum of subscription-created and subscription-renewed amounts.
    pub recurring_revenue: Money,

    /// Distinct customers linked to any event in the window.
    pub customer_count: u64,

    /// Average revenue per customer: total / customers, half-even.
    pub arpu: Money,

    /// Revenue attributed per product stream.
    pub by_stream: StreamBreakdown,
}

/// Reduces an event slice into period metrics for one currency.
///
/// Events outside the window or in another currency are ignored. Events
/// are deduplicated by id before reduction, so feeding an
/// already-idempotent ledger slice or a raw replay with duplicates
/// produces identical figures.
pub fn compute_metrics(
    events: &[RevenueEvent],
    period: ReportingPeriod,
    currency: CurrencyCode,
) -> Result<RevenueMetrics, DomainError> {
    // Dedupe by id; BTreeMap gives a deterministic reduction order.
    let mut unique: BTreeMap<&str, &RevenueEvent> = BTreeMap::new();
    for event in events {
        if event.amount.currency == currency && period.contains(&event.occurred_at) {
            unique.entry(event.id.as_str()).or_insert(event);
        }
    }

    let mut total = Money::zero(currency);
    let mut recurring = Money::zero(currency);
    let mut by_stream = StreamBreakdown::zero(currency);
    let mut customers: BTreeSet<CustomerId> = BTreeSet::new();

    for event in unique.values() {
        total = total.checked_add(&event.amount)?;
        if event.event_type.is_recurring() {
            recurring = recurring.checked_add(&event.amount)?;
        }
        let slot = by_stream.slot(event.stream());
        *slot = slot.checked_add(&event.amount)?;
        if let Some(customer_id) = event.customer_id {
            customers.insert(customer_id);
        }
    }

    let customer_count = customers.len() as u64;
    let arpu = if customer_count == 0 {
        Money::zero(currency)
    } else {
        total.mul_ratio_half_even(1, customer_count as i64)?
    };

    Ok(RevenueMetrics {
        period,
        total_revenue: total,
        recurring_revenue: recurring,
        customer_count,
        arpu,
        by_stream,
    })
}

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_test;
