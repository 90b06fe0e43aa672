//! Subscription tier catalog.
//!
//! Tiers carry pricing, included quotas, and overage rates. Subscriptions
//! snapshot the tier price at creation: editing the catalog never
//! retroactively changes an existing subscription.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CurrencyCode, Money, TierId};
use crate::domain::usage::{IncludedQuotas, OverageRates};

/// How often a subscription renews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Annual,
}

impl BillingCycle {
    /// Length of one billing period in days.
    ///
    /// Months are normalized to 30 days for period arithmetic, matching
    /// how proration denominates "days in cycle".
    pub fn period_days(&self) -> i64 {
        match self {
            BillingCycle::Monthly => 30,
            BillingCycle::Annual => 365,
        }
    }
}

/// One entry in the tier catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// Catalog identifier (e.g. `"course-pro"`).
    pub id: TierId,

    /// Tier family: at most one active subscription per
    /// (tenant, customer, family). Upgrades move within a family.
    pub family: String,

    /// Marketing name.
    pub display_name: String,

    /// Price per monthly period.
    pub monthly_price: Money,

    /// Price per annual period.
    pub annual_price: Money,

    /// One-time setup fee charged at subscription creation.
    pub setup_fee: Money,

    /// Included allowances per billing period.
    pub included: IncludedQuotas,

    /// Per-unit overage rates beyond the included allowances.
    pub overage: OverageRates,
}

impl Tier {
    /// Price for the given billing cycle.
    pub fn price_for(&self, cycle: BillingCycle) -> Money {
        match cycle {
            BillingCycle::Monthly => self.monthly_price,
            BillingCycle::Annual => self.annual_price,
        }
    }
}

/// The tier catalog: lookup by id, listing by family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierCatalog {
    tiers: Vec<Tier>,
}

impl TierCatalog {
    /// Builds a catalog from a tier list.
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self { tiers }
    }

    /// Finds a tier by id.
    pub fn find(&self, id: &TierId) -> Option<&Tier> {
        self.tiers.iter().find(|t| &t.id == id)
    }

    /// All tiers in a family.
    pub fn family(&self, family: &str) -> Vec<&Tier> {
        self.tiers.iter().filter(|t| t.family == family).collect()
    }

    /// All tiers.
    pub fn all(&self) -> &[Tier] {
        &self.tiers
    }
}

fn usd(cents: i64) -> Money {
    Money::from_cents(cents, CurrencyCode::USD)
}

fn tier(
    id: &str,
    family: &str,
    name: &str,
    monthly_cents: i64,
    annual_cents: i64,
    setup_cents: i64,
    included: IncludedQuotas,
    overage: OverageRates,
) -> Tier {
    Tier {
        id: TierId::new(id).expect("static tier id"),
        family: family.to_string(),
        display_name: name.to_string(),
        monthly_price: usd(monthly_cents),
        annual_price: usd(annual_cents),
        setup_fee: usd(setup_cents),
        included,
        overage,
    }
}

/// The default platform catalog.
///
/// Consumer golfers, single courses, and enterprise chains each form a
/// tier family; white-label and API access ride on the course/enterprise
/// families as feature flags rather than separate tiers.
pub static DEFAULT_CATALOG: Lazy<TierCatalog> = Lazy::new(|| {
    let gib = 1u64 << 30;
    TierCatalog::new(vec![
        tier(
            "player-basic",
            "player",
            "Player Basic",
            0,
            0,
            0,
            IncludedQuotas {
                api_calls: 10_000,
                storage_bytes: gib,
                bandwidth_bytes: 5 * gib,
            },
            OverageRates::free(CurrencyCode::USD),
        ),
        tier(
            "player-plus",
            "player",
            "Player Plus",
            999,
            9_990,
            0,
            IncludedQuotas {
                api_calls: 100_000,
                storage_bytes: 10 * gib,
                bandwidth_bytes: 50 * gib,
            },
            OverageRates::free(CurrencyCode::USD),
        ),
        tier(
            "course-basic",
            "course",
            "Course Basic",
            50_000,
            500_000,
            50_000,
            IncludedQuotas {
                api_calls: 1_000,
                storage_bytes: 50 * gib,
                bandwidth_bytes: 200 * gib,
            },
            OverageRates {
                per_api_call: usd(1),
                per_storage_gib: usd(20),
                per_bandwidth_gib: usd(9),
            },
        ),
        tier(
            "course-pro",
            "course",
            "Course Pro",
            120_000,
            1_200_000,
            50_000,
            IncludedQuotas {
                api_calls: 5_000_000,
                storage_bytes: 250 * gib,
                bandwidth_bytes: 1_000 * gib,
            },
            OverageRates {
                per_api_call: usd(1),
                per_storage_gib: usd(15),
                per_bandwidth_gib: usd(7),
            },
        ),
        tier(
            "enterprise-chain",
            "enterprise",
            "Enterprise Chain",
            150_000,
            1_500_000,
            100_000,
            IncludedQuotas {
                api_calls: 50_000_000,
                storage_bytes: 1_024 * gib,
                bandwidth_bytes: 10_240 * gib,
            },
            OverageRates {
                per_api_call: usd(1),
                per_storage_gib: usd(10),
                per_bandwidth_gib: usd(5),
            },
        ),
    ])
});
