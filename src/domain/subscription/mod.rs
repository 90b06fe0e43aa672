//! Subscription domain - lifecycle, tier catalog, and proration.

mod aggregate;
mod proration;
mod status;
mod tier;

pub use aggregate::{Subscription, TrialWindow};
pub use proration::{prorate, Proration};
pub use status::SubscriptionStatus;
pub use tier::{BillingCycle, Tier, TierCatalog, DEFAULT_CATALOG};
