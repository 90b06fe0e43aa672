//! Subscription aggregate entity.
//!
//! A Subscription binds one customer of one tenant to a tier at a price
//! snapshot. The snapshot is immutable for the life of the subscription
//! except through an explicit, logged proration (tier change); catalog
//! price edits never reach existing subscriptions.
//!
//! # Design Decisions
//!
//! - **Money in cents**: all monetary values are i64 minor units.
//! - **Optimistic concurrency**: `version` is compared-and-incremented by
//!   repositories, serializing transitions per subscription while leaving
//!   cross-subscription operations fully parallel.
//! - **No auto-cancel**: payment failure flags the subscription for
//!   dunning; cancellation is a policy decision made above this core.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CustomerId, DomainError, Money, StateMachine, SubscriptionId, TenantId, TenantScoped,
    TierId, Timestamp,
};

use super::proration::{prorate, Proration};
use super::{BillingCycle, SubscriptionStatus, Tier};

/// Free-trial window granted at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialWindow {
    /// Trial start.
    pub start: Timestamp,

    /// Trial end; the first renewal charge happens at or after this.
    pub end: Timestamp,
}

impl TrialWindow {
    /// Returns true if the given instant falls inside the trial.
    pub fn contains(&self, at: &Timestamp) -> bool {
        *at >= self.start && *at < self.end
    }
}

/// Subscription aggregate.
///
/// # Invariants
///
/// - At most one active subscription per (tenant, customer, tier family);
///   enforced by the repository at save time.
/// - `price` changes only through [`Subscription::change_tier`].
/// - Status transitions follow [`SubscriptionStatus`] machine rules; every
///   violation surfaces `InvalidStateTransition` with both states named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier.
    pub id: SubscriptionId,

    /// Owning tenant.
    pub tenant_id: TenantId,

    /// Paying customer within the tenant.
    pub customer_id: CustomerId,

    /// Tier at the time of creation or last tier change.
    pub tier_id: TierId,

    /// Tier family, for the one-active-per-family invariant.
    pub tier_family: String,

    /// Renewal cadence.
    pub billing_cycle: BillingCycle,

    /// Price snapshot per period.
    pub price: Money,

    /// Optional free-trial window.
    pub trial: Option<TrialWindow>,

    /// Lifecycle status.
    pub status: SubscriptionStatus,

    /// When a pause automatically ends, while paused.
    pub paused_until: Option<Timestamp>,

    /// When the subscription was canceled, once canceled.
    pub canceled_at: Option<Timestamp>,

    /// Caller-supplied cancellation reason tag.
    pub cancellation_reason: Option<String>,

    /// Current billing period start.
    pub current_period_start: Timestamp,

    /// Current billing period end; renewals are due at or after this.
    pub current_period_end: Timestamp,

    /// Set when the bounded payment-retry sequence is exhausted.
    pub flagged_for_dunning: bool,

    /// When the subscription was created.
    pub created_at: Timestamp,

    /// When the subscription was last updated.
    pub updated_at: Timestamp,

    /// Optimistic concurrency version.
    pub version: u64,
}

impl Subscription {
    /// Creates an active subscription with a price snapshot from the tier.
    ///
    /// # Errors
    ///
    /// Rejects a negative tier price. The caller (lifecycle handler) is
    /// responsible for verifying the customer belongs to the tenant and
    /// that no active subscription exists for the same tier family.
    pub fn create(
        id: SubscriptionId,
        tenant_id: TenantId,
        customer_id: CustomerId,
        tier: &Tier,
        billing_cycle: BillingCycle,
        trial: Option<TrialWindow>,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        let price = tier.price_for(billing_cycle);
        if price.is_negative() {
            return Err(DomainError::validation(
                "price",
                "subscription price cannot be negative",
            ));
        }

        Ok(Self {
            id,
            tenant_id,
            customer_id,
            tier_id: tier.id.clone(),
            tier_family: tier.family.clone(),
            billing_cycle,
            price,
            trial,
            status: SubscriptionStatus::Active,
            paused_until: None,
            canceled_at: None,
            cancellation_reason: None,
            current_period_start: now,
            current_period_end: now.add_days(billing_cycle.period_days()),
            flagged_for_dunning: false,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Changes the tier mid-cycle, returning the proration to bill.
    ///
    /// The price snapshot moves to the new tier's price; this is the only
    /// path that may change it. The caller records the returned proration
    /// as a Revenue Event; the aggregate itself never touches the ledger.
    ///
    /// # Errors
    ///
    /// `InvalidStateTransition` unless active; proration errors for
    /// malformed periods or mismatched currencies.
    pub fn change_tier(&mut self, new_tier: &Tier, now: Timestamp) -> Result<Proration, DomainError> {
        if self.status != SubscriptionStatus::Active {
            return Err(DomainError::invalid_transition(
                "subscription",
                self.status,
                SubscriptionStatus::Active,
            )
            .with_detail("operation", "change_tier"));
        }

        let total_days = self.billing_cycle.period_days();
        let remaining_days = now
            .whole_days_until(&self.current_period_end)
            .min(total_days);

        let new_price = new_tier.price_for(self.billing_cycle);
        let proration = prorate(&self.price, &new_price, remaining_days, total_days)?;

        self.tier_id = new_tier.id.clone();
        self.tier_family = new_tier.family.clone();
        self.price = new_price;
        self.updated_at = now;

        Ok(proration)
    }

    /// Pauses an active subscription until the given instant.
    ///
    /// No charges occur while paused; the billing cycle resumes the
    /// subscription automatically once `until` passes.
    pub fn pause(&mut self, until: Timestamp, now: Timestamp) -> Result<(), DomainError> {
        if until <= now {
            return Err(DomainError::validation(
                "paused_until",
                "pause must have a future expiry",
            ));
        }
        self.transition_to(SubscriptionStatus::Paused)?;
        self.paused_until = Some(until);
        self.updated_at = now;
        Ok(())
    }

    /// Explicitly resumes a paused subscription.
    ///
    /// The original price snapshot is untouched by pause/resume.
    pub fn resume(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Active)?;
        self.paused_until = None;
        self.updated_at = now;
        Ok(())
    }

    /// Resumes automatically if a pause has expired. Returns true if the
    /// subscription transitioned back to active.
    pub fn resume_if_pause_expired(&mut self, now: Timestamp) -> bool {
        if self.status == SubscriptionStatus::Paused {
            if let Some(until) = self.paused_until {
                if now >= until {
                    // Paused -> Active is always a valid transition.
                    return self.resume(now).is_ok();
                }
            }
        }
        false
    }

    /// Cancels the subscription with a reason tag. Terminal.
    ///
    /// Cancellation never deletes history: the aggregate and its revenue
    /// events remain queryable forever.
    pub fn cancel(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), DomainError> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(DomainError::validation(
                "reason",
                "cancellation requires a reason tag",
            ));
        }
        self.transition_to(SubscriptionStatus::Canceled)?;
        self.canceled_at = Some(now);
        self.cancellation_reason = Some(reason);
        self.paused_until = None;
        self.updated_at = now;
        Ok(())
    }

    /// Returns true if a renewal charge is due at `now`.
    ///
    /// Paused and canceled subscriptions are never due; a subscription
    /// still in its trial window is not due until the trial ends.
    pub fn is_due_for_renewal(&self, now: Timestamp) -> bool {
        if !self.status.is_billable() {
            return false;
        }
        if let Some(trial) = &self.trial {
            if trial.contains(&now) {
                return false;
            }
        }
        self.current_period_end <= now
    }

    /// Advances the billing period after a successful renewal charge.
    pub fn renew(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.status != SubscriptionStatus::Active {
            return Err(DomainError::invalid_transition(
                "subscription",
                self.status,
                SubscriptionStatus::Active,
            )
            .with_detail("operation", "renew"));
        }
        let period_days = self.billing_cycle.period_days();
        self.current_period_start = self.current_period_end;
        self.current_period_end = self.current_period_end.add_days(period_days);
        self.flagged_for_dunning = false;
        self.updated_at = now;
        Ok(())
    }

    /// Flags the subscription for dunning after retries are exhausted.
    pub fn flag_for_dunning(&mut self, now: Timestamp) {
        self.flagged_for_dunning = true;
        self.updated_at = now;
    }

    fn transition_to(&mut self, target: SubscriptionStatus) -> Result<(), DomainError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| DomainError::invalid_transition("subscription", self.status, target))?;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}

impl TenantScoped for Subscription {
    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::subscription::DEFAULT_CATALOG;

    fn tier(id: &str) -> Tier {
        DEFAULT_CATALOG
            .find(&TierId::new(id).unwrap())
            .unwrap()
            .clone()
    }

    fn active_subscription() -> Subscription {
        Subscription::create(
            SubscriptionId::new(),
            TenantId::new(),
            CustomerId::new(),
            &tier("course-basic"),
            BillingCycle::Monthly,
            None,
            Timestamp::now(),
        )
        .unwrap()
    }

    #[test]
    fn create_snapshots_tier_price() {
        let sub = active_subscription();
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.price, tier("course-basic").monthly_price);
        assert_eq!(sub.tier_family, "course");
        assert!(!sub.flagged_for_dunning);
    }

    #[test]
    fn create_sets_one_period() {
        let sub = active_subscription();
        assert_eq!(
            sub.current_period_start.whole_days_until(&sub.current_period_end),
            30
        );
    }

    #[test]
    fn change_tier_prorates_and_moves_snapshot() {
        let mut sub = active_subscription();
        // Rewind the period so exactly 20 whole days remain.
        let now = Timestamp::now();
        sub.current_period_start = now.minus_days(10);
        sub.current_period_end = now.add_days(20);

        let proration = sub.change_tier(&tier("course-pro"), now).unwrap();

        // (120000 - 50000) x 20/30 = 46667 cents.
        assert_eq!(proration.amount.amount_cents, 46_667);
        assert_eq!(sub.price, tier("course-pro").monthly_price);
        assert_eq!(sub.tier_id, TierId::new("course-pro").unwrap());
    }

    #[test]
    fn change_tier_rejected_while_paused() {
        let mut sub = active_subscription();
        let now = Timestamp::now();
        sub.pause(now.add_days(7), now).unwrap();

        let err = sub.change_tier(&tier("course-pro"), now).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn pause_requires_future_expiry() {
        let mut sub = active_subscription();
        let now = Timestamp::now();
        assert!(sub.pause(now.minus_days(1), now).is_err());
    }

    #[test]
    fn pause_then_resume_keeps_price() {
        let mut sub = active_subscription();
        let original_price = sub.price;
        let now = Timestamp::now();

        sub.pause(now.add_days(14), now).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Paused);

        sub.resume(now).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.price, original_price);
        assert!(sub.paused_until.is_none());
    }

    #[test]
    fn pause_auto_resumes_at_expiry() {
        let mut sub = active_subscription();
        let now = Timestamp::now();
        sub.pause(now.add_days(7), now).unwrap();

        assert!(!sub.resume_if_pause_expired(now.add_days(6)));
        assert_eq!(sub.status, SubscriptionStatus::Paused);

        assert!(sub.resume_if_pause_expired(now.add_days(7)));
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[test]
    fn cancel_requires_reason() {
        let mut sub = active_subscription();
        assert!(sub.cancel("  ", Timestamp::now()).is_err());
    }

    #[test]
    fn cancel_from_paused_is_allowed() {
        let mut sub = active_subscription();
        let now = Timestamp::now();
        sub.pause(now.add_days(7), now).unwrap();

        sub.cancel("seasonal-closure", now).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
        assert!(sub.canceled_at.is_some());
        assert_eq!(
            sub.cancellation_reason.as_deref(),
            Some("seasonal-closure")
        );
    }

    #[test]
    fn cancel_twice_is_invalid_transition() {
        let mut sub = active_subscription();
        let now = Timestamp::now();
        sub.cancel("churned", now).unwrap();

        let err = sub.cancel("churned-again", now).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert_eq!(
            err.details.get("current_state"),
            Some(&"Canceled".to_string())
        );
    }

    #[test]
    fn pause_after_cancel_is_rejected() {
        let mut sub = active_subscription();
        let now = Timestamp::now();
        sub.cancel("churned", now).unwrap();
        assert!(sub.pause(now.add_days(7), now).is_err());
    }

    #[test]
    fn renewal_due_only_after_period_end() {
        let mut sub = active_subscription();
        let now = Timestamp::now();
        assert!(!sub.is_due_for_renewal(now));

        sub.current_period_end = now.minus_days(1);
        assert!(sub.is_due_for_renewal(now));
    }

    #[test]
    fn paused_subscription_is_never_due() {
        let mut sub = active_subscription();
        let now = Timestamp::now();
        sub.current_period_end = now.minus_days(1);
        sub.pause(now.add_days(7), now).unwrap();
        assert!(!sub.is_due_for_renewal(now));
    }

    #[test]
    fn trial_defers_renewal() {
        let now = Timestamp::now();
        let mut sub = Subscription::create(
            SubscriptionId::new(),
            TenantId::new(),
            CustomerId::new(),
            &tier("course-basic"),
            BillingCycle::Monthly,
            Some(TrialWindow {
                start: now,
                end: now.add_days(60),
            }),
            now,
        )
        .unwrap();

        sub.current_period_end = now.minus_days(1);
        assert!(!sub.is_due_for_renewal(now));
        assert!(sub.is_due_for_renewal(now.add_days(61)));
    }

    #[test]
    fn renew_advances_period_and_clears_dunning() {
        let mut sub = active_subscription();
        let now = Timestamp::now();
        sub.flag_for_dunning(now);
        let old_end = sub.current_period_end;

        sub.renew(now).unwrap();
        assert_eq!(sub.current_period_start, old_end);
        assert_eq!(old_end.whole_days_until(&sub.current_period_end), 30);
        assert!(!sub.flagged_for_dunning);
    }
}
