//! ChangeTierHandler - Command handler for mid-cycle upgrades/downgrades.

use std::sync::Arc;

use crate::domain::foundation::{
    DomainError, ErrorCode, RevenueEventId, SubscriptionId, TierId, Timestamp,
};
use crate::domain::revenue::{EventSource, RevenueEvent, RevenueEventType};
use crate::domain::subscription::{Proration, Subscription, TierCatalog};
use crate::ports::{RevenueLedger, SubscriptionRepository};

/// Command to change a subscription's tier mid-cycle.
#[derive(Debug, Clone)]
pub struct ChangeTierCommand {
    pub subscription_id: SubscriptionId,
    pub new_tier_id: TierId,
}

/// Result of a tier change.
#[derive(Debug, Clone)]
pub struct ChangeTierResult {
    pub subscription: Subscription,
    pub proration: Proration,
    /// The prorated revenue event, when the delta was non-zero.
    pub recorded_event: Option<RevenueEvent>,
}

/// Handler for tier changes.
///
/// Emits a Revenue Event for the prorated delta only; upgrades append a
/// positive add-on charge, downgrades a negative refund credit. This is
/// the single logged path through which a price snapshot may change.
pub struct ChangeTierHandler {
    subscription_repository: Arc<dyn SubscriptionRepository>,
    revenue_ledger: Arc<dyn RevenueLedger>,
    catalog: Arc<TierCatalog>,
}

impl ChangeTierHandler {
    pub fn new(
        subscription_repository: Arc<dyn SubscriptionRepository>,
        revenue_ledger: Arc<dyn RevenueLedger>,
        catalog: Arc<TierCatalog>,
    ) -> Self {
        Self {
            subscription_repository,
            revenue_ledger,
            catalog,
        }
    }

    pub async fn handle(&self, cmd: ChangeTierCommand) -> Result<ChangeTierResult, DomainError> {
        let mut subscription = self
            .subscription_repository
            .find_by_id(cmd.subscription_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::SubscriptionNotFound, "Subscription not found")
                    .with_detail("subscription_id", cmd.subscription_id.to_string())
            })?;

        let new_tier = self.catalog.find(&cmd.new_tier_id).ok_or_else(|| {
            DomainError::new(ErrorCode::TierNotFound, "Tier not in catalog")
                .with_detail("tier_id", cmd.new_tier_id.to_string())
        })?;

        let now = Timestamp::now();
        let old_tier_id = subscription.tier_id.clone();
        let proration = subscription.change_tier(new_tier, now)?;

        // The version in the event id pins this change: a concurrent
        // change on the same subscription fails the update below and
        // never records its event.
        let event_id = RevenueEventId::new(format!(
            "proration-{}-v{}",
            subscription.id, subscription.version
        ))?;

        self.subscription_repository.update(&subscription).await?;

        let recorded_event = if proration.amount.is_zero() {
            None
        } else {
            let (event_type, amount) = if proration.amount.is_negative() {
                (RevenueEventType::Refund, proration.amount)
            } else {
                (RevenueEventType::AddOnPurchase, proration.amount)
            };

            let event = RevenueEvent::new(
                event_id,
                subscription.tenant_id,
                event_type,
                amount,
                now,
                EventSource::Internal,
            )?
            .with_subscription(subscription.id)
            .with_customer(subscription.customer_id)
            .with_metadata("proration", "tier_change")
            .with_metadata("old_tier_id", old_tier_id.as_str())
            .with_metadata("new_tier_id", new_tier.id.as_str())
            .with_metadata("remaining_days", proration.remaining_days.to_string())
            .with_metadata("total_days", proration.total_days.to_string());

            self.revenue_ledger.record(event.clone()).await?;
            Some(event)
        };

        tracing::info!(
            subscription_id = %subscription.id,
            old_tier = %old_tier_id,
            new_tier = %new_tier.id,
            prorated_cents = proration.amount.amount_cents,
            "subscription tier changed"
        );
        Ok(ChangeTierResult {
            subscription,
            proration,
            recorded_event,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryRevenueLedger, InMemorySubscriptionRepository};
    use crate::domain::foundation::{CustomerId, TenantId};
    use crate::domain::subscription::{BillingCycle, DEFAULT_CATALOG};
    use crate::ports::EventFilter;

    async fn fixture_with_sub(
        days_remaining: i64,
    ) -> (
        ChangeTierHandler,
        Arc<InMemoryRevenueLedger>,
        Subscription,
    ) {
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let ledger = Arc::new(InMemoryRevenueLedger::new());

        let tier = DEFAULT_CATALOG
            .find(&TierId::new("course-basic").unwrap())
            .unwrap();
        let now = Timestamp::now();
        let mut sub = Subscription::create(
            SubscriptionId::new(),
            TenantId::new(),
            CustomerId::new(),
            tier,
            BillingCycle::Monthly,
            None,
            now,
        )
        .unwrap();
        // Pad the period end by an hour so the handler's own clock read
        // still sees `days_remaining` whole days.
        sub.current_period_start = now.minus_days(30 - days_remaining).plus_secs(3_600);
        sub.current_period_end = now.add_days(days_remaining).plus_secs(3_600);
        subscriptions.save(&sub).await.unwrap();

        let handler = ChangeTierHandler::new(
            subscriptions,
            ledger.clone(),
            Arc::new(DEFAULT_CATALOG.clone()),
        );
        (handler, ledger, sub)
    }

    #[tokio::test]
    async fn upgrade_records_prorated_add_on_charge() {
        let (handler, ledger, sub) = fixture_with_sub(20).await;

        let result = handler
            .handle(ChangeTierCommand {
                subscription_id: sub.id,
                new_tier_id: TierId::new("course-pro").unwrap(),
            })
            .await
            .unwrap();

        // ($1200 - $500) x 20/30 = $466.67.
        assert_eq!(result.proration.amount.amount_cents, 46_667);

        let events = ledger
            .events_for(EventFilter::for_tenant(sub.tenant_id))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, RevenueEventType::AddOnPurchase);
        assert_eq!(events[0].amount.amount_cents, 46_667);
        assert_eq!(
            events[0].metadata.get("old_tier_id").map(String::as_str),
            Some("course-basic")
        );
    }

    #[tokio::test]
    async fn downgrade_records_negative_refund_credit() {
        let (handler, ledger, sub) = fixture_with_sub(20).await;

        // Move up first, then back down.
        handler
            .handle(ChangeTierCommand {
                subscription_id: sub.id,
                new_tier_id: TierId::new("course-pro").unwrap(),
            })
            .await
            .unwrap();
        let result = handler
            .handle(ChangeTierCommand {
                subscription_id: sub.id,
                new_tier_id: TierId::new("course-basic").unwrap(),
            })
            .await
            .unwrap();

        assert!(result.proration.amount.is_negative());
        assert_eq!(
            result.recorded_event.as_ref().unwrap().event_type,
            RevenueEventType::Refund
        );

        let events = ledger
            .events_for(EventFilter::for_tenant(sub.tenant_id))
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn price_snapshot_moves_with_the_change() {
        let (handler, _ledger, sub) = fixture_with_sub(20).await;

        let result = handler
            .handle(ChangeTierCommand {
                subscription_id: sub.id,
                new_tier_id: TierId::new("course-pro").unwrap(),
            })
            .await
            .unwrap();

        let pro = DEFAULT_CATALOG
            .find(&TierId::new("course-pro").unwrap())
            .unwrap();
        assert_eq!(result.subscription.price, pro.monthly_price);
    }

    #[tokio::test]
    async fn unknown_tier_is_rejected_without_changes() {
        let (handler, ledger, sub) = fixture_with_sub(20).await;

        let err = handler
            .handle(ChangeTierCommand {
                subscription_id: sub.id,
                new_tier_id: TierId::new("country-club-legend").unwrap(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::TierNotFound);
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn missing_subscription_is_not_found() {
        let (handler, _ledger, _sub) = fixture_with_sub(20).await;
        let err = handler
            .handle(ChangeTierCommand {
                subscription_id: SubscriptionId::new(),
                new_tier_id: TierId::new("course-pro").unwrap(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
    }
}
