//! In-memory subscription repository for testing and single-process use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, SubscriptionId, TenantId, Timestamp};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::SubscriptionRepository;

/// Deterministic in-memory implementation of `SubscriptionRepository`.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionRepository {
    subscriptions: Arc<RwLock<HashMap<SubscriptionId, Subscription>>>,
}

impl InMemorySubscriptionRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut subscriptions = self.subscriptions.write().await;

        // One live (non-canceled) subscription per (tenant, customer, family).
        let conflict = subscriptions.values().any(|s| {
            s.tenant_id == subscription.tenant_id
                && s.customer_id == subscription.customer_id
                && s.tier_family == subscription.tier_family
                && s.status != SubscriptionStatus::Canceled
        });
        if conflict {
            return Err(DomainError::new(
                ErrorCode::DuplicateSubscription,
                format!(
                    "Customer already has a live subscription in the '{}' family",
                    subscription.tier_family
                ),
            )
            .with_detail("tier_family", subscription.tier_family.clone()));
        }

        subscriptions.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut subscriptions = self.subscriptions.write().await;

        let stored = subscriptions.get(&subscription.id).ok_or_else(|| {
            DomainError::new(ErrorCode::SubscriptionNotFound, "Subscription not found")
                .with_detail("subscription_id", subscription.id.to_string())
        })?;

        if stored.version != subscription.version {
            return Err(DomainError::new(
                ErrorCode::StaleVersion,
                "Subscription was modified concurrently",
            )
            .with_detail("expected_version", subscription.version.to_string())
            .with_detail("stored_version", stored.version.to_string()));
        }

        let mut next = subscription.clone();
        next.version += 1;
        subscriptions.insert(next.id, next);
        Ok(())
    }

    async fn find_by_id(&self, id: SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.subscriptions.read().await.get(&id).cloned())
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<Subscription>, DomainError> {
        let mut list: Vec<Subscription> = self
            .subscriptions
            .read()
            .await
            .values()
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.to_string().cmp(&b.id.to_string())));
        Ok(list)
    }

    async fn list_by_customer(
        &self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<Vec<Subscription>, DomainError> {
        let mut list: Vec<Subscription> = self
            .subscriptions
            .read()
            .await
            .values()
            .filter(|s| s.tenant_id == tenant_id && s.customer_id == customer_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(list)
    }

    async fn list_due_for_renewal(&self, now: Timestamp) -> Result<Vec<Subscription>, DomainError> {
        let mut due: Vec<Subscription> = self
            .subscriptions
            .read()
            .await
            .values()
            .filter(|s| s.is_due_for_renewal(now))
            .cloned()
            .collect();
        // Stable processing order keeps billing-cycle reports reproducible.
        due.sort_by_key(|s| (s.current_period_end, s.id.to_string()));
        Ok(due)
    }

    async fn list_pause_expired(&self, now: Timestamp) -> Result<Vec<Subscription>, DomainError> {
        let mut expired: Vec<Subscription> = self
            .subscriptions
            .read()
            .await
            .values()
            .filter(|s| {
                s.status == SubscriptionStatus::Paused
                    && s.paused_until.map(|until| now >= until).unwrap_or(false)
            })
            .cloned()
            .collect();
        expired.sort_by_key(|s| s.id.to_string());
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TierId;
    use crate::domain::subscription::{BillingCycle, DEFAULT_CATALOG};

    fn subscription(tenant_id: TenantId, customer_id: CustomerId, tier: &str) -> Subscription {
        let tier = DEFAULT_CATALOG.find(&TierId::new(tier).unwrap()).unwrap();
        Subscription::create(
            SubscriptionId::new(),
            tenant_id,
            customer_id,
            tier,
            BillingCycle::Monthly,
            None,
            Timestamp::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_and_find_roundtrip() {
        let repo = InMemorySubscriptionRepository::new();
        let sub = subscription(TenantId::new(), CustomerId::new(), "course-basic");

        repo.save(&sub).await.unwrap();
        assert_eq!(repo.find_by_id(sub.id).await.unwrap(), Some(sub));
    }

    #[tokio::test]
    async fn second_live_subscription_in_family_is_rejected() {
        let repo = InMemorySubscriptionRepository::new();
        let tenant_id = TenantId::new();
        let customer_id = CustomerId::new();

        repo.save(&subscription(tenant_id, customer_id, "course-basic"))
            .await
            .unwrap();

        let err = repo
            .save(&subscription(tenant_id, customer_id, "course-pro"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateSubscription);
    }

    #[tokio::test]
    async fn canceled_subscription_frees_the_family() {
        let repo = InMemorySubscriptionRepository::new();
        let tenant_id = TenantId::new();
        let customer_id = CustomerId::new();

        let mut first = subscription(tenant_id, customer_id, "course-basic");
        first.cancel("downgrade", Timestamp::now()).unwrap();
        repo.save(&first).await.unwrap();

        repo.save(&subscription(tenant_id, customer_id, "course-basic"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn different_family_is_allowed_for_same_customer() {
        let repo = InMemorySubscriptionRepository::new();
        let tenant_id = TenantId::new();
        let customer_id = CustomerId::new();

        repo.save(&subscription(tenant_id, customer_id, "course-basic"))
            .await
            .unwrap();
        repo.save(&subscription(tenant_id, customer_id, "player-plus"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stale_update_is_rejected() {
        let repo = InMemorySubscriptionRepository::new();
        let mut sub = subscription(TenantId::new(), CustomerId::new(), "course-basic");
        repo.save(&sub).await.unwrap();

        sub.pause(Timestamp::now().add_days(7), Timestamp::now())
            .unwrap();
        repo.update(&sub).await.unwrap();

        let err = repo.update(&sub).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StaleVersion);
    }

    #[tokio::test]
    async fn due_list_contains_only_due_subscriptions() {
        let repo = InMemorySubscriptionRepository::new();
        let now = Timestamp::now();

        let mut due = subscription(TenantId::new(), CustomerId::new(), "course-basic");
        due.current_period_end = now.minus_days(1);
        repo.save(&due).await.unwrap();

        let current = subscription(TenantId::new(), CustomerId::new(), "course-basic");
        repo.save(&current).await.unwrap();

        let listed = repo.list_due_for_renewal(now).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, due.id);
    }

    #[tokio::test]
    async fn pause_expired_list_finds_expired_pauses() {
        let repo = InMemorySubscriptionRepository::new();
        let now = Timestamp::now();

        let mut expired = subscription(TenantId::new(), CustomerId::new(), "course-basic");
        expired.pause(now.plus_secs(60), now).unwrap();
        repo.save(&expired).await.unwrap();

        assert!(repo.list_pause_expired(now).await.unwrap().is_empty());
        let later = now.plus_secs(61);
        let listed = repo.list_pause_expired(later).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, expired.id);
    }
}
