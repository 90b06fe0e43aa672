//! SubscriptionRepository port - persistence for the lifecycle manager.

use async_trait::async_trait;

use crate::domain::foundation::{CustomerId, DomainError, SubscriptionId, TenantId, Timestamp};
use crate::domain::subscription::Subscription;

/// Port for subscription persistence.
///
/// Implementations enforce:
/// - at most one active subscription per (tenant, customer, tier family)
///   at save time (`DuplicateSubscription`),
/// - optimistic concurrency on update (`StaleVersion`), which serializes
///   transitions per subscription while cross-subscription operations
///   proceed in parallel.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Persists a new subscription.
    ///
    /// # Errors
    ///
    /// `DuplicateSubscription` when an active subscription already exists
    /// for the same (tenant, customer, tier family).
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Updates an existing subscription with an optimistic version check.
    ///
    /// # Errors
    ///
    /// `SubscriptionNotFound` if absent; `StaleVersion` on conflict.
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Finds a subscription by id.
    async fn find_by_id(&self, id: SubscriptionId) -> Result<Option<Subscription>, DomainError>;

    /// Lists a tenant's subscriptions, all statuses.
    async fn list_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<Subscription>, DomainError>;

    /// Lists a customer's subscriptions within a tenant.
    async fn list_by_customer(
        &self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<Vec<Subscription>, DomainError>;

    /// Lists subscriptions due for renewal at the given instant, across
    /// all tenants. The billing cycle's work queue.
    async fn list_due_for_renewal(&self, now: Timestamp) -> Result<Vec<Subscription>, DomainError>;

    /// Lists paused subscriptions whose pause has expired at `now`.
    async fn list_pause_expired(&self, now: Timestamp) -> Result<Vec<Subscription>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SubscriptionRepository) {}
    }
}
