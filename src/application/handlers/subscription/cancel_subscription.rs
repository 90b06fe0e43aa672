//! CancelSubscriptionHandler - Command handler for cancellation.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp};
use crate::domain::subscription::Subscription;
use crate::ports::SubscriptionRepository;

/// Command to cancel a subscription with a reason tag.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub subscription_id: SubscriptionId,
    pub reason: String,
}

/// Handler for cancellation.
///
/// Cancellation stops future renewals and is terminal; it never deletes
/// history; the subscription row and its revenue events remain.
pub struct CancelSubscriptionHandler {
    subscription_repository: Arc<dyn SubscriptionRepository>,
}

impl CancelSubscriptionHandler {
    pub fn new(subscription_repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self {
            subscription_repository,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<Subscription, DomainError> {
        let mut subscription = self
            .subscription_repository
            .find_by_id(cmd.subscription_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::SubscriptionNotFound, "Subscription not found")
                    .with_detail("subscription_id", cmd.subscription_id.to_string())
            })?;

        subscription.cancel(cmd.reason, Timestamp::now())?;
        self.subscription_repository.update(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            reason = subscription.cancellation_reason.as_deref().unwrap_or(""),
            "subscription canceled"
        );
        Ok(subscription)
    }
}
