//! ResumeSubscriptionHandler - Command handler for resuming a paused subscription.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp};
use crate::domain::subscription::Subscription;
use crate::ports::SubscriptionRepository;

/// Command to explicitly resume a paused subscription.
#[derive(Debug, Clone)]
pub struct ResumeSubscriptionCommand {
    pub subscription_id: SubscriptionId,
}

/// Handler for resuming subscriptions.
pub struct ResumeSubscriptionHandler {
    subscription_repository: Arc<dyn SubscriptionRepository>,
}

impl ResumeSubscriptionHandler {
    pub fn new(subscription_repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self {
            subscription_repository,
        }
    }

    pub async fn handle(
        &self,
        cmd: ResumeSubscriptionCommand,
    ) -> Result<Subscription, DomainError> {
        let mut subscription = self
            .subscription_repository
            .find_by_id(cmd.subscription_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::SubscriptionNotFound, "Subscription not found")
                    .with_detail("subscription_id", cmd.subscription_id.to_string())
            })?;

        subscription.resume(Timestamp::now())?;
        self.subscription_repository.update(&subscription).await?;

        tracing::info!(subscription_id = %subscription.id, "subscription resumed");
        Ok(subscription)
    }
}
