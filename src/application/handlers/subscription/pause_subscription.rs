//! PauseSubscriptionHandler - Command handler for pausing a subscription.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp};
use crate::domain::subscription::Subscription;
use crate::ports::SubscriptionRepository;

/// Command to pause an active subscription for a duration.
#[derive(Debug, Clone)]
pub struct PauseSubscriptionCommand {
    pub subscription_id: SubscriptionId,
    /// How long to pause; the subscription auto-resumes at expiry.
    pub duration_days: i64,
}

/// Handler for pausing subscriptions.
///
/// No charges occur while paused; the billing cycle resumes the
/// subscription automatically once the duration expires, or the
/// resume handler does so explicitly.
pub struct PauseSubscriptionHandler {
    subscription_repository: Arc<dyn SubscriptionRepository>,
}

impl PauseSubscriptionHandler {
    pub fn new(subscription_repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self {
            subscription_repository,
        }
    }

    pub async fn handle(
        &self,
        cmd: PauseSubscriptionCommand,
    ) -> Result<Subscription, DomainError> {
        if cmd.duration_days <= 0 {
            return Err(DomainError::validation(
                "duration_days",
                "pause duration must be positive",
            ));
        }

        let mut subscription = self
            .subscription_repository
            .find_by_id(cmd.subscription_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::SubscriptionNotFound, "Subscription not found")
                    .with_detail("subscription_id", cmd.subscription_id.to_string())
            })?;

        let now = Timestamp::now();
        subscription.pause(now.add_days(cmd.duration_days), now)?;
        self.subscription_repository.update(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            duration_days = cmd.duration_days,
            "subscription paused"
        );
        Ok(subscription)
    }
}
