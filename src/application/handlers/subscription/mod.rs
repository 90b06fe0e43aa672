//! Subscription lifecycle command handlers.

pub mod cancel_subscription;
pub mod change_tier;
pub mod create_subscription;
pub mod pause_subscription;
pub mod resume_subscription;

pub use cancel_subscription::{CancelSubscriptionCommand, CancelSubscriptionHandler};
pub use change_tier::{ChangeTierCommand, ChangeTierHandler, ChangeTierResult};
pub use create_subscription::{
    CreateSubscriptionCommand, CreateSubscriptionHandler, CreateSubscriptionResult,
};
pub use pause_subscription::{PauseSubscriptionCommand, PauseSubscriptionHandler};
pub use resume_subscription::{ResumeSubscriptionCommand, ResumeSubscriptionHandler};
