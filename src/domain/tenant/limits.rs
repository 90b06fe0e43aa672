//! Per-tenant resource limits.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Resource ceilings for a tenant.
///
/// # Invariant
///
/// A child tenant's limits must never exceed its parent's. The check lives
/// in [`ResourceLimits::fits_within`] and is enforced wherever limits are
/// set on a tenant that has a parent, or on a parent that has children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum member/staff accounts.
    pub max_users: u32,

    /// Maximum stored bytes (media, documents, exports).
    pub max_storage_bytes: u64,

    /// Included API calls per calendar month before overage billing.
    pub max_api_calls_per_month: u64,

    /// Maximum white-label custom domains.
    pub max_custom_domains: u32,
}

impl ResourceLimits {
    /// Limits for an individual golfer account.
    pub fn individual() -> Self {
        Self {
            max_users: 1,
            max_storage_bytes: 1 << 30, // 1 GiB
            max_api_calls_per_month: 10_000,
            max_custom_domains: 0,
        }
    }

    /// Limits for a single golf course.
    pub fn golf_course() -> Self {
        Self {
            max_users: 250,
            max_storage_bytes: 50 << 30,
            max_api_calls_per_month: 1_000_000,
            max_custom_domains: 2,
        }
    }

    /// Limits for an enterprise chain parent.
    pub fn enterprise_chain() -> Self {
        Self {
            max_users: 10_000,
            max_storage_bytes: 1 << 40, // 1 TiB
            max_api_calls_per_month: 50_000_000,
            max_custom_domains: 25,
        }
    }

    /// Returns true if every ceiling is less than or equal to the parent's.
    pub fn fits_within(&self, parent: &ResourceLimits) -> bool {
        self.max_users <= parent.max_users
            && self.max_storage_bytes <= parent.max_storage_bytes
            && self.max_api_calls_per_month <= parent.max_api_calls_per_month
            && self.max_custom_domains <= parent.max_custom_domains
    }

    /// Validates this limit set against an optional parent.
    pub fn validate_against_parent(
        &self,
        parent: Option<&ResourceLimits>,
    ) -> Result<(), ValidationError> {
        if let Some(parent) = parent {
            if !self.fits_within(parent) {
                return Err(ValidationError::invalid_format(
                    "limits",
                    "child limits exceed parent limits",
                ));
            }
        }
        Ok(())
    }
}
