//! Tenant aggregate entity.
//!
//! A Tenant is an isolated customer organization: an individual golfer, a
//! single golf course, or an enterprise chain parent with child courses.
//! Everything billable in the platform hangs off exactly one tenant.
//!
//! # Design Decisions
//!
//! - **Slug is immutable**: there is deliberately no setter; the slug is
//!   fixed at provisioning and uniqueness is enforced by the repository.
//! - **Chains are one level deep in practice** but the model only stores a
//!   parent reference; boundary checks ask "direct descendant" explicitly.
//! - **Optimistic concurrency**: `version` is compared-and-incremented by
//!   repositories on update.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::foundation::{DomainError, StateMachine, TenantId, Timestamp};

use super::{ResourceLimits, TenantSlug, TenantStatus};

/// What kind of organization a tenant is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantKind {
    /// A single golfer with a personal account.
    Individual,

    /// One golf course location.
    GolfCourse,

    /// A chain parent owning multiple course tenants.
    EnterpriseChain,
}

impl TenantKind {
    /// Default resource limits for this kind of tenant.
    pub fn default_limits(&self) -> ResourceLimits {
        match self {
            TenantKind::Individual => ResourceLimits::individual(),
            TenantKind::GolfCourse => ResourceLimits::golf_course(),
            TenantKind::EnterpriseChain => ResourceLimits::enterprise_chain(),
        }
    }
}

/// White-label branding configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandingConfig {
    /// Logo asset URL.
    pub logo_url: Option<String>,

    /// Primary brand color as a hex string (e.g. `"#1a5c2e"`).
    pub primary_color: Option<String>,

    /// White-label custom domain, if configured.
    pub custom_domain: Option<String>,
}

/// Tenant aggregate.
///
/// # Invariants
///
/// - `slug` is globally unique (repository-enforced) and immutable.
/// - A child's `limits` never exceed its parent's.
/// - Status transitions follow [`TenantStatus`] state machine rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique identifier.
    pub id: TenantId,

    /// URL-safe unique slug, fixed at provisioning.
    pub slug: TenantSlug,

    /// Human-readable name shown in dashboards and invoices.
    pub display_name: String,

    /// Organization kind.
    pub kind: TenantKind,

    /// Parent tenant for chain children.
    pub parent_id: Option<TenantId>,

    /// White-label branding.
    pub branding: BrandingConfig,

    /// Enabled feature flags, sorted for deterministic exports.
    pub feature_flags: BTreeSet<String>,

    /// Resource ceilings.
    pub limits: ResourceLimits,

    /// Lifecycle status.
    pub status: TenantStatus,

    /// When the tenant was provisioned.
    pub created_at: Timestamp,

    /// When the tenant was last updated.
    pub updated_at: Timestamp,

    /// Optimistic concurrency version.
    pub version: u64,
}

impl Tenant {
    /// Provisions a new tenant in `Provisioning` status.
    pub fn provision(
        id: TenantId,
        slug: TenantSlug,
        display_name: impl Into<String>,
        kind: TenantKind,
        parent_id: Option<TenantId>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            slug,
            display_name: display_name.into(),
            kind,
            parent_id,
            branding: BrandingConfig::default(),
            feature_flags: BTreeSet::new(),
            limits: kind.default_limits(),
            status: TenantStatus::Provisioning,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Activates a provisioned or suspended tenant.
    pub fn activate(&mut self) -> Result<(), DomainError> {
        self.transition_to(TenantStatus::Active)
    }

    /// Suspends an active tenant.
    pub fn suspend(&mut self) -> Result<(), DomainError> {
        self.transition_to(TenantStatus::Suspended)
    }

    /// Archives the tenant. Terminal.
    pub fn archive(&mut self) -> Result<(), DomainError> {
        self.transition_to(TenantStatus::Archived)
    }

    /// Replaces the branding configuration.
    pub fn set_branding(&mut self, branding: BrandingConfig) {
        self.branding = branding;
        self.updated_at = Timestamp::now();
    }

    /// Replaces the resource limits, enforcing the parent ceiling.
    pub fn set_limits(
        &mut self,
        limits: ResourceLimits,
        parent_limits: Option<&ResourceLimits>,
    ) -> Result<(), DomainError> {
        limits.validate_against_parent(parent_limits)?;
        self.limits = limits;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Enables a feature flag.
    pub fn enable_feature(&mut self, flag: impl Into<String>) {
        self.feature_flags.insert(flag.into());
        self.updated_at = Timestamp::now();
    }

    /// Disables a feature flag.
    pub fn disable_feature(&mut self, flag: &str) {
        self.feature_flags.remove(flag);
        self.updated_at = Timestamp::now();
    }

    /// Returns true if a feature flag is enabled.
    pub fn has_feature(&self, flag: &str) -> bool {
        self.feature_flags.contains(flag)
    }

    /// Returns true if this tenant is a direct child of the given tenant.
    ///
    /// Boundary checks deliberately use *direct* descent: a chain-scoped
    /// permission on a grandparent does not reach grandchildren.
    pub fn is_direct_child_of(&self, candidate_parent: &TenantId) -> bool {
        self.parent_id.as_ref() == Some(candidate_parent)
    }

    fn transition_to(&mut self, target: TenantStatus) -> Result<(), DomainError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| DomainError::invalid_transition("tenant", self.status, target))?;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}
