//! Tenant lifecycle state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Tenant lifecycle status.
///
/// Follows the onboarding pipeline: a tenant is provisioned, activated when
/// onboarding completes, optionally suspended (billing delinquency, abuse),
/// and finally archived. Archival is terminal; archived tenants keep their
/// history but accept no traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    /// Created but not yet serving traffic.
    Provisioning,

    /// Fully onboarded and serving traffic.
    Active,

    /// Temporarily disabled; data and billing history retained.
    Suspended,

    /// Permanently closed. Terminal.
    Archived,
}

impl TenantStatus {
    /// Returns true if the tenant may serve API traffic and be billed.
    pub fn is_operational(&self) -> bool {
        matches!(self, TenantStatus::Active)
    }
}

impl StateMachine for TenantStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use TenantStatus::*;
        matches!(
            (self, target),
            (Provisioning, Active)
                | (Provisioning, Archived)
                | (Active, Suspended)
                | (Active, Archived)
                | (Suspended, Active)
                | (Suspended, Archived)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use TenantStatus::*;
        match self {
            Provisioning => vec![Active, Archived],
            Active => vec![Suspended, Archived],
            Suspended => vec![Active, Archived],
            Archived => vec![],
        }
    }
}
