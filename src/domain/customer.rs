//! Customer - a billing identity scoped to exactly one tenant.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::{
    CustomerId, TenantId, TenantScoped, Timestamp, ValidationError,
};

/// A billing identity within a single tenant.
///
/// Customers never span tenants: a golfer with memberships at two courses
/// is two customers. This keeps revenue attribution and exports strictly
/// tenant-partitioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Unique identifier.
    pub id: CustomerId,

    /// Owning tenant.
    pub tenant_id: TenantId,

    /// Billing email address.
    pub email: String,

    /// Display name on invoices.
    pub display_name: String,

    /// Free-form key/value metadata (external CRM ids, cohort tags).
    pub metadata: BTreeMap<String, String>,

    /// When the customer was created.
    pub created_at: Timestamp,
}

impl Customer {
    /// Creates a new customer bound to a tenant.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name or an email without
    /// an `@`. Deliverability is the mail provider's problem, not ours.
    pub fn new(
        id: CustomerId,
        tenant_id: TenantId,
        email: impl Into<String>,
        display_name: impl Into<String>,
        metadata: BTreeMap<String, String>,
    ) -> Result<Self, ValidationError> {
        let email = email.into();
        let display_name = display_name.into();

        if display_name.trim().is_empty() {
            return Err(ValidationError::empty_field("display_name"));
        }
        if !email.contains('@') || email.trim().is_empty() {
            return Err(ValidationError::invalid_format("email", "missing @ symbol"));
        }

        Ok(Self {
            id,
            tenant_id,
            email,
            display_name,
            metadata,
            created_at: Timestamp::now(),
        })
    }
}

impl TenantScoped for Customer {
    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    fn customer_for(tenant_id: TenantId) -> Customer {
        Customer::new(
            CustomerId::new(),
            tenant_id,
            "pro@golf-club-42.example",
            "Club Pro",
            BTreeMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_invalid_email() {
        let result = Customer::new(
            CustomerId::new(),
            TenantId::new(),
            "not-an-email",
            "Club Pro",
            BTreeMap::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn new_rejects_empty_name() {
        let result = Customer::new(
            CustomerId::new(),
            TenantId::new(),
            "pro@example.com",
            "  ",
            BTreeMap::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn customer_is_tenant_scoped() {
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let customer = customer_for(tenant_a);

        assert!(customer.check_tenant(&tenant_a).is_ok());
        let err = customer.check_tenant(&tenant_b).unwrap_err();
        assert_eq!(err.code, ErrorCode::CrossTenantViolation);
    }
}
