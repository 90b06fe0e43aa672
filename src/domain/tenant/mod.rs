//! Tenant domain - identity, hierarchy, branding, and limits.

mod aggregate;
mod limits;
mod slug;
mod status;

pub use aggregate::{BrandingConfig, Tenant, TenantKind};
pub use limits::ResourceLimits;
pub use slug::TenantSlug;
pub use status::TenantStatus;
