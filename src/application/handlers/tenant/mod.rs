//! Tenant command and query handlers.

pub mod create_tenant;
pub mod export_tenant;
pub mod suspend_tenant;
pub mod update_tenant;

pub use create_tenant::{CreateTenantCommand, CreateTenantHandler};
pub use export_tenant::{ExportTenantHandler, ExportTenantQuery, TenantExport};
pub use suspend_tenant::{SuspendTenantCommand, SuspendTenantHandler};
pub use update_tenant::{UpdateTenantCommand, UpdateTenantHandler};
