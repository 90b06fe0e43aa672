//! PostgreSQL implementation of TenantRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, TenantId, Timestamp};
use crate::domain::tenant::{
    BrandingConfig, ResourceLimits, Tenant, TenantKind, TenantSlug, TenantStatus,
};
use crate::ports::TenantRepository;

/// PostgreSQL implementation of the `TenantRepository` port.
pub struct PostgresTenantRepository {
    pool: PgPool,
}

impl PostgresTenantRepository {
    /// Creates a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a tenant.
#[derive(Debug, sqlx::FromRow)]
struct TenantRow {
    id: Uuid,
    slug: String,
    display_name: String,
    kind: String,
    parent_id: Option<Uuid>,
    branding: Json<BrandingConfig>,
    feature_flags: Json<BTreeSet<String>>,
    limits: Json<ResourceLimits>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = DomainError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        Ok(Tenant {
            id: TenantId::from_uuid(row.id),
            slug: TenantSlug::new(row.slug)
                .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?,
            display_name: row.display_name,
            kind: parse_kind(&row.kind)?,
            parent_id: row.parent_id.map(TenantId::from_uuid),
            branding: row.branding.0,
            feature_flags: row.feature_flags.0,
            limits: row.limits.0,
            status: parse_status(&row.status)?,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            version: row.version.max(0) as u64,
        })
    }
}

fn parse_kind(s: &str) -> Result<TenantKind, DomainError> {
    match s {
        "individual" => Ok(TenantKind::Individual),
        "golf_course" => Ok(TenantKind::GolfCourse),
        "enterprise_chain" => Ok(TenantKind::EnterpriseChain),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid tenant kind: {}", s),
        )),
    }
}

fn kind_to_string(kind: TenantKind) -> &'static str {
    match kind {
        TenantKind::Individual => "individual",
        TenantKind::GolfCourse => "golf_course",
        TenantKind::EnterpriseChain => "enterprise_chain",
    }
}

fn parse_status(s: &str) -> Result<TenantStatus, DomainError> {
    match s {
        "provisioning" => Ok(TenantStatus::Provisioning),
        "active" => Ok(TenantStatus::Active),
        "suspended" => Ok(TenantStatus::Suspended),
        "archived" => Ok(TenantStatus::Archived),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid tenant status: {}", s),
        )),
    }
}

fn status_to_string(status: TenantStatus) -> &'static str {
    match status {
        TenantStatus::Provisioning => "provisioning",
        TenantStatus::Active => "active",
        TenantStatus::Suspended => "suspended",
        TenantStatus::Archived => "archived",
    }
}

const SELECT_COLUMNS: &str = "id, slug, display_name, kind, parent_id, branding, \
     feature_flags, limits, status, created_at, updated_at, version";

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn save(&self, tenant: &Tenant) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO tenants (
                id, slug, display_name, kind, parent_id, branding,
                feature_flags, limits, status, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(tenant.id.as_uuid())
        .bind(tenant.slug.as_str())
        .bind(&tenant.display_name)
        .bind(kind_to_string(tenant.kind))
        .bind(tenant.parent_id.as_ref().map(|p| *p.as_uuid()))
        .bind(Json(&tenant.branding))
        .bind(Json(&tenant.feature_flags))
        .bind(Json(&tenant.limits))
        .bind(status_to_string(tenant.status))
        .bind(tenant.created_at.as_datetime())
        .bind(tenant.updated_at.as_datetime())
        .bind(tenant.version as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("tenants_slug_key") {
                    return DomainError::new(
                        ErrorCode::DuplicateSlug,
                        format!("Slug '{}' is already registered", tenant.slug),
                    );
                }
            }
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to save tenant: {}", e))
        })?;

        Ok(())
    }

    async fn update(&self, tenant: &Tenant) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE tenants SET
                display_name = $3,
                branding = $4,
                feature_flags = $5,
                limits = $6,
                status = $7,
                updated_at = $8,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(tenant.id.as_uuid())
        .bind(tenant.version as i64)
        .bind(&tenant.display_name)
        .bind(Json(&tenant.branding))
        .bind(Json(&tenant.feature_flags))
        .bind(Json(&tenant.limits))
        .bind(status_to_string(tenant.status))
        .bind(tenant.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to update tenant: {}", e))
        })?;

        if result.rows_affected() == 0 {
            // Distinguish a missing row from a lost version race.
            return match self.find_by_id(tenant.id).await? {
                None => Err(DomainError::new(ErrorCode::TenantNotFound, "Tenant not found")
                    .with_detail("tenant_id", tenant.id.to_string())),
                Some(stored) => Err(DomainError::new(
                    ErrorCode::StaleVersion,
                    "Tenant was modified concurrently",
                )
                .with_detail("expected_version", tenant.version.to_string())
                .with_detail("stored_version", stored.version.to_string())),
            };
        }
        Ok(())
    }

    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, DomainError> {
        let row: Option<TenantRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tenants WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find tenant: {}", e))
        })?;

        row.map(Tenant::try_from).transpose()
    }

    async fn find_by_slug(&self, slug: &TenantSlug) -> Result<Option<Tenant>, DomainError> {
        let row: Option<TenantRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tenants WHERE slug = $1",
            SELECT_COLUMNS
        ))
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find tenant: {}", e))
        })?;

        row.map(Tenant::try_from).transpose()
    }

    async fn children_of(&self, parent: TenantId) -> Result<Vec<Tenant>, DomainError> {
        let rows: Vec<TenantRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tenants WHERE parent_id = $1 ORDER BY slug",
            SELECT_COLUMNS
        ))
        .bind(parent.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to list children: {}", e))
        })?;

        rows.into_iter().map(Tenant::try_from).collect()
    }
}
