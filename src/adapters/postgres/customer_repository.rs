//! PostgreSQL implementation of CustomerRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::customer::Customer;
use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, TenantId, Timestamp};
use crate::ports::CustomerRepository;

/// PostgreSQL implementation of the `CustomerRepository` port.
pub struct PostgresCustomerRepository {
    pool: PgPool,
}

impl PostgresCustomerRepository {
    /// Creates a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a customer.
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    tenant_id: Uuid,
    email: String,
    display_name: String,
    metadata: Json<BTreeMap<String, String>>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: CustomerId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            email: row.email,
            display_name: row.display_name,
            metadata: row.metadata.0,
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn save(&self, customer: &Customer) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, tenant_id, email, display_name, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(customer.tenant_id.as_uuid())
        .bind(&customer.email)
        .bind(&customer.display_name)
        .bind(Json(&customer.metadata))
        .bind(customer.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("customers_tenant_id_email_key") {
                    return DomainError::new(
                        ErrorCode::DuplicateCustomer,
                        format!("Customer '{}' already exists in tenant", customer.email),
                    );
                }
            }
            db_error("Failed to save customer", e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DomainError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            "SELECT id, tenant_id, email, display_name, metadata, created_at \
             FROM customers WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find customer", e))?;

        Ok(row.map(Customer::from))
    }

    async fn find_by_email(
        &self,
        tenant_id: TenantId,
        email: &str,
    ) -> Result<Option<Customer>, DomainError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            "SELECT id, tenant_id, email, display_name, metadata, created_at \
             FROM customers WHERE tenant_id = $1 AND email = $2",
        )
        .bind(tenant_id.as_uuid())
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find customer", e))?;

        Ok(row.map(Customer::from))
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<Customer>, DomainError> {
        let rows: Vec<CustomerRow> = sqlx::query_as(
            "SELECT id, tenant_id, email, display_name, metadata, created_at \
             FROM customers WHERE tenant_id = $1 ORDER BY email",
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list customers", e))?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }
}
