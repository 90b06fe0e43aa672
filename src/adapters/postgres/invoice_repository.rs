//! PostgreSQL implementation of InvoiceRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    CurrencyCode, CustomerId, DomainError, ErrorCode, InvoiceId, TenantId, Timestamp,
};
use crate::domain::invoice::{Invoice, InvoiceStatus, LineItem};
use crate::ports::InvoiceRepository;

/// PostgreSQL implementation of the `InvoiceRepository` port.
///
/// Line items are stored as a JSONB document: they are immutable once
/// the invoice is sent, so there is nothing to query them by
/// relationally.
pub struct PostgresInvoiceRepository {
    pool: PgPool,
}

impl PostgresInvoiceRepository {
    /// Creates a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an invoice.
#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    tenant_id: Uuid,
    customer_id: Uuid,
    currency: String,
    line_items: Json<Vec<LineItem>>,
    due_date: DateTime<Utc>,
    status: String,
    attempt_count: i32,
    next_attempt_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DomainError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        let currency = CurrencyCode::new(&row.currency)
            .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?;

        Ok(Invoice {
            id: InvoiceId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            currency,
            line_items: row.line_items.0,
            due_date: Timestamp::from_datetime(row.due_date),
            status: parse_status(&row.status)?,
            attempt_count: row.attempt_count.max(0) as u32,
            next_attempt_at: row.next_attempt_at.map(Timestamp::from_datetime),
            paid_at: row.paid_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<InvoiceStatus, DomainError> {
    match s {
        "draft" => Ok(InvoiceStatus::Draft),
        "sent" => Ok(InvoiceStatus::Sent),
        "paid" => Ok(InvoiceStatus::Paid),
        "overdue" => Ok(InvoiceStatus::Overdue),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid invoice status: {}", s),
        )),
    }
}

fn status_to_string(status: InvoiceStatus) -> &'static str {
    match status {
        InvoiceStatus::Draft => "draft",
        InvoiceStatus::Sent => "sent",
        InvoiceStatus::Paid => "paid",
        InvoiceStatus::Overdue => "overdue",
    }
}

const SELECT_COLUMNS: &str = "id, tenant_id, customer_id, currency, line_items, due_date, \
     status, attempt_count, next_attempt_at, paid_at, created_at, updated_at";

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    async fn save(&self, invoice: &Invoice) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, tenant_id, customer_id, currency, line_items, due_date,
                status, attempt_count, next_attempt_at, paid_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.tenant_id.as_uuid())
        .bind(invoice.customer_id.as_uuid())
        .bind(invoice.currency.as_str())
        .bind(Json(&invoice.line_items))
        .bind(invoice.due_date.as_datetime())
        .bind(status_to_string(invoice.status))
        .bind(invoice.attempt_count as i32)
        .bind(invoice.next_attempt_at.map(|t| *t.as_datetime()))
        .bind(invoice.paid_at.map(|t| *t.as_datetime()))
        .bind(invoice.created_at.as_datetime())
        .bind(invoice.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to save invoice", e))?;

        Ok(())
    }

    async fn update(&self, invoice: &Invoice) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices SET
                line_items = $2,
                status = $3,
                attempt_count = $4,
                next_attempt_at = $5,
                paid_at = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(Json(&invoice.line_items))
        .bind(status_to_string(invoice.status))
        .bind(invoice.attempt_count as i32)
        .bind(invoice.next_attempt_at.map(|t| *t.as_datetime()))
        .bind(invoice.paid_at.map(|t| *t.as_datetime()))
        .bind(invoice.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update invoice", e))?;

        if result.rows_affected() == 0 {
            return Err(
                DomainError::new(ErrorCode::InvoiceNotFound, "Invoice not found")
                    .with_detail("invoice_id", invoice.id.to_string()),
            );
        }
        Ok(())
    }

    async fn find_by_id(&self, id: InvoiceId) -> Result<Option<Invoice>, DomainError> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {} FROM invoices WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find invoice", e))?;

        row.map(Invoice::try_from).transpose()
    }

    async fn list_by_customer(
        &self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<Vec<Invoice>, DomainError> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {} FROM invoices \
             WHERE tenant_id = $1 AND customer_id = $2 ORDER BY created_at, id",
            SELECT_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .bind(customer_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list invoices", e))?;

        rows.into_iter().map(Invoice::try_from).collect()
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<Invoice>, DomainError> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {} FROM invoices WHERE tenant_id = $1 ORDER BY created_at, id",
            SELECT_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list invoices", e))?;

        rows.into_iter().map(Invoice::try_from).collect()
    }
}
