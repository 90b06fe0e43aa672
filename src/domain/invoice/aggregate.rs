//! Invoice aggregate entity.
//!
//! An invoice belongs to one customer of one tenant and holds an ordered
//! list of line items. Its total is always the sum of its line items;
//! there is no stored total to drift.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::{
    CurrencyCode, CustomerId, DomainError, InvoiceId, Money, StateMachine, TenantId,
    TenantScoped, Timestamp,
};

use super::InvoiceStatus;

/// One line on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Human-readable description shown to the customer.
    pub description: String,

    /// Unit amount; the line bills `amount x quantity`.
    pub amount: Money,

    /// Number of units.
    pub quantity: u32,

    /// Free-form metadata (quota type, proration details, etc.).
    pub metadata: BTreeMap<String, String>,
}

impl LineItem {
    /// Creates a line item with empty metadata.
    pub fn new(description: impl Into<String>, amount: Money, quantity: u32) -> Self {
        Self {
            description: description.into(),
            amount,
            quantity,
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The line's contribution to the invoice total.
    pub fn line_total(&self) -> Result<Money, DomainError> {
        Ok(self
            .amount
            .mul_ratio_half_even(self.quantity as i64, 1)?)
    }
}

/// Invoice aggregate.
///
/// # Invariants
///
/// - `total()` always equals the sum of line items; items are only
///   mutable while the invoice is a draft.
/// - Status moves strictly forward per [`InvoiceStatus`].
/// - All line items share the invoice currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier.
    pub id: InvoiceId,

    /// Owning tenant.
    pub tenant_id: TenantId,

    /// Customer being billed.
    pub customer_id: CustomerId,

    /// Invoice currency; every line item must match.
    pub currency: CurrencyCode,

    /// Ordered line items.
    pub line_items: Vec<LineItem>,

    /// Payment due date.
    pub due_date: Timestamp,

    /// Lifecycle status.
    pub status: InvoiceStatus,

    /// Payment attempts made so far.
    pub attempt_count: u32,

    /// Earliest instant the next payment attempt may run (backoff).
    pub next_attempt_at: Option<Timestamp>,

    /// When payment settled, once paid.
    pub paid_at: Option<Timestamp>,

    /// When the invoice was created.
    pub created_at: Timestamp,

    /// When the invoice was last updated.
    pub updated_at: Timestamp,
}

impl Invoice {
    /// Creates an empty draft invoice.
    pub fn draft(
        id: InvoiceId,
        tenant_id: TenantId,
        customer_id: CustomerId,
        currency: CurrencyCode,
        due_date: Timestamp,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            tenant_id,
            customer_id,
            currency,
            line_items: Vec::new(),
            due_date,
            status: InvoiceStatus::Draft,
            attempt_count: 0,
            next_attempt_at: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a line item to a draft invoice.
    ///
    /// # Errors
    ///
    /// `InvalidStateTransition` once the invoice has been sent; currency
    /// mismatches are rejected so the total stays well-defined.
    pub fn add_line_item(&mut self, item: LineItem) -> Result<(), DomainError> {
        if self.status != InvoiceStatus::Draft {
            return Err(DomainError::invalid_transition(
                "invoice",
                self.status,
                InvoiceStatus::Draft,
            )
            .with_detail("operation", "add_line_item"));
        }
        if item.amount.currency != self.currency {
            return Err(DomainError::validation(
                "line_item.currency",
                format!(
                    "line currency {} does not match invoice currency {}",
                    item.amount.currency, self.currency
                ),
            ));
        }
        self.line_items.push(item);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// The invoice total: the sum of all line totals.
    pub fn total(&self) -> Result<Money, DomainError> {
        let mut total = Money::zero(self.currency);
        for item in &self.line_items {
            total = total.checked_add(&item.line_total()?)?;
        }
        Ok(total)
    }

    /// Issues the invoice to the customer.
    pub fn send(&mut self) -> Result<(), DomainError> {
        self.transition_to(InvoiceStatus::Sent)
    }

    /// Marks the invoice settled.
    pub fn mark_paid(&mut self, paid_at: Timestamp) -> Result<(), DomainError> {
        self.transition_to(InvoiceStatus::Paid)?;
        self.paid_at = Some(paid_at);
        self.next_attempt_at = None;
        Ok(())
    }

    /// Marks the invoice overdue after retries are exhausted.
    pub fn mark_overdue(&mut self) -> Result<(), DomainError> {
        self.transition_to(InvoiceStatus::Overdue)?;
        self.next_attempt_at = None;
        Ok(())
    }

    /// Records a failed or ambiguous payment attempt and schedules the
    /// next one.
    pub fn record_attempt(&mut self, next_attempt_at: Timestamp) {
        self.attempt_count += 1;
        self.next_attempt_at = Some(next_attempt_at);
        self.updated_at = Timestamp::now();
    }

    /// Returns true if a payment attempt may run at `now`.
    pub fn attempt_allowed_at(&self, now: Timestamp) -> bool {
        if self.status != InvoiceStatus::Sent {
            return false;
        }
        match self.next_attempt_at {
            Some(next) => now >= next,
            None => true,
        }
    }

    fn transition_to(&mut self, target: InvoiceStatus) -> Result<(), DomainError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| DomainError::invalid_transition("invoice", self.status, target))?;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}

impl TenantScoped for Invoice {
    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, CurrencyCode::USD)
    }

    fn draft_invoice() -> Invoice {
        Invoice::draft(
            InvoiceId::new(),
            TenantId::new(),
            CustomerId::new(),
            CurrencyCode::USD,
            Timestamp::now().add_days(14),
        )
    }

    #[test]
    fn total_equals_sum_of_line_items() {
        let mut invoice = draft_invoice();
        invoice
            .add_line_item(LineItem::new("Course Pro renewal", usd(120_000), 1))
            .unwrap();
        invoice
            .add_line_item(LineItem::new("API overage", usd(1), 500))
            .unwrap();

        assert_eq!(invoice.total().unwrap(), usd(120_500));
    }

    #[test]
    fn empty_draft_totals_zero() {
        assert_eq!(draft_invoice().total().unwrap(), usd(0));
    }

    #[test]
    fn line_items_frozen_after_send() {
        let mut invoice = draft_invoice();
        invoice
            .add_line_item(LineItem::new("Renewal", usd(50_000), 1))
            .unwrap();
        invoice.send().unwrap();

        let err = invoice
            .add_line_item(LineItem::new("Late addition", usd(100), 1))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert_eq!(invoice.total().unwrap(), usd(50_000));
    }

    #[test]
    fn currency_mismatch_rejected() {
        let mut invoice = draft_invoice();
        let eur = Money::from_cents(100, CurrencyCode::new("EUR").unwrap());
        assert!(invoice.add_line_item(LineItem::new("Mismatch", eur, 1)).is_err());
    }

    #[test]
    fn paid_invoice_records_settlement_time() {
        let mut invoice = draft_invoice();
        invoice.send().unwrap();

        let settled = Timestamp::now();
        invoice.mark_paid(settled).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.paid_at, Some(settled));
    }

    #[test]
    fn cannot_pay_a_draft() {
        let mut invoice = draft_invoice();
        let err = invoice.mark_paid(Timestamp::now()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn attempts_gate_on_backoff_schedule() {
        let mut invoice = draft_invoice();
        invoice.send().unwrap();
        let now = Timestamp::now();

        assert!(invoice.attempt_allowed_at(now));

        invoice.record_attempt(now.add_days(1));
        assert_eq!(invoice.attempt_count, 1);
        assert!(!invoice.attempt_allowed_at(now));
        assert!(invoice.attempt_allowed_at(now.add_days(1)));
    }

    #[test]
    fn overdue_invoice_allows_no_more_attempts() {
        let mut invoice = draft_invoice();
        invoice.send().unwrap();
        invoice.mark_overdue().unwrap();
        assert!(!invoice.attempt_allowed_at(Timestamp::now().add_days(30)));
    }
}
