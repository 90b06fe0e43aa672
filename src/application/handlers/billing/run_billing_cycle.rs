//! RunBillingCycleHandler - the automated renewal cycle.
//!
//! For every subscription due for renewal: compute the renewal amount
//! plus pending usage overage, attempt payment through the processor
//! adapter, and on success append the `subscription-renewed` (and
//! `usage-charge`) events and mark the invoice paid. Declines retry
//! across subsequent cycle runs with exponential backoff up to a bound,
//! after which the invoice goes overdue and the subscription is flagged
//! for dunning; never auto-canceled; that policy lives above this core.
//!
//! Subscriptions are processed in parallel batches bounded by the
//! concurrency limit. A cycle can be canceled only at batch boundaries,
//! never mid-subscription, and the report names exactly which
//! subscriptions were processed, failed, and skipped.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::domain::foundation::{
    DomainError, InvoiceId, Money, RevenueEventId, SubscriptionId, Timestamp,
};
use crate::domain::invoice::{Invoice, InvoiceStatus, LineItem};
use crate::domain::revenue::{EventSource, RevenueEvent, RevenueEventType, RevenueStream};
use crate::domain::subscription::{Subscription, TierCatalog};
use crate::domain::usage::compute_overage;
use crate::ports::{
    ChargeRequest, ChargeStatus, InvoiceRepository, PaymentProcessor, ProcessorError,
    RevenueLedger, SubscriptionRepository, UsageMeter,
};

/// Tunables for the automated cycle.
#[derive(Debug, Clone, Copy)]
pub struct BillingCycleConfig {
    /// Payment attempts per invoice before dunning.
    pub max_attempts: u32,

    /// Base of the exponential backoff between attempts, in seconds.
    pub backoff_base_secs: u64,

    /// Subscriptions processed concurrently per batch.
    pub concurrency: usize,

    /// Deadline per payment attempt; a timeout is treated as ambiguous
    /// and takes the idempotent-retry path, not an automatic failure.
    pub payment_timeout_secs: u64,
}

impl Default for BillingCycleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_secs: 86_400,
            concurrency: 4,
            payment_timeout_secs: 30,
        }
    }
}

/// Cooperative cancellation flag, checked between batches.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation at the next batch boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A renewal that did not complete this run.
#[derive(Debug, Clone)]
pub struct FailedRenewal {
    pub subscription_id: SubscriptionId,
    pub reason: String,
}

/// Exact account of one cycle run.
#[derive(Debug, Clone, Default)]
pub struct BillingCycleReport {
    /// Renewed and settled this run.
    pub processed: Vec<SubscriptionId>,

    /// Attempted and failed this run (decline, fault, or conflict).
    pub failed: Vec<FailedRenewal>,

    /// Not attempted: backoff not yet due, or the run was canceled.
    pub skipped: Vec<SubscriptionId>,
}

enum RenewalOutcome {
    Renewed(SubscriptionId),
    Failed(SubscriptionId, String),
    Skipped(SubscriptionId),
}

/// Handler for the automated billing cycle.
pub struct RunBillingCycleHandler {
    subscription_repository: Arc<dyn SubscriptionRepository>,
    invoice_repository: Arc<dyn InvoiceRepository>,
    revenue_ledger: Arc<dyn RevenueLedger>,
    usage_meter: Arc<dyn UsageMeter>,
    payment_processor: Arc<dyn PaymentProcessor>,
    catalog: Arc<TierCatalog>,
    config: BillingCycleConfig,
}

impl RunBillingCycleHandler {
    pub fn new(
        subscription_repository: Arc<dyn SubscriptionRepository>,
        invoice_repository: Arc<dyn InvoiceRepository>,
        revenue_ledger: Arc<dyn RevenueLedger>,
        usage_meter: Arc<dyn UsageMeter>,
        payment_processor: Arc<dyn PaymentProcessor>,
        catalog: Arc<TierCatalog>,
        config: BillingCycleConfig,
    ) -> Self {
        Self {
            subscription_repository,
            invoice_repository,
            revenue_ledger,
            usage_meter,
            payment_processor,
            catalog,
            config,
        }
    }

    pub async fn handle(&self, cancel: &CancelFlag) -> Result<BillingCycleReport, DomainError> {
        let now = Timestamp::now();
        let mut report = BillingCycleReport::default();

        self.resume_expired_pauses(now).await?;

        let due = self.subscription_repository.list_due_for_renewal(now).await?;
        tracing::info!(due = due.len(), "billing cycle started");

        let mut remaining = due.as_slice();
        while !remaining.is_empty() {
            if cancel.is_canceled() {
                // Cancel at the batch boundary; everything not yet
                // attempted is reported, not dropped.
                report.skipped.extend(remaining.iter().map(|s| s.id));
                tracing::warn!(skipped = remaining.len(), "billing cycle canceled");
                break;
            }

            let batch_len = remaining.len().min(self.config.concurrency.max(1));
            let (batch, rest) = remaining.split_at(batch_len);
            remaining = rest;

            let outcomes =
                join_all(batch.iter().map(|s| self.process_one(s.clone(), now))).await;
            for outcome in outcomes {
                match outcome {
                    RenewalOutcome::Renewed(id) => report.processed.push(id),
                    RenewalOutcome::Failed(id, reason) => report.failed.push(FailedRenewal {
                        subscription_id: id,
                        reason,
                    }),
                    RenewalOutcome::Skipped(id) => report.skipped.push(id),
                }
            }
        }

        tracing::info!(
            processed = report.processed.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "billing cycle finished"
        );
        Ok(report)
    }

    /// Paused subscriptions whose pause has expired resume before the
    /// due list is computed, so a pause ending today renews today.
    async fn resume_expired_pauses(&self, now: Timestamp) -> Result<(), DomainError> {
        for mut subscription in self
            .subscription_repository
            .list_pause_expired(now)
            .await?
        {
            if subscription.resume_if_pause_expired(now) {
                if let Err(err) = self.subscription_repository.update(&subscription).await {
                    // A concurrent transition won the race; it owns the row now.
                    tracing::debug!(
                        subscription_id = %subscription.id,
                        error = %err,
                        "pause auto-resume lost a concurrent update"
                    );
                }
            }
        }
        Ok(())
    }

    async fn process_one(&self, mut subscription: Subscription, now: Timestamp) -> RenewalOutcome {
        let subscription_id = subscription.id;
        match self.try_renew(&mut subscription, now).await {
            Ok(Some(())) => RenewalOutcome::Renewed(subscription_id),
            Ok(None) => RenewalOutcome::Skipped(subscription_id),
            Err(reason) => RenewalOutcome::Failed(subscription_id, reason),
        }
    }

    /// Attempts one renewal. `Ok(None)` means skipped (backoff not due).
    async fn try_renew(
        &self,
        subscription: &mut Subscription,
        now: Timestamp,
    ) -> Result<Option<()>, String> {
        // Dunning means retries are exhausted; recovery is a manual
        // workflow, not another automated attempt.
        if subscription.flagged_for_dunning {
            return Ok(None);
        }

        let period_end = subscription.current_period_end;
        let period_key = period_end.as_unix_secs();

        let mut invoice = match self
            .find_period_invoice(subscription, period_key)
            .await
            .map_err(|e| e.to_string())?
        {
            Some(existing) => {
                if !existing.attempt_allowed_at(now) {
                    return Ok(None);
                }
                existing
            }
            None => self
                .build_period_invoice(subscription, now, period_key)
                .await
                .map_err(|e| e.to_string())?,
        };

        let total = invoice.total().map_err(|e| e.to_string())?;
        let renewal_event_id = format!("renewal-{}-{}", subscription.id, period_key);

        let mut metadata = BTreeMap::new();
        metadata.insert("subscription_id".to_string(), subscription.id.to_string());
        metadata.insert("invoice_id".to_string(), invoice.id.to_string());

        let charge = ChargeRequest {
            amount: total,
            payment_method_token: format!("pm-{}", subscription.customer_id),
            idempotency_key: renewal_event_id.clone(),
            metadata,
        };

        let deadline = Duration::from_secs(self.config.payment_timeout_secs);
        let outcome = match tokio::time::timeout(deadline, self.payment_processor.charge(charge))
            .await
        {
            Ok(result) => result,
            // No answer inside the deadline: ambiguous, retry later
            // with the same idempotency key.
            Err(_) => Err(ProcessorError::timeout(format!(
                "no processor answer within {}s",
                self.config.payment_timeout_secs
            ))),
        };

        match outcome {
            Ok(outcome) if outcome.status.is_success() => {
                self.settle_renewal(subscription, &mut invoice, total, renewal_event_id, now)
                    .await
                    .map(Some)
                    .map_err(|e| e.to_string())
            }
            Ok(outcome) => {
                let reason = match outcome.status {
                    ChargeStatus::Declined { reason } => reason,
                    ChargeStatus::Succeeded => unreachable!(),
                };
                self.handle_failed_attempt(subscription, &mut invoice, now)
                    .await
                    .map_err(|e| e.to_string())?;
                Err(format!("declined: {}", reason))
            }
            Err(err) => {
                self.handle_failed_attempt(subscription, &mut invoice, now)
                    .await
                    .map_err(|e| e.to_string())?;
                Err(format!("processor: {}", err))
            }
        }
    }

    /// Finds the open invoice already issued for this renewal period.
    async fn find_period_invoice(
        &self,
        subscription: &Subscription,
        period_key: u64,
    ) -> Result<Option<Invoice>, DomainError> {
        let invoices = self
            .invoice_repository
            .list_by_customer(subscription.tenant_id, subscription.customer_id)
            .await?;
        Ok(invoices.into_iter().find(|invoice| {
            invoice.status == InvoiceStatus::Sent
                && invoice.line_items.first().is_some_and(|line| {
                    line.metadata.get("subscription_id").map(String::as_str)
                        == Some(subscription.id.to_string().as_str())
                        && line.metadata.get("period_key").map(String::as_str)
                            == Some(period_key.to_string().as_str())
                })
        }))
    }

    /// Issues the renewal invoice: one line for the subscription price,
    /// plus one per overrun quota type for the closing period's usage.
    async fn build_period_invoice(
        &self,
        subscription: &Subscription,
        now: Timestamp,
        period_key: u64,
    ) -> Result<Invoice, DomainError> {
        let mut invoice = Invoice::draft(
            InvoiceId::new(),
            subscription.tenant_id,
            subscription.customer_id,
            subscription.price.currency,
            now.add_days(14),
        );

        let renewal_line = LineItem::new(
            format!("{} renewal", subscription.tier_id),
            subscription.price,
            1,
        )
        .with_metadata("subscription_id", subscription.id.to_string())
        .with_metadata("period_key", period_key.to_string());
        invoice.add_line_item(renewal_line)?;

        match self.catalog.find(&subscription.tier_id) {
            Some(tier) => {
                let usage = self
                    .usage_meter
                    .period_usage(
                        subscription.tenant_id,
                        subscription.current_period_start,
                        subscription.current_period_end,
                    )
                    .await
                    .map_err(|e| {
                        DomainError::new(
                            crate::domain::foundation::ErrorCode::InternalError,
                            e.to_string(),
                        )
                    })?;

                for line in compute_overage(&usage, &tier.included, &tier.overage)? {
                    let item = LineItem::new(
                        format!("{} overage", line.quota),
                        line.rate,
                        u32::try_from(line.units).unwrap_or(u32::MAX),
                    )
                    .with_metadata("quota", line.quota.as_str())
                    .with_metadata("units", line.units.to_string());
                    invoice.add_line_item(item)?;
                }
            }
            None => {
                // Tier retired from the catalog: the price snapshot
                // still renews, but overage rates are unknown.
                tracing::warn!(
                    subscription_id = %subscription.id,
                    tier_id = %subscription.tier_id,
                    "tier missing from catalog; skipping overage"
                );
            }
        }

        invoice.send()?;
        self.invoice_repository.save(&invoice).await?;
        Ok(invoice)
    }

    async fn settle_renewal(
        &self,
        subscription: &mut Subscription,
        invoice: &mut Invoice,
        total: Money,
        renewal_event_id: String,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let renewal = RevenueEvent::new(
            RevenueEventId::new(renewal_event_id)?,
            subscription.tenant_id,
            RevenueEventType::SubscriptionRenewed,
            subscription.price,
            now,
            EventSource::PaymentProcessor,
        )?
        .with_subscription(subscription.id)
        .with_customer(subscription.customer_id)
        .with_invoice(invoice.id)
        .with_metadata("tier_id", subscription.tier_id.as_str());
        self.revenue_ledger.record(renewal).await?;

        let overage = total.checked_add(&subscription.price.negated())?;
        if !overage.is_zero() {
            let usage_event = RevenueEvent::new(
                RevenueEventId::new(format!(
                    "usage-{}-{}",
                    subscription.id,
                    subscription.current_period_end.as_unix_secs()
                ))?,
                subscription.tenant_id,
                RevenueEventType::UsageCharge,
                overage,
                now,
                EventSource::PaymentProcessor,
            )?
            .with_subscription(subscription.id)
            .with_customer(subscription.customer_id)
            .with_invoice(invoice.id)
            .with_stream(RevenueStream::Api);
            self.revenue_ledger.record(usage_event).await?;
        }

        invoice.mark_paid(now)?;
        self.invoice_repository.update(invoice).await?;

        subscription.renew(now)?;
        self.subscription_repository.update(subscription).await?;

        tracing::debug!(subscription_id = %subscription.id, "renewal settled");
        Ok(())
    }

    async fn handle_failed_attempt(
        &self,
        subscription: &mut Subscription,
        invoice: &mut Invoice,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        // Exponential backoff across cycle runs: base * 2^attempts.
        let backoff_secs = self
            .config
            .backoff_base_secs
            .saturating_mul(1u64 << invoice.attempt_count.min(16));
        invoice.record_attempt(now.plus_secs(backoff_secs));

        if invoice.attempt_count >= self.config.max_attempts {
            invoice.mark_overdue()?;
            subscription.flag_for_dunning(now);
            self.subscription_repository.update(subscription).await?;
            tracing::warn!(
                subscription_id = %subscription.id,
                invoice_id = %invoice.id,
                attempts = invoice.attempt_count,
                "payment retries exhausted; flagged for dunning"
            );
        }

        self.invoice_repository.update(invoice).await?;
        Ok(())
    }
}
