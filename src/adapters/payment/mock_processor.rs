//! Mock payment processor for testing.
//!
//! A configurable stand-in for the external gateway. Supports:
//! - Scripted outcomes (succeed, decline, fail) consumed in order
//! - Idempotency replay: a settled key returns its original outcome
//! - Call tracking for assertions

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{
    ChargeOutcome, ChargeRequest, ChargeStatus, PaymentProcessor, ProcessorError, RefundRequest,
};

/// Next scripted result for a processor call.
#[derive(Debug, Clone)]
pub enum ScriptedResult {
    /// Capture the funds.
    Succeed,

    /// Answer with a decline carrying this reason.
    Decline(String),

    /// Fail the call with a transport/gateway error.
    Fail(ProcessorError),
}

/// Recorded processor call for assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// `"charge"` or `"refund"`.
    pub method: String,

    /// Idempotency key supplied by the caller.
    pub idempotency_key: String,

    /// Amount in minor units.
    pub amount_cents: i64,
}

#[derive(Default)]
struct MockState {
    /// Outcomes consumed front-first; empty means succeed.
    script: VecDeque<ScriptedResult>,

    /// Settled outcomes by idempotency key. Replays return the original
    /// outcome without consuming the script; the processor-side half of
    /// the idempotent-retry contract.
    settled: HashMap<String, ChargeOutcome>,

    /// Every call made, in order.
    calls: Vec<RecordedCall>,

    /// Monotonic reference counter.
    next_reference: u64,
}

/// Mock implementation of `PaymentProcessor`.
///
/// # Example
///
/// ```ignore
/// let processor = MockPaymentProcessor::new();
/// processor.script(ScriptedResult::Decline("insufficient_funds".into()));
/// processor.script(ScriptedResult::Succeed);
/// // First charge declines, second (retry) succeeds.
/// ```
#[derive(Default)]
pub struct MockPaymentProcessor {
    inner: Arc<Mutex<MockState>>,
}

impl MockPaymentProcessor {
    /// Creates a processor that approves everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next outcome.
    pub fn script(&self, result: ScriptedResult) {
        self.inner.lock().unwrap().script.push_back(result);
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Number of charge calls made so far.
    pub fn charge_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.method == "charge")
            .count()
    }

    fn settle(
        state: &mut MockState,
        method: &str,
        idempotency_key: &str,
        amount_cents: i64,
        reference_prefix: &str,
    ) -> Result<ChargeOutcome, ProcessorError> {
        state.calls.push(RecordedCall {
            method: method.to_string(),
            idempotency_key: idempotency_key.to_string(),
            amount_cents,
        });

        if let Some(outcome) = state.settled.get(idempotency_key) {
            return Ok(outcome.clone());
        }

        let result = state.script.pop_front().unwrap_or(ScriptedResult::Succeed);
        match result {
            ScriptedResult::Succeed => {
                state.next_reference += 1;
                let outcome = ChargeOutcome {
                    status: ChargeStatus::Succeeded,
                    processor_reference: format!("{}{}", reference_prefix, state.next_reference),
                };
                state
                    .settled
                    .insert(idempotency_key.to_string(), outcome.clone());
                Ok(outcome)
            }
            ScriptedResult::Decline(reason) => {
                state.next_reference += 1;
                let outcome = ChargeOutcome {
                    status: ChargeStatus::Declined { reason },
                    processor_reference: format!("{}{}", reference_prefix, state.next_reference),
                };
                state
                    .settled
                    .insert(idempotency_key.to_string(), outcome.clone());
                Ok(outcome)
            }
            // Transport faults never settle, so the key stays replayable.
            ScriptedResult::Fail(err) => Err(err),
        }
    }
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeOutcome, ProcessorError> {
        let mut state = self.inner.lock().unwrap();
        Self::settle(
            &mut state,
            "charge",
            &request.idempotency_key,
            request.amount.amount_cents,
            "ch_",
        )
    }

    async fn refund(&self, request: RefundRequest) -> Result<ChargeOutcome, ProcessorError> {
        let mut state = self.inner.lock().unwrap();
        Self::settle(
            &mut state,
            "refund",
            &request.idempotency_key,
            request.amount.amount_cents,
            "re_",
        )
    }
}
