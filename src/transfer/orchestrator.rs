//! Transfer orchestration
//!
//! The transfer is a two-leg saga against the ledger: debit the source, then
//! credit the destination. Every durable write happens before the outbound
//! call it covers, so the record is always at least as pessimistic as
//! reality. If the credit leg cannot land, the already-applied debit is
//! reversed with a compensating credit under its own derived key.
//!
//! State discipline:
//! - `Failed` is only ever written when the net effect on both accounts is
//!   provably zero (debit never applied, or its reversal confirmed).
//! - `Completed` is only written when both legs are confirmed durable.
//! - Anything in between stays `Pending` and is owned by the recovery sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use super::client::{CallContext, LedgerClient, LegRejection, LegResult};
use super::error::TransferError;
use super::store::{InsertOutcome, TransferStore};
use super::types::{Transfer, TransferId, TransferStatus};
use crate::config::CompensationConfig;

/// Result of a create call, distinguishing fresh work from a replay.
#[derive(Debug)]
pub struct TransferReply {
    pub transfer: Transfer,
    pub replayed: bool,
}

pub struct TransferOrchestrator {
    store: Arc<dyn TransferStore>,
    client: Arc<dyn LedgerClient>,
    compensation: CompensationConfig,
}

impl TransferOrchestrator {
    pub fn new(
        store: Arc<dyn TransferStore>,
        client: Arc<dyn LedgerClient>,
        compensation: CompensationConfig,
    ) -> Self {
        Self {
            store,
            client,
            compensation,
        }
    }

    /// Execute (or replay) a transfer.
    pub async fn create(
        &self,
        from_account_id: i64,
        to_account_id: i64,
        amount: Decimal,
        idempotency_key: &str,
        ctx: &CallContext,
    ) -> Result<TransferReply, TransferError> {
        if idempotency_key.trim().is_empty() {
            return Err(TransferError::MissingIdempotencyKey);
        }
        if from_account_id == to_account_id {
            return Err(TransferError::Validation(
                "source and destination accounts must differ".into(),
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(TransferError::Validation("amount must be positive".into()));
        }

        let candidate = Transfer::new(
            from_account_id,
            to_account_id,
            amount,
            idempotency_key.trim().to_string(),
        );
        let fingerprint = candidate.fingerprint();

        let transfer = match self.store.insert_pending(candidate).await? {
            InsertOutcome::Inserted(t) => t,
            InsertOutcome::Exists(existing) => {
                if existing.fingerprint() != fingerprint {
                    warn!(correlation_id = %ctx.correlation_id, key = idempotency_key,
                          "idempotency key reused with different parameters");
                    return Err(TransferError::Validation(
                        "Idempotency-Key already used with different parameters".into(),
                    ));
                }
                info!(correlation_id = %ctx.correlation_id, transfer_id = %existing.id,
                      status = %existing.status, "transfer replayed");
                return Ok(TransferReply {
                    transfer: existing,
                    replayed: true,
                });
            }
        };

        info!(correlation_id = %ctx.correlation_id, transfer_id = %transfer.id,
              from = from_account_id, to = to_account_id, %amount, "transfer accepted");

        let transfer = self.run_legs(transfer, ctx).await?;
        Ok(TransferReply {
            transfer,
            replayed: false,
        })
    }

    /// Drive both legs of a Pending transfer to a terminal state.
    ///
    /// Safe to call again on the same transfer after a crash: every leg uses
    /// a derived idempotency key, so re-driving a leg that already landed
    /// comes back `AlreadyApplied` and the saga picks up where it stopped.
    async fn run_legs(&self, transfer: Transfer, ctx: &CallContext) -> Result<Transfer, TransferError> {
        let keys = transfer.leg_keys();

        // Debit leg.
        match self
            .client
            .apply_delta(transfer.from_account_id, -transfer.amount, &keys.debit, ctx)
            .await
        {
            LegResult::Applied | LegResult::AlreadyApplied => {}
            LegResult::Rejected(rejection) => {
                // Nothing applied anywhere; Failed is immediately correct.
                let err = rejection_to_error(transfer.from_account_id, rejection);
                self.store.mark_failed(transfer.id, &err.to_string()).await?;
                info!(correlation_id = %ctx.correlation_id, transfer_id = %transfer.id,
                      error = %err, "transfer failed on debit leg");
                return Err(err);
            }
            LegResult::Unavailable(msg) => {
                // The debit may have landed. Leave Pending; the recovery
                // sweep re-drives this leg with the same key.
                warn!(correlation_id = %ctx.correlation_id, transfer_id = %transfer.id,
                      error = %msg, "debit leg outcome unknown, leaving transfer pending");
                return Err(TransferError::Upstream(msg));
            }
        }

        // Credit leg.
        match self
            .client
            .apply_delta(transfer.to_account_id, transfer.amount, &keys.credit, ctx)
            .await
        {
            LegResult::Applied | LegResult::AlreadyApplied => {
                self.store
                    .mark_completed(transfer.id, &transfer.idempotency_key, &transfer.fingerprint())
                    .await?;
                info!(correlation_id = %ctx.correlation_id, transfer_id = %transfer.id,
                      "transfer completed");
                let completed = self
                    .store
                    .get(transfer.id)
                    .await?
                    .ok_or_else(|| TransferError::Internal("completed transfer vanished".into()))?;
                Ok(completed)
            }
            LegResult::Rejected(rejection) => {
                let reason = rejection_to_error(transfer.to_account_id, rejection);
                self.compensate(&transfer, &reason.to_string(), ctx).await?;
                Err(reason)
            }
            LegResult::Unavailable(msg) => {
                // The debit is durable and the credit cannot be confirmed.
                // Reverse the debit rather than strand the money.
                let reason = format!("credit leg unavailable: {msg}");
                self.compensate(&transfer, &reason, ctx).await?;
                Err(TransferError::Upstream(msg))
            }
        }
    }

    /// Reverse an applied debit, retrying until the reversal is durable.
    ///
    /// The pending flag goes down before the first reversal call so a crash
    /// mid-compensation is indistinguishable from a retry. If the attempt
    /// budget runs out the transfer is left flagged for the recovery sweep
    /// and the caller gets `CompensationPending`.
    async fn compensate(
        &self,
        transfer: &Transfer,
        reason: &str,
        ctx: &CallContext,
    ) -> Result<(), TransferError> {
        self.store
            .set_compensation_pending(transfer.id, true, Some(reason))
            .await?;

        let keys = transfer.leg_keys();
        for attempt in 1..=self.compensation.max_attempts {
            match self
                .client
                .apply_delta(transfer.from_account_id, transfer.amount, &keys.compensate, ctx)
                .await
            {
                LegResult::Applied | LegResult::AlreadyApplied => {
                    self.store.mark_failed(transfer.id, reason).await?;
                    info!(correlation_id = %ctx.correlation_id, transfer_id = %transfer.id,
                          attempt, "compensation applied, transfer failed cleanly");
                    return Ok(());
                }
                LegResult::Rejected(rejection) => {
                    // Crediting money back should never be refused; the
                    // source account has been tampered with or removed.
                    error!(correlation_id = %ctx.correlation_id, transfer_id = %transfer.id,
                           ?rejection, "compensation rejected by ledger, operator action required");
                    return Err(TransferError::CompensationPending);
                }
                LegResult::Unavailable(msg) => {
                    warn!(correlation_id = %ctx.correlation_id, transfer_id = %transfer.id,
                          attempt, max_attempts = self.compensation.max_attempts, error = %msg,
                          "compensation attempt failed");
                    if attempt < self.compensation.max_attempts {
                        tokio::time::sleep(Duration::from_millis(self.compensation.retry_delay_ms))
                            .await;
                    }
                }
            }
        }

        error!(correlation_id = %ctx.correlation_id, transfer_id = %transfer.id,
               "compensation attempts exhausted, transfer left flagged for recovery");
        Err(TransferError::CompensationPending)
    }

    pub async fn get(&self, id: TransferId) -> Result<Transfer, TransferError> {
        self.store
            .get(id)
            .await?
            .ok_or(TransferError::TransferNotFound)
    }

    pub async fn list(&self) -> Result<Vec<Transfer>, TransferError> {
        self.store.list().await
    }

    /// Resume one interrupted transfer.
    ///
    /// Flagged transfers only retry the reversal. Unflagged Pending transfers
    /// are re-driven leg by leg; derived keys make that safe whether the
    /// original attempt stopped before, between, or after the legs.
    pub async fn resume(&self, transfer: Transfer, ctx: &CallContext) -> Result<(), TransferError> {
        if transfer.status != TransferStatus::Pending {
            return Ok(());
        }

        if transfer.compensation_pending {
            let reason = transfer
                .error
                .clone()
                .unwrap_or_else(|| "credit leg failed".to_string());
            return self.compensate(&transfer, &reason, ctx).await;
        }

        // A terminal resolution (Completed or cleanly Failed) and a
        // still-Pending outcome both end this pass; run_legs already logged.
        let _ = self.run_legs(transfer, ctx).await;
        Ok(())
    }

    /// One recovery pass: re-drive every stale Pending transfer.
    ///
    /// Returns how many transfers were examined.
    pub async fn recover_stale(&self, stale_after: ChronoDuration) -> Result<usize, TransferError> {
        let stale = self.store.find_stale_pending(stale_after).await?;
        let count = stale.len();
        if count > 0 {
            info!(count, "recovery sweep found stale pending transfers");
        }
        for transfer in stale {
            let ctx = CallContext::system();
            let id = transfer.id;
            if let Err(e) = self.resume(transfer, &ctx).await {
                warn!(transfer_id = %id, error = %e, "recovery pass left transfer pending");
            }
        }
        Ok(count)
    }
}

fn rejection_to_error(account_id: i64, rejection: LegRejection) -> TransferError {
    match rejection {
        LegRejection::AccountNotFound => TransferError::AccountNotFound(account_id),
        LegRejection::InsufficientFunds => TransferError::InsufficientFunds(account_id),
        LegRejection::Invalid(msg) => TransferError::Validation(msg),
    }
}
