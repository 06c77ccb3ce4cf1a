//! Ledger service layer
//!
//! Validates ApplyDelta inputs and delegates the atomic mutation to the
//! store. The journal fingerprint is derived here from the operation's
//! semantic inputs so a replayed key can be traced back to what it covered.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::error::LedgerError;
use super::models::Account;
use super::store::{AccountStore, ApplyOutcome};

pub struct LedgerService {
    store: Arc<dyn AccountStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    pub async fn create_account(&self, owner: &str) -> Result<Account, LedgerError> {
        if owner.trim().is_empty() {
            return Err(LedgerError::Validation("owner must not be empty".into()));
        }
        let account = self.store.create(owner.trim()).await?;
        info!(account_id = account.id, owner = %account.owner, "Account created");
        Ok(account)
    }

    pub async fn get_account(&self, id: i64) -> Result<Account, LedgerError> {
        self.store
            .get(id)
            .await?
            .ok_or(LedgerError::AccountNotFound)
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.store.list().await
    }

    /// Apply a signed delta to an account, at most once per idempotency key.
    pub async fn apply_delta(
        &self,
        id: i64,
        delta: Decimal,
        idempotency_key: &str,
    ) -> Result<ApplyOutcome, LedgerError> {
        if idempotency_key.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Idempotency-Key is required".into(),
            ));
        }
        if delta.is_zero() {
            return Err(LedgerError::Validation("delta must be non-zero".into()));
        }

        let fingerprint = format!("{}:{}", id, delta);
        let outcome = self
            .store
            .apply_delta(id, delta, idempotency_key.trim(), &fingerprint)
            .await?;

        match &outcome {
            ApplyOutcome::Applied(account) => {
                info!(
                    account_id = id,
                    %delta,
                    balance = %account.balance,
                    key = idempotency_key,
                    "Delta applied"
                );
            }
            ApplyOutcome::Duplicate { fingerprint: seen } => {
                warn!(
                    account_id = id,
                    key = idempotency_key,
                    fingerprint = %seen,
                    "Duplicate request, balance untouched"
                );
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::store::MemAccountStore;
    use std::str::FromStr;

    fn service() -> LedgerService {
        LedgerService::new(Arc::new(MemAccountStore::new()))
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_create_account_rejects_blank_owner() {
        let svc = service();
        let err = svc.create_account("   ").await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_zero_delta_rejected_before_store() {
        let svc = service();
        let acc = svc.create_account("alice").await.unwrap();
        let err = svc.apply_delta(acc.id, d("0"), "k1").await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let svc = service();
        let acc = svc.create_account("alice").await.unwrap();
        let err = svc.apply_delta(acc.id, d("5"), "  ").await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_apply_then_replay() {
        let svc = service();
        let acc = svc.create_account("alice").await.unwrap();

        let first = svc.apply_delta(acc.id, d("40"), "k1").await.unwrap();
        let ApplyOutcome::Applied(updated) = first else {
            panic!("expected applied");
        };
        assert_eq!(updated.balance, d("40"));

        let replay = svc.apply_delta(acc.id, d("40"), "k1").await.unwrap();
        assert!(replay.is_duplicate());
        assert_eq!(svc.get_account(acc.id).await.unwrap().balance, d("40"));
    }
}
