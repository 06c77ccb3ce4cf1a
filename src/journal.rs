//! Idempotency Journal
//!
//! A durable, uniquely-keyed record of operations already performed. The
//! uniqueness constraint is the mechanism that turns a duplicate retry into a
//! safe no-op, and the arbiter when two concurrent requests race on one key.
//!
//! The ledger service and the transfer service each own an independent
//! journal (separate tables); a key is only unique within one service's
//! scope. That boundary is deliberate: each service guarantees idempotency
//! only for operations it performs itself.
//!
//! The journal is never consulted on its own: stores fold the put-if-absent
//! into the same atomic unit as the mutation it covers. Postgres stores call
//! [`pg_put_if_absent`] inside their transaction; in-memory stores use
//! [`MemJournal`] under their own lock.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Ledger-side journal table.
pub const LEDGER_JOURNAL_TB: &str = "ledger_journal_tb";
/// Transfer-side journal table.
pub const TRANSFER_JOURNAL_TB: &str = "transfer_journal_tb";

#[derive(Debug, Error)]
#[error("journal error: {0}")]
pub struct JournalError(pub String);

impl From<sqlx::Error> for JournalError {
    fn from(e: sqlx::Error) -> Self {
        JournalError(e.to_string())
    }
}

/// Outcome of a put-if-absent attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// The key was new; the record is now durable.
    Inserted,
    /// The key was already journaled; carries the existing fingerprint.
    AlreadyExists(String),
}

// === PostgreSQL ===

/// Insert a journal record inside an existing transaction.
///
/// `ON CONFLICT DO NOTHING` on the primary key makes the storage layer the
/// sole arbiter: the loser of a race sees zero rows affected. Callers that
/// need all-or-nothing semantics with a balance update run this in the same
/// transaction, so an aborted mutation takes the journal record down with it.
///
/// On `AlreadyExists` the fingerprint echoed back is the caller's own; the
/// winner's fingerprint lives in the table and must be re-read outside the
/// (about to roll back) transaction.
pub async fn pg_put_if_absent<'e, E>(
    executor: E,
    table: &str,
    key: &str,
    fingerprint: &str,
) -> Result<PutOutcome, JournalError>
where
    E: sqlx::PgExecutor<'e>,
{
    let result = sqlx::query(&format!(
        "INSERT INTO {table} (key, fingerprint, created_at) VALUES ($1, $2, NOW()) \
         ON CONFLICT (key) DO NOTHING"
    ))
    .bind(key)
    .bind(fingerprint)
    .execute(executor)
    .await?;

    if result.rows_affected() > 0 {
        Ok(PutOutcome::Inserted)
    } else {
        Ok(PutOutcome::AlreadyExists(fingerprint.to_string()))
    }
}

// === In-memory ===

/// In-memory journal for single-process mode and tests.
///
/// The API is synchronous: the owning store already holds its own lock when
/// it consults the journal, which is what makes check + mutate + insert one
/// atomic unit.
pub struct MemJournal {
    records: Mutex<HashMap<String, String>>,
}

impl MemJournal {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn put_if_absent(&self, key: &str, fingerprint: &str) -> PutOutcome {
        let mut records = self.records.lock().unwrap();
        match records.get(key) {
            Some(existing) => PutOutcome::AlreadyExists(existing.clone()),
            None => {
                records.insert(key.to_string(), fingerprint.to_string());
                PutOutcome::Inserted
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.records.lock().unwrap().get(key).cloned()
    }
}

impl Default for MemJournal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_if_absent_then_replay() {
        let journal = MemJournal::new();

        let first = journal.put_if_absent("k1", "1:40");
        assert_eq!(first, PutOutcome::Inserted);

        let replay = journal.put_if_absent("k1", "1:40");
        assert_eq!(replay, PutOutcome::AlreadyExists("1:40".to_string()));
    }

    #[test]
    fn test_replay_returns_original_fingerprint() {
        let journal = MemJournal::new();
        journal.put_if_absent("k1", "1:40");

        // A replay with different inputs still reports the first fingerprint.
        let replay = journal.put_if_absent("k1", "1:999");
        assert_eq!(replay, PutOutcome::AlreadyExists("1:40".to_string()));
        assert_eq!(journal.get("k1"), Some("1:40".to_string()));
    }

    #[test]
    fn test_keys_are_independent() {
        let journal = MemJournal::new();
        assert_eq!(journal.put_if_absent("a", "f"), PutOutcome::Inserted);
        assert_eq!(journal.put_if_absent("b", "f"), PutOutcome::Inserted);
        assert_eq!(journal.get("c"), None);
    }
}
