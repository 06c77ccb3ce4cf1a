//! Account data model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A ledger account.
///
/// `balance >= 0` at all times; the invariant is enforced at mutation time by
/// [`AccountStore::apply_delta`](super::store::AccountStore), never by
/// post-hoc correction. Accounts open with a zero balance and are only ever
/// mutated through ApplyDelta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub owner: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(id: i64, owner: String) -> Self {
        Self {
            id,
            owner,
            balance: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }
}
