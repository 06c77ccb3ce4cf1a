//! Transfer core types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Transfer identifier - ULID newtype.
///
/// ULIDs are sortable and need no coordination to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferId(ulid::Ulid);

impl TransferId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

impl Serialize for TransferId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TransferId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Transfer status.
///
/// Status IDs are designed for PostgreSQL storage as SMALLINT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum TransferStatus {
    /// Orchestration in progress (or interrupted; recovery re-drives it).
    Pending = 0,
    /// Terminal: both legs durably applied.
    Completed = 1,
    /// Terminal: net effect on both accounts is zero.
    Failed = -1,
}

impl TransferStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Failed)
    }

    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(TransferStatus::Pending),
            1 => Some(TransferStatus::Completed),
            -1 => Some(TransferStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "Pending",
            TransferStatus::Completed => "Completed",
            TransferStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-leg idempotency keys derived from the client's single key.
///
/// Both legs (and the compensating reversal) target the same downstream
/// journal; reusing one raw key would make the second call collide with the
/// first leg's record and be silently skipped.
#[derive(Debug, Clone)]
pub struct LegKeys {
    pub debit: String,
    pub credit: String,
    pub compensate: String,
}

impl LegKeys {
    pub fn derive(idempotency_key: &str) -> Self {
        Self {
            debit: format!("{idempotency_key}:debit"),
            credit: format!("{idempotency_key}:credit"),
            compensate: format!("{idempotency_key}:compensate"),
        }
    }
}

/// A transfer attempt and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: TransferId,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
    pub status: TransferStatus,
    pub idempotency_key: String,
    /// Set durably before the first compensating call is issued and cleared
    /// when the reversal is confirmed. A Pending transfer with this flag is
    /// money debited with no matching credit - the recovery sweep keeps
    /// retrying the reversal until it lands.
    pub compensation_pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transfer {
    pub fn new(from_account_id: i64, to_account_id: i64, amount: Decimal, key: String) -> Self {
        let now = Utc::now();
        Self {
            id: TransferId::new(),
            from_account_id,
            to_account_id,
            amount,
            status: TransferStatus::Pending,
            idempotency_key: key,
            compensation_pending: false,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn leg_keys(&self) -> LegKeys {
        LegKeys::derive(&self.idempotency_key)
    }

    /// Journal fingerprint over the transfer's semantic inputs.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}:{}:{}",
            self.from_account_id, self.to_account_id, self.amount
        )
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transfer[{}] {} -> {} amount={} status={}",
            self.id, self.from_account_id, self.to_account_id, self.amount, self.status
        )
    }
}
