//! Transfer error types

use thiserror::Error;

use crate::journal::JournalError;

#[derive(Error, Debug, Clone)]
pub enum TransferError {
    #[error("Invalid parameter: {0}")]
    Validation(String),

    #[error("Idempotency-Key header is required")]
    MissingIdempotencyKey,

    #[error("Missing or invalid Authorization header")]
    Unauthorized,

    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    #[error("Insufficient balance in account {0}")]
    InsufficientFunds(i64),

    #[error("Transfer not found")]
    TransferNotFound,

    #[error("Ledger unavailable: {0}")]
    Upstream(String),

    #[error("Transfer could not complete; reversal of the debit is still in progress")]
    CompensationPending,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransferError {
    /// Stable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::Validation(_) => "INVALID_PARAMETER",
            TransferError::MissingIdempotencyKey => "MISSING_IDEMPOTENCY_KEY",
            TransferError::Unauthorized => "UNAUTHORIZED",
            TransferError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            TransferError::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            TransferError::TransferNotFound => "TRANSFER_NOT_FOUND",
            TransferError::Upstream(_) => "LEDGER_UNAVAILABLE",
            TransferError::CompensationPending => "COMPENSATION_PENDING",
            TransferError::Database(_) => "DATABASE_ERROR",
            TransferError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::Validation(_)
            | TransferError::MissingIdempotencyKey
            | TransferError::AccountNotFound(_)
            | TransferError::InsufficientFunds(_) => 400,
            TransferError::Unauthorized => 401,
            TransferError::TransferNotFound => 404,
            TransferError::Upstream(_) | TransferError::CompensationPending => 502,
            TransferError::Database(_) | TransferError::Internal(_) => 500,
        }
    }
}

impl From<sqlx::Error> for TransferError {
    fn from(e: sqlx::Error) -> Self {
        TransferError::Database(e.to_string())
    }
}

impl From<JournalError> for TransferError {
    fn from(e: JournalError) -> Self {
        TransferError::Database(e.to_string())
    }
}
