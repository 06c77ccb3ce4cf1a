//! Ledger error types

use thiserror::Error;

use crate::journal::JournalError;

#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    #[error("Invalid parameter: {0}")]
    Validation(String),

    #[error("Account not found")]
    AccountNotFound,

    #[error("Insufficient balance")]
    InsufficientFunds,

    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Stable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "INVALID_PARAMETER",
            LedgerError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            LedgerError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            LedgerError::Database(_) => "DATABASE_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::Validation(_) | LedgerError::InsufficientFunds => 400,
            LedgerError::AccountNotFound => 404,
            LedgerError::Database(_) => 500,
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::Database(e.to_string())
    }
}

impl From<JournalError> for LedgerError {
    fn from(e: JournalError) -> Self {
        LedgerError::Database(e.to_string())
    }
}
