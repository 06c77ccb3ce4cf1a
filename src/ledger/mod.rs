//! Account Ledger service
//!
//! Holds account balances and exposes one mutating operation, ApplyDelta,
//! which applies a signed delta to an account at most once per idempotency
//! key and rejects balances going negative.

pub mod error;
pub mod handlers;
pub mod models;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use error::LedgerError;
pub use models::Account;
pub use service::LedgerService;
pub use store::{AccountStore, ApplyOutcome, MemAccountStore, PgAccountStore};
