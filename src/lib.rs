//! moneyflow - Idempotent money transfer service
//!
//! Two cooperating services behind one crate:
//!
//! - [`ledger`] - account balances and the idempotent ApplyDelta mutation
//! - [`transfer`] - the transfer saga: debit, credit, compensate, record
//!
//! # Modules
//!
//! - [`config`] - YAML application configuration
//! - [`logging`] - tracing subscriber setup
//! - [`journal`] - durable put-if-absent idempotency journal
//! - [`ledger`] - Account Ledger service (store, service, HTTP handlers)
//! - [`transfer`] - Transfer Orchestrator (store, ledger client, saga)
//! - [`http`] - router assembly, shared state, error envelope, middleware

pub mod config;
pub mod http;
pub mod journal;
pub mod ledger;
pub mod logging;
pub mod transfer;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use journal::{MemJournal, PutOutcome};
pub use ledger::{Account, ApplyOutcome, LedgerError, LedgerService};
pub use transfer::{
    Transfer, TransferError, TransferId, TransferOrchestrator, TransferStatus,
};
