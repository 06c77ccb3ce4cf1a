//! Transfer Orchestrator
//!
//! Moves money between two ledger accounts as a debit/credit saga with
//! at-most-once semantics per client idempotency key. See [`orchestrator`]
//! for the state discipline and [`client`] for the downstream contract.

pub mod client;
pub mod error;
pub mod handlers;
pub mod orchestrator;
pub mod store;
pub mod types;


pub use client::{CallContext, HttpLedgerClient, LedgerClient, LegRejection, LegResult, LocalLedgerClient};
pub use error::TransferError;
pub use orchestrator::{TransferOrchestrator, TransferReply};
pub use store::{InsertOutcome, MemTransferStore, PgTransferStore, TransferStore, ensure_transfer_schema};
pub use types::{LegKeys, Transfer, TransferId, TransferStatus};
