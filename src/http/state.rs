//! Shared application state

use std::sync::Arc;

use crate::ledger::LedgerService;
use crate::transfer::TransferOrchestrator;

pub struct AppState {
    pub ledger: Arc<LedgerService>,
    pub orchestrator: Arc<TransferOrchestrator>,
}

impl AppState {
    pub fn new(ledger: Arc<LedgerService>, orchestrator: Arc<TransferOrchestrator>) -> Self {
        Self {
            ledger,
            orchestrator,
        }
    }
}
