//! HTTP surface: router assembly, shared state, error envelope, middleware.

pub mod correlation;
pub mod error;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};

pub use correlation::{CORRELATION_HEADER, CorrelationId};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use crate::ledger::handlers as ledger_handlers;
use crate::transfer::handlers as transfer_handlers;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/accounts",
            post(ledger_handlers::create_account).get(ledger_handlers::list_accounts),
        )
        .route("/accounts/{id}", get(ledger_handlers::get_account))
        .route(
            "/accounts/{id}/balance",
            put(ledger_handlers::update_balance),
        )
        .route(
            "/transfers",
            post(transfer_handlers::create_transfer).get(transfer_handlers::list_transfers),
        )
        .route("/transfers/{id}", get(transfer_handlers::get_transfer))
        .layer(middleware::from_fn(correlation::propagate_correlation_id))
        .with_state(state)
}
