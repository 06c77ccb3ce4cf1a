//! Transfer endpoints
//!
//! - `POST /transfers` - execute (or replay) a transfer
//! - `GET /transfers`, `GET /transfers/{id}` - read

use std::str::FromStr;
use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode, header};
use axum::{Extension, Json};
use axum::extract::{Path, State};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::error::TransferError;
use super::types::{Transfer, TransferId};
use crate::http::{ApiError, ApiResult, AppState, CorrelationId};
use crate::ledger::handlers::require_idempotency_key;
use crate::transfer::client::CallContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferRequest {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
}

/// Extract the bearer token, forwarded verbatim to the ledger.
fn require_bearer_token(headers: &HeaderMap) -> Result<String, TransferError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or(TransferError::Unauthorized)
}

/// POST /transfers
///
/// A replayed idempotency key returns the original transfer with 200; fresh
/// work returns 201. Either way the body is the current transfer record.
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Extension(correlation): Extension<CorrelationId>,
    headers: HeaderMap,
    Json(req): Json<CreateTransferRequest>,
) -> ApiResult<(StatusCode, Json<Transfer>)> {
    let key = require_idempotency_key(&headers)?;
    let token = require_bearer_token(&headers)?;
    let ctx = CallContext::new(correlation.0, Some(token));

    let reply = state
        .orchestrator
        .create(req.from_account_id, req.to_account_id, req.amount, &key, &ctx)
        .await?;

    let status = if reply.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(reply.transfer)))
}

pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Transfer>> {
    let id = TransferId::from_str(&id)
        .map_err(|_| ApiError::not_found("TRANSFER_NOT_FOUND", "Transfer not found"))?;
    let transfer = state.orchestrator.get(id).await?;
    Ok(Json(transfer))
}

pub async fn list_transfers(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Transfer>>> {
    let transfers = state.orchestrator.list().await?;
    Ok(Json(transfers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_require_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            require_bearer_token(&headers),
            Err(TransferError::Unauthorized)
        ));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            require_bearer_token(&headers),
            Err(TransferError::Unauthorized)
        ));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(matches!(
            require_bearer_token(&headers),
            Err(TransferError::Unauthorized)
        ));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tok-123"),
        );
        assert_eq!(require_bearer_token(&headers).unwrap(), "tok-123");
    }
}
