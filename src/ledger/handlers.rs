//! Account endpoints
//!
//! - `POST /accounts` - open an account (balance starts at 0)
//! - `GET /accounts`, `GET /accounts/{id}` - read
//! - `PUT /accounts/{id}/balance` - idempotent signed-delta mutation

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::models::Account;
use super::store::ApplyOutcome;
use crate::http::{ApiError, ApiResult, AppState};

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub owner: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBalanceRequest {
    pub delta: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BalanceUpdatedResponse {
    pub message: &'static str,
    pub account: Account,
}

/// Extract the required `Idempotency-Key` header.
pub(crate) fn require_idempotency_key(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ApiError::bad_request(
                "MISSING_IDEMPOTENCY_KEY",
                "Idempotency-Key header is required",
            )
        })
}

pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    let account = state.ledger.create_account(&req.owner).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Account>> {
    let account = state.ledger.get_account(id).await?;
    Ok(Json(account))
}

pub async fn list_accounts(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Account>>> {
    let accounts = state.ledger.list_accounts().await?;
    Ok(Json(accounts))
}

/// PUT /accounts/{id}/balance
///
/// The idempotency contract surfaces here as 409: a replayed key gets a
/// DUPLICATE_REQUEST conflict and no balance change. Callers that want the
/// applied result must read the account back.
pub async fn update_balance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<UpdateBalanceRequest>,
) -> ApiResult<Json<BalanceUpdatedResponse>> {
    let key = require_idempotency_key(&headers)?;

    match state.ledger.apply_delta(id, req.delta, &key).await? {
        ApplyOutcome::Applied(account) => Ok(Json(BalanceUpdatedResponse {
            message: "Balance updated",
            account,
        })),
        ApplyOutcome::Duplicate { .. } => {
            Err(ApiError::conflict("DUPLICATE_REQUEST", "Duplicate request"))
        }
    }
}
