//! Downstream ledger client
//!
//! The orchestrator talks to the ledger through this trait so the saga logic
//! is identical whether the ledger runs in-process (single-binary mode) or
//! behind HTTP. Every call carries a per-leg idempotency key, which makes
//! blind retries safe: the ledger's journal collapses them into one effect.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::http::CORRELATION_HEADER;
use crate::ledger::handlers::IDEMPOTENCY_HEADER;
use crate::ledger::store::ApplyOutcome;
use crate::ledger::{LedgerError, LedgerService};

/// Request metadata forwarded opaquely on every downstream call.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub correlation_id: String,
    /// Raw bearer token from the caller, forwarded verbatim. The transfer
    /// service never inspects it.
    pub bearer_token: Option<String>,
}

impl CallContext {
    pub fn new(correlation_id: String, bearer_token: Option<String>) -> Self {
        Self {
            correlation_id,
            bearer_token,
        }
    }

    /// Context for calls the service originates itself (recovery sweep).
    pub fn system() -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            bearer_token: None,
        }
    }
}

/// Why the ledger refused a leg outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegRejection {
    AccountNotFound,
    InsufficientFunds,
    Invalid(String),
}

/// Outcome of one balance-update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegResult {
    /// The delta landed; the key is now journaled downstream.
    Applied,
    /// The key was already journaled; the delta's effect is already durable.
    AlreadyApplied,
    /// Definitive refusal. The ledger applied nothing and did not burn the key.
    Rejected(LegRejection),
    /// Transport failure or ledger-side fault. The delta may or may not have
    /// landed; only a keyed retry can tell.
    Unavailable(String),
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn apply_delta(
        &self,
        account_id: i64,
        delta: Decimal,
        idempotency_key: &str,
        ctx: &CallContext,
    ) -> LegResult;
}

// === HTTP ===

#[derive(Debug, Deserialize)]
struct LedgerErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

/// Client for a ledger service reachable over HTTP.
pub struct HttpLedgerClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpLedgerClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn apply_delta(
        &self,
        account_id: i64,
        delta: Decimal,
        idempotency_key: &str,
        ctx: &CallContext,
    ) -> LegResult {
        let url = format!("{}/accounts/{}/balance", self.base_url, account_id);

        let mut req = self
            .http
            .put(&url)
            .header(IDEMPOTENCY_HEADER, idempotency_key)
            .header(CORRELATION_HEADER, &ctx.correlation_id)
            .json(&json!({ "delta": delta }));
        if let Some(token) = &ctx.bearer_token {
            req = req.bearer_auth(token);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(correlation_id = %ctx.correlation_id, account_id, error = %e,
                      "ledger call failed in transit");
                return LegResult::Unavailable(e.to_string());
            }
        };

        match resp.status() {
            StatusCode::OK => LegResult::Applied,
            StatusCode::CONFLICT => LegResult::AlreadyApplied,
            StatusCode::NOT_FOUND => LegResult::Rejected(LegRejection::AccountNotFound),
            StatusCode::BAD_REQUEST => {
                let body: LedgerErrorBody = resp.json().await.unwrap_or(LedgerErrorBody {
                    code: "INVALID_PARAMETER".to_string(),
                    message: String::new(),
                });
                if body.code == "INSUFFICIENT_FUNDS" {
                    LegResult::Rejected(LegRejection::InsufficientFunds)
                } else {
                    LegResult::Rejected(LegRejection::Invalid(body.message))
                }
            }
            status => {
                warn!(correlation_id = %ctx.correlation_id, account_id, %status,
                      "unexpected ledger response");
                LegResult::Unavailable(format!("ledger returned {status}"))
            }
        }
    }
}

// === In-process ===

/// Client that calls a co-hosted [`LedgerService`] directly.
pub struct LocalLedgerClient {
    ledger: Arc<LedgerService>,
}

impl LocalLedgerClient {
    pub fn new(ledger: Arc<LedgerService>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl LedgerClient for LocalLedgerClient {
    async fn apply_delta(
        &self,
        account_id: i64,
        delta: Decimal,
        idempotency_key: &str,
        _ctx: &CallContext,
    ) -> LegResult {
        match self.ledger.apply_delta(account_id, delta, idempotency_key).await {
            Ok(ApplyOutcome::Applied(_)) => LegResult::Applied,
            Ok(ApplyOutcome::Duplicate { .. }) => LegResult::AlreadyApplied,
            Err(LedgerError::AccountNotFound) => LegResult::Rejected(LegRejection::AccountNotFound),
            Err(LedgerError::InsufficientFunds) => {
                LegResult::Rejected(LegRejection::InsufficientFunds)
            }
            Err(LedgerError::Validation(msg)) => LegResult::Rejected(LegRejection::Invalid(msg)),
            Err(LedgerError::Database(msg)) => LegResult::Unavailable(msg),
        }
    }
}

// === Test double ===
