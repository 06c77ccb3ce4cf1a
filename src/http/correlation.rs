//! Correlation-ID propagation
//!
//! `X-Correlation-ID` is opaque pass-through metadata: generated when absent,
//! exposed to handlers via request extensions, echoed on the response, and
//! forwarded unchanged on every downstream ledger call. It carries no
//! semantic weight in the core algorithm.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "X-Correlation-ID";

#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

pub async fn propagate_correlation_id(mut req: Request, next: Next) -> Response {
    let cid = req
        .headers()
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(CorrelationId(cid.clone()));

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&cid) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}
