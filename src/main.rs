//! moneyflow - Idempotent money transfer service
//!
//! One binary hosts both services:
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌──────────────┐
//! │   HTTP   │───▶│   Transfer   │───▶│    Ledger    │
//! │  (axum)  │    │ Orchestrator │    │  ApplyDelta  │
//! └──────────┘    └──────────────┘    └──────────────┘
//!                       │                   │
//!                  transfers_tb        accounts_tb
//!                  + journal           + journal
//! ```
//!
//! With `ledger.base_url` configured the orchestrator instead calls a remote
//! ledger over HTTP; with `postgres_url` absent everything runs on the
//! in-memory stores (demo / single-process mode).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use moneyflow::config::AppConfig;
use moneyflow::http::{AppState, router};
use moneyflow::ledger::store::{MemAccountStore, PgAccountStore, ensure_ledger_schema};
use moneyflow::ledger::LedgerService;
use moneyflow::logging::init_logging;
use moneyflow::transfer::store::{MemTransferStore, PgTransferStore, ensure_transfer_schema};
use moneyflow::transfer::{HttpLedgerClient, LedgerClient, LocalLedgerClient, TransferOrchestrator};

fn get_config_path() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "config/moneyflow.yaml".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_or_default(&get_config_path());
    let _log_guard = init_logging(&config.log);

    // Stores: PostgreSQL when configured, in-memory otherwise.
    let (account_store, transfer_store): (Arc<_>, Arc<_>) = match &config.postgres_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("connecting to PostgreSQL")?;
            ensure_ledger_schema(&pool).await.context("ledger schema")?;
            ensure_transfer_schema(&pool)
                .await
                .context("transfer schema")?;
            info!("storage: PostgreSQL");
            (
                Arc::new(PgAccountStore::new(pool.clone())) as Arc<dyn moneyflow::ledger::AccountStore>,
                Arc::new(PgTransferStore::new(pool)) as Arc<dyn moneyflow::transfer::TransferStore>,
            )
        }
        None => {
            warn!("no postgres_url configured, running on in-memory stores");
            (
                Arc::new(MemAccountStore::new()) as Arc<dyn moneyflow::ledger::AccountStore>,
                Arc::new(MemTransferStore::new()) as Arc<dyn moneyflow::transfer::TransferStore>,
            )
        }
    };

    let ledger = Arc::new(LedgerService::new(account_store));

    // Ledger client: HTTP when a base URL is configured, in-process otherwise.
    let client: Arc<dyn LedgerClient> = match &config.ledger.base_url {
        Some(base_url) => {
            info!(%base_url, "ledger client: HTTP");
            Arc::new(
                HttpLedgerClient::new(
                    base_url.clone(),
                    Duration::from_millis(config.ledger.timeout_ms),
                )
                .context("building ledger HTTP client")?,
            )
        }
        None => {
            info!("ledger client: in-process");
            Arc::new(LocalLedgerClient::new(ledger.clone()))
        }
    };

    let orchestrator = Arc::new(TransferOrchestrator::new(
        transfer_store,
        client,
        config.compensation.clone(),
    ));

    // Recovery sweep for transfers interrupted by a crash or transport loss.
    if config.recovery.enabled {
        let orch = orchestrator.clone();
        let interval = Duration::from_secs(config.recovery.interval_secs);
        let stale_after = chrono::Duration::seconds(config.recovery.stale_after_secs as i64);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = orch.recover_stale(stale_after).await {
                    warn!(error = %e, "recovery sweep failed");
                }
            }
        });
        info!(
            interval_secs = config.recovery.interval_secs,
            stale_after_secs = config.recovery.stale_after_secs,
            "recovery sweep enabled"
        );
    }

    let app = router(Arc::new(AppState::new(ledger, orchestrator)));
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "moneyflow listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
