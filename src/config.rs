use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub http: HttpConfig,
    /// PostgreSQL connection URL. When absent the service runs on the
    /// in-memory stores (single-process mode).
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub compensation: CompensationConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogConfig {
    pub level: String,
    pub dir: String,
    pub file: String,
    pub use_json: bool,
    pub rotation: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "./logs".to_string(),
            file: "moneyflow.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// How the orchestrator reaches the Account Ledger.
///
/// With `base_url` set the debit/credit legs go over HTTP (the ledger runs as
/// its own service). Without it both services share the process and the
/// orchestrator calls the ledger directly.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LedgerConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5_000
}

/// Retry policy for the compensating delta after a failed credit leg.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CompensationConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay_ms: 200,
        }
    }
}

/// Background sweep for transfers stuck in PENDING (crash or transport loss).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecoveryConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    /// A PENDING transfer older than this is considered stale.
    pub stale_after_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            stale_after_secs: 60,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            http: HttpConfig::default(),
            postgres_url: None,
            ledger: LedgerConfig::default(),
            compensation: CompensationConfig::default(),
            recovery: RecoveryConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from path if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Self {
        match Self::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("config {} not loaded ({}), using defaults", path, e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.http.port, 8080);
        assert!(config.postgres_url.is_none());
        assert!(config.ledger.base_url.is_none());
        assert_eq!(config.compensation.max_attempts, 5);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
http:
  host: 127.0.0.1
  port: 9000
ledger:
  base_url: "http://account-service:8080"
  timeout_ms: 2000
compensation:
  max_attempts: 3
  retry_delay_ms: 50
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.http.port, 9000);
        assert_eq!(
            config.ledger.base_url.as_deref(),
            Some("http://account-service:8080")
        );
        assert_eq!(config.ledger.timeout_ms, 2000);
        assert_eq!(config.compensation.max_attempts, 3);
        // Blocks not present fall back to defaults
        assert_eq!(config.log.level, "info");
        assert!(config.recovery.enabled);
    }
}
