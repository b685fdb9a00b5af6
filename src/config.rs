/// Configuration management for AmaPlayer sync
use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main sync engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub store: StoreConfig,
    pub subscriptions: SubscriptionConfig,
    pub filter: FilterConfig,
    pub jobs: JobConfig,
    pub logging: LoggingConfig,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackendConfig,
}

/// Store backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreBackendConfig {
    /// Keep all documents in process memory (default; used by tests)
    Memory,

    /// Persist documents in a local SQLite database
    Sqlite { location: PathBuf },
}

/// Live subscription configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// Snapshot buffer size per subscription before backpressure kicks in
    pub buffer_size: usize,
}

/// Content filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Additional blocked words layered on top of the built-in lists
    /// (comma-separated in the environment)
    pub extra_blocked_words: Vec<String>,
}

/// Background job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Enable the friendship reconciliation pass
    pub reconcile_enabled: bool,
    /// Seconds between reconciliation runs
    pub reconcile_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                backend: StoreBackendConfig::Memory,
            },
            subscriptions: SubscriptionConfig { buffer_size: 100 },
            filter: FilterConfig {
                extra_blocked_words: Vec::new(),
            },
            jobs: JobConfig {
                reconcile_enabled: true,
                reconcile_interval_secs: 900,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> SyncResult<Self> {
        dotenv::dotenv().ok();

        let backend = match env::var("AMA_STORE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => StoreBackendConfig::Memory,
            "sqlite" => StoreBackendConfig::Sqlite {
                location: env::var("AMA_STORE_DB_LOCATION")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./data/amaplayer.sqlite")),
            },
            other => {
                return Err(SyncError::Validation(format!(
                    "Unknown store backend: {}",
                    other
                )))
            }
        };

        let buffer_size = env::var("AMA_SUBSCRIPTION_BUFFER")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .map_err(|_| SyncError::Validation("Invalid subscription buffer size".to_string()))?;

        // Parse extra blocked words from comma-separated list
        let extra_blocked_words = env::var("AMA_FILTER_EXTRA_BLOCKED")
            .unwrap_or_else(|_| String::new())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<String>>();

        let reconcile_enabled = env::var("AMA_RECONCILE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        let reconcile_interval_secs = env::var("AMA_RECONCILE_INTERVAL_SECS")
            .unwrap_or_else(|_| "900".to_string())
            .parse()
            .unwrap_or(900);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(SyncConfig {
            store: StoreConfig { backend },
            subscriptions: SubscriptionConfig { buffer_size },
            filter: FilterConfig {
                extra_blocked_words,
            },
            jobs: JobConfig {
                reconcile_enabled,
                reconcile_interval_secs,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> SyncResult<()> {
        if self.subscriptions.buffer_size == 0 {
            return Err(SyncError::Validation(
                "Subscription buffer size must be at least 1".to_string(),
            ));
        }

        if self.jobs.reconcile_interval_secs == 0 {
            return Err(SyncError::Validation(
                "Reconciliation interval must be at least 1 second".to_string(),
            ));
        }

        if let StoreBackendConfig::Sqlite { location } = &self.store.backend {
            if location.as_os_str().is_empty() {
                return Err(SyncError::Validation(
                    "SQLite store location cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert!(matches!(config.store.backend, StoreBackendConfig::Memory));
        assert_eq!(config.subscriptions.buffer_size, 100);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let mut config = SyncConfig::default();
        config.subscriptions.buffer_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = SyncConfig::default();
        config.jobs.reconcile_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_sqlite_location_rejected() {
        let mut config = SyncConfig::default();
        config.store.backend = StoreBackendConfig::Sqlite {
            location: PathBuf::new(),
        };
        assert!(config.validate().is_err());
    }
}
