/// Logging initialization
///
/// Embedding applications call `init` once at startup. `RUST_LOG` wins
/// over the configured level so operators can override verbosity
/// without a config change.
use crate::config::LoggingConfig;
use crate::error::{SyncError, SyncResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init(config: &LoggingConfig) -> SyncResult<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("amaplayer_sync={}", config.level))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| SyncError::Internal(format!("Failed to initialize logging: {}", e)))
}
