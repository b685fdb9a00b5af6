/// Application context and dependency injection
use crate::{
    chat::MessagingManager,
    config::{StoreBackendConfig, SyncConfig},
    error::SyncResult,
    filter::{ContentFilter, KeywordFilter},
    notify::NotificationManager,
    social::SocialGraphManager,
    store::{DocumentStore, MemoryStore, SqliteStore, SqliteStoreOptions},
};
use std::sync::Arc;
use tracing::info;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<SyncConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub filter: Arc<dyn ContentFilter>,
    pub notifications: Arc<NotificationManager>,
    pub social: Arc<SocialGraphManager>,
    pub messaging: Arc<MessagingManager>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: SyncConfig) -> SyncResult<Self> {
        // Validate configuration
        config.validate()?;

        // Initialize the document store backend
        let store: Arc<dyn DocumentStore> = match &config.store.backend {
            StoreBackendConfig::Memory => {
                info!("Using in-memory document store");
                Arc::new(MemoryStore::with_buffer_size(
                    config.subscriptions.buffer_size,
                ))
            }
            StoreBackendConfig::Sqlite { location } => {
                info!("Using SQLite document store at {}", location.display());
                let options = SqliteStoreOptions {
                    subscription_buffer: config.subscriptions.buffer_size,
                    ..Default::default()
                };
                Arc::new(SqliteStore::open(location, options).await?)
            }
        };

        Ok(Self::with_store(config, store))
    }

    /// Create a context around an existing store
    ///
    /// Used by tests and by embedders that manage their own backend.
    pub fn with_store(config: SyncConfig, store: Arc<dyn DocumentStore>) -> Self {
        // Initialize content filter with any configured extra words
        let filter: Arc<dyn ContentFilter> = Arc::new(KeywordFilter::with_extra_blocked(
            &config.filter.extra_blocked_words,
        ));

        // Initialize managers
        let notifications = Arc::new(NotificationManager::new(Arc::clone(&store)));
        let social = Arc::new(SocialGraphManager::new(
            Arc::clone(&store),
            Arc::clone(&notifications),
        ));
        let messaging = Arc::new(MessagingManager::new(
            Arc::clone(&store),
            Arc::clone(&filter),
            Arc::clone(&notifications),
        ));

        info!("✓ Sync context initialized");

        Self {
            config: Arc::new(config),
            store,
            filter,
            notifications,
            social,
            messaging,
        }
    }
}
