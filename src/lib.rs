/// AmaPlayer real-time sync engine
///
/// Client-side synchronization for chat and the social graph over an
/// abstract real-time document store. Managers expose live views that
/// follow store changes; writes pass content filtering and guest
/// gating before anything is persisted.
pub mod chat;
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod identity;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod notify;
pub mod social;
pub mod store;
pub mod sync;

pub use config::SyncConfig;
pub use context::AppContext;
pub use error::{SyncError, SyncResult};
