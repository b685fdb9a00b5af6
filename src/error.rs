/// Unified error types for AmaPlayer sync
use thiserror::Error;

/// Main error type for the sync engine
#[derive(Error, Debug)]
pub enum SyncError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Document encoding/decoding errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store-level errors not tied to a specific backend failure
    #[error("Store error: {0}")]
    Store(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate document)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Message text rejected by the content filter
    #[error("Content blocked: {0}")]
    ContentBlocked(String),

    /// Message mutation attempted by someone other than its sender
    #[error("Not the message sender: {0}")]
    NotMessageSender(String),

    /// Write attempted by a guest identity
    #[error("Guests cannot perform this action: {0}")]
    GuestRestricted(String),

    /// Live subscription channel closed
    #[error("Subscription closed")]
    SubscriptionClosed,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
