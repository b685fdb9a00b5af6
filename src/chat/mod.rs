/// Messaging Sync
///
/// Direct messages over the document store: the merged two-direction
/// live view, per-thread filtering, filtered sends, edits, and scoped
/// deletion.

pub mod entities;
pub mod manager;

pub use entities::{DeleteScope, Message, MessageActions, MESSAGES_COLLECTION};
pub use manager::MessagingManager;
