/// Content filtering gate
///
/// Every outgoing message passes through a `ContentFilter` before it is
/// persisted. Blocked text never reaches the store; flagged text is
/// recorded for moderator review without interrupting the send.
///
/// The built-in `KeywordFilter` is deliberately simple. The trait is the
/// contract; a hosted moderation API can slot in behind it.

pub mod keywords;
pub mod violations;

pub use keywords::KeywordFilter;
pub use violations::{ViolationLog, ViolationRecord, VIOLATIONS_COLLECTION};

use async_trait::async_trait;

/// How a matched category is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Allowed, recorded for review
    Flag,
    /// Allowed, author warned, recorded
    Warn,
    /// Rejected before persistence
    Block,
}

/// Outcome of checking one piece of text
#[derive(Debug, Clone, PartialEq)]
pub struct FilterVerdict {
    pub is_clean: bool,
    pub should_block: bool,
    pub should_warn: bool,
    pub should_flag: bool,
    /// Matched terms
    pub violations: Vec<String>,
    /// Names of the categories that matched
    pub categories: Vec<String>,
}

impl FilterVerdict {
    pub fn clean() -> Self {
        Self {
            is_clean: true,
            should_block: false,
            should_warn: false,
            should_flag: false,
            violations: Vec::new(),
            categories: Vec::new(),
        }
    }
}

/// Text moderation boundary
#[async_trait]
pub trait ContentFilter: Send + Sync {
    async fn check(&self, text: &str) -> FilterVerdict;
}
