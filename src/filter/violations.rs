/// Violation logging
///
/// Flagged content is recorded for moderator review. Recording is
/// best-effort: a failed write is logged and swallowed so it can never
/// interrupt the action that triggered it.
use crate::filter::FilterVerdict;
use crate::store::{Document, DocumentStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

pub const VIOLATIONS_COLLECTION: &str = "content_violations";

/// Excerpt length kept in violation records
const EXCERPT_MAX_CHARS: usize = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRecord {
    #[serde(default)]
    pub id: String,
    pub author_id: String,
    pub excerpt: String,
    pub violations: Vec<String>,
    pub categories: Vec<String>,
    pub blocked: bool,
    pub timestamp: DateTime<Utc>,
}

pub struct ViolationLog {
    store: Arc<dyn DocumentStore>,
}

impl ViolationLog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Record a flagged message. Never fails the caller.
    pub async fn record(&self, author_id: &str, text: &str, verdict: &FilterVerdict) {
        let record = ViolationRecord {
            id: String::new(),
            author_id: author_id.to_string(),
            excerpt: text.chars().take(EXCERPT_MAX_CHARS).collect(),
            violations: verdict.violations.clone(),
            categories: verdict.categories.clone(),
            blocked: verdict.should_block,
            timestamp: Utc::now(),
        };

        for category in &verdict.categories {
            crate::metrics::record_content_violation(category);
        }
        warn!(
            "Content violation by {}: categories {:?}",
            author_id, verdict.categories
        );

        let fields = match Document::encode(&record) {
            Ok(fields) => fields,
            Err(e) => {
                warn!("Failed to encode violation record: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.create(VIOLATIONS_COLLECTION, fields).await {
            warn!("Failed to record content violation: {}", e);
        }
    }
}
