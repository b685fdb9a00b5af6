/// Metrics and telemetry for AmaPlayer sync
///
/// Prometheus-compatible metrics for monitoring:
/// - Live subscription counts and snapshot deliveries
/// - Document writes by collection
/// - Messages sent, blocked, edited, deleted
/// - Social graph mutations
/// - Notification delivery and background jobs

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // ========== Subscription Metrics ==========

    /// Live query subscriptions currently open
    pub static ref SUBSCRIPTIONS_ACTIVE: IntGauge = register_int_gauge!(
        "sync_subscriptions_active",
        "Number of live query subscriptions currently open"
    )
    .unwrap();

    /// Snapshots delivered to subscribers by collection
    pub static ref SNAPSHOTS_DELIVERED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "sync_snapshots_delivered_total",
        "Total number of query snapshots delivered to subscribers",
        &["collection"]
    )
    .unwrap();

    /// Live query re-evaluations that failed
    pub static ref LIVE_QUERY_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "sync_live_query_failures_total",
        "Total number of failed live query evaluations",
        &["collection"]
    )
    .unwrap();

    // ========== Store Metrics ==========

    /// Document writes by operation and collection
    pub static ref DOCUMENTS_WRITTEN_TOTAL: IntCounterVec = register_int_counter_vec!(
        "store_documents_written_total",
        "Total number of document writes",
        &["operation", "collection"]
    )
    .unwrap();

    // ========== Chat Metrics ==========

    /// Messages sent
    pub static ref MESSAGES_SENT_TOTAL: IntCounter = register_int_counter!(
        "chat_messages_sent_total",
        "Total number of messages sent"
    )
    .unwrap();

    /// Messages rejected by the content filter, by category
    pub static ref MESSAGES_BLOCKED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "chat_messages_blocked_total",
        "Total number of messages rejected by the content filter",
        &["category"]
    )
    .unwrap();

    /// Message edits
    pub static ref MESSAGES_EDITED_TOTAL: IntCounter = register_int_counter!(
        "chat_messages_edited_total",
        "Total number of message edits"
    )
    .unwrap();

    /// Message deletions by scope
    pub static ref MESSAGES_DELETED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "chat_messages_deleted_total",
        "Total number of message deletions",
        &["scope"]
    )
    .unwrap();

    // ========== Social Graph Metrics ==========

    /// Social graph mutations by action
    pub static ref SOCIAL_MUTATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "social_mutations_total",
        "Total number of social graph mutations",
        &["action"]
    )
    .unwrap();

    // ========== Notification Metrics ==========

    /// Notifications created by kind
    pub static ref NOTIFICATIONS_CREATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "notifications_created_total",
        "Total number of notifications created",
        &["kind"]
    )
    .unwrap();

    /// Best-effort notification deliveries that failed
    pub static ref NOTIFICATION_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "notification_failures_total",
        "Total number of failed notification deliveries"
    )
    .unwrap();

    // ========== Moderation Metrics ==========

    /// Content violations recorded by category
    pub static ref CONTENT_VIOLATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "content_violations_total",
        "Total number of content violations recorded",
        &["category"]
    )
    .unwrap();

    // ========== Background Job Metrics ==========

    /// Background job executions by job type and status
    pub static ref BACKGROUND_JOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "background_jobs_total",
        "Total number of background job executions",
        &["job_type", "status"]
    )
    .unwrap();

    /// Background job duration in seconds
    pub static ref BACKGROUND_JOB_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "background_job_duration_seconds",
        "Background job execution time in seconds",
        &["job_type"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Record a delivered query snapshot
pub fn record_snapshot_delivered(collection: &str) {
    SNAPSHOTS_DELIVERED_TOTAL
        .with_label_values(&[collection])
        .inc();
}

/// Record a failed live query evaluation
pub fn record_live_query_failure(collection: &str) {
    LIVE_QUERY_FAILURES_TOTAL
        .with_label_values(&[collection])
        .inc();
}

/// Record a document write
pub fn record_document_write(operation: &str, collection: &str) {
    DOCUMENTS_WRITTEN_TOTAL
        .with_label_values(&[operation, collection])
        .inc();
}

/// Record a sent message
pub fn record_message_sent() {
    MESSAGES_SENT_TOTAL.inc();
}

/// Record a blocked message
pub fn record_message_blocked(categories: &[String]) {
    for category in categories {
        MESSAGES_BLOCKED_TOTAL.with_label_values(&[category]).inc();
    }
}

/// Record a message edit
pub fn record_message_edited() {
    MESSAGES_EDITED_TOTAL.inc();
}

/// Record a message deletion
pub fn record_message_deleted(scope: &str) {
    MESSAGES_DELETED_TOTAL.with_label_values(&[scope]).inc();
}

/// Record a social graph mutation
pub fn record_social_mutation(action: &str) {
    SOCIAL_MUTATIONS_TOTAL.with_label_values(&[action]).inc();
}

/// Record a created notification
pub fn record_notification(kind: &str) {
    NOTIFICATIONS_CREATED_TOTAL
        .with_label_values(&[kind])
        .inc();
}

/// Record a failed notification delivery
pub fn record_notification_failure() {
    NOTIFICATION_FAILURES_TOTAL.inc();
}

/// Record a content violation
pub fn record_content_violation(category: &str) {
    CONTENT_VIOLATIONS_TOTAL
        .with_label_values(&[category])
        .inc();
}

/// Record a background job execution
pub fn record_background_job(job_type: &str, status: &str, duration: f64) {
    BACKGROUND_JOBS_TOTAL
        .with_label_values(&[job_type, status])
        .inc();
    BACKGROUND_JOB_DURATION_SECONDS
        .with_label_values(&[job_type])
        .observe(duration);
}
