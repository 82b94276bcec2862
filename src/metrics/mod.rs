//! Prometheus instrumentation for lock contention and save outcomes.


use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::register_histogram;
use prometheus::register_int_counter;
use prometheus::register_int_counter_vec;
use prometheus::Encoder;
use prometheus::Histogram;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::TextEncoder;
use tracing::warn;

lazy_static! {
    pub static ref LOCK_RETRY_METRIC: IntCounter = register_int_counter!(
        "session_lock_retry_total",
        "Number of lock acquisition attempts that found the lock held"
    )
    .expect("metric can not be created");

    pub static ref LOCK_HOLD_DURATION_METRIC: Histogram = register_histogram!(
        "session_lock_hold_duration_ms",
        "Histogram of session lock hold duration in ms",
        exponential_buckets(1.0, 2.0, 12).unwrap()
    )
    .expect("metric can not be created");

    pub static ref SESSION_SAVE_METRIC: IntCounterVec = register_int_counter_vec!(
        "session_save_total",
        "Session save outcomes by disposition",
        &["outcome"]
    )
    .expect("metric can not be created");
}

// Save outcome labels.
pub(crate) const OUTCOME_PERSISTED: &str = "persisted";
pub(crate) const OUTCOME_SKIPPED_CLEAN: &str = "skipped_clean";
pub(crate) const OUTCOME_SKIPPED_FORGOTTEN: &str = "skipped_forgotten";
pub(crate) const OUTCOME_DROPPED_DESTROYED: &str = "dropped_destroyed";
pub(crate) const OUTCOME_DESTROYED: &str = "destroyed";

/// Renders all registered metrics in the Prometheus text exposition format,
/// for whatever scrape endpoint the host exposes.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&prometheus::gather(), &mut buffer) {
        warn!("failed to encode metrics: {}", err);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
