//! Prometheus metrics for the filter stage

use crate::error::{Result, StageError};
use prometheus::{
    CounterVec, Encoder, IntCounter, TextEncoder, register_counter_vec, register_int_counter,
};
use std::sync::{Mutex, OnceLock};

/// Global metrics instance
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Serializes registration so concurrent `init` calls don't register twice
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// All stage metrics
pub struct Metrics {
    /// Events received (by variant)
    pub events_received: CounterVec,

    /// Syslog messages emitted downstream
    pub events_emitted: IntCounter,

    /// Events dropped (by reason)
    pub events_dropped: CounterVec,

    /// Transform errors (by kind)
    pub transform_errors: CounterVec,

    /// Payload fields not merged because the tag already existed
    pub tag_collisions: IntCounter,
}

impl Metrics {
    /// Initialize metrics (call once at startup)
    ///
    /// Returns the existing instance if already initialized.
    pub fn init() -> Result<&'static Metrics> {
        if let Some(metrics) = METRICS.get() {
            return Ok(metrics);
        }

        let _guard = INIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(metrics) = METRICS.get() {
            return Ok(metrics);
        }

        let metrics = Metrics {
            events_received: register_counter_vec!(
                "syslog_filter_events_received_total",
                "Total events received",
                &["variant"]
            )
            .map_err(|e| StageError::Metrics(format!("events_received: {e}")))?,

            events_emitted: register_int_counter!(
                "syslog_filter_events_emitted_total",
                "Total syslog messages emitted downstream"
            )
            .map_err(|e| StageError::Metrics(format!("events_emitted: {e}")))?,

            events_dropped: register_counter_vec!(
                "syslog_filter_events_dropped_total",
                "Total events dropped",
                &["reason"]
            )
            .map_err(|e| StageError::Metrics(format!("events_dropped: {e}")))?,

            transform_errors: register_counter_vec!(
                "syslog_filter_transform_errors_total",
                "Per-event transform errors",
                &["kind"]
            )
            .map_err(|e| StageError::Metrics(format!("transform_errors: {e}")))?,

            tag_collisions: register_int_counter!(
                "syslog_filter_tag_collisions_total",
                "Payload fields skipped because the tag already existed"
            )
            .map_err(|e| StageError::Metrics(format!("tag_collisions: {e}")))?,
        };

        let _ = METRICS.set(metrics);

        METRICS
            .get()
            .ok_or_else(|| StageError::Metrics("Failed to initialize metrics".to_string()))
    }

    /// Get the global metrics instance
    ///
    /// Returns None if metrics haven't been initialized yet.
    pub fn get() -> Option<&'static Metrics> {
        METRICS.get()
    }

    /// Record a received event
    pub fn record_received(&self, variant: &str) {
        self.events_received.with_label_values(&[variant]).inc();
    }

    /// Record an emitted message
    pub fn record_emitted(&self) {
        self.events_emitted.inc();
    }

    /// Record a dropped event
    pub fn record_dropped(&self, reason: &str) {
        self.events_dropped.with_label_values(&[reason]).inc();
    }

    /// Record a transform error
    pub fn record_error(&self, kind: &str) {
        self.transform_errors.with_label_values(&[kind]).inc();
    }

    /// Record tag collisions
    pub fn record_collisions(&self, count: usize) {
        self.tag_collisions.inc_by(count as u64);
    }
}

/// Gather all metrics and encode as Prometheus text format
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_ok() {
        String::from_utf8(buffer).unwrap_or_default()
    } else {
        String::new()
    }
}

/// Record a received event if metrics are initialized
pub fn try_record_received(variant: &str) {
    if let Some(m) = Metrics::get() {
        m.record_received(variant);
    }
}

/// Record a dropped event if metrics are initialized
pub fn try_record_dropped(reason: &str) {
    if let Some(m) = Metrics::get() {
        m.record_dropped(reason);
    }
}

/// Record a transform error if metrics are initialized
pub fn try_record_error(kind: &str) {
    if let Some(m) = Metrics::get() {
        m.record_error(kind);
    }
}
