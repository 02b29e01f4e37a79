//! Syslog filter - dispatches events and emits structured syslog messages
//!
//! # Message Flow
//!
//! ```text
//! Event ──► stop-processing? ──► CEE envelope ──► structure ──► SyslogMessage
//!              │ yes                 │ (if cee-json-key set)
//!              ▼                     ├─► plain: copy payload to message key
//!           dropped                  └─► container: flatten + merge + annotate
//! ```
//!
//! Per-event failures are logged and counted; none of them stop the worker.

use crate::cee::{CeeEnvelope, CeeReport};
use crate::config::FilterConfig;
use crate::error::{Result, StageError};
use crate::metrics::{Metrics, try_record_dropped, try_record_error, try_record_received};
use crate::structure;
use syslog_cee_core::{
    Base, ContainerMessage, Event, OtherEvent, PlainMessage, SyslogMessage, Tags, TransformError,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

/// Default stage name recorded in `source_path`
pub const DEFAULT_NAME: &str = "syslog";

/// The transformation stage
///
/// # Example
///
/// ```ignore
/// let filter = SyslogFilter::new(FilterConfig::default().cee_json_key("msg"));
/// let (event_tx, event_rx) = tokio::sync::mpsc::channel(1024);
/// let (syslog_tx, syslog_rx) = tokio::sync::mpsc::channel(1024);
/// tokio::spawn(filter.run(event_rx, syslog_tx));
/// ```
pub struct SyslogFilter {
    name: String,
    config: FilterConfig,
    cee: Option<CeeEnvelope>,
}

impl SyslogFilter {
    /// Create a filter named [`DEFAULT_NAME`]
    pub fn new(config: FilterConfig) -> Self {
        let cee = config
            .cee_enabled()
            .then(|| CeeEnvelope::new(config.cee_json_key.clone()));
        Self {
            name: DEFAULT_NAME.to_string(),
            config,
            cee,
        }
    }

    /// Set the stage name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Stage name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active configuration
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Transform one event
    ///
    /// Returns `None` when the event is dropped: stop-processing signal,
    /// unhandled variant, or a serialization failure.
    pub fn process(&self, event: Event) -> Option<SyslogMessage> {
        try_record_received(event.variant());

        match event {
            Event::Plain(msg) => {
                trace!(id = %msg.base.id, "received plain message");
                self.process_plain(msg)
            }
            Event::Container(msg) => {
                trace!(id = %msg.base.id, "received container message");
                self.process_container(msg)
            }
            Event::Other(other) => {
                self.unhandled(other);
                None
            }
        }
    }

    fn process_plain(&self, msg: PlainMessage) -> Option<SyslogMessage> {
        let PlainMessage { base, mut tags } = msg;
        if self.stopped(&base) {
            return None;
        }

        let annotate_meta = self.config.annotate_docker_meta;
        let is_cee = self.apply_cee(&base, |cee| cee.plain(&mut tags, annotate_meta))?;

        Some(self.finish(&base, &tags, is_cee, None))
    }

    fn process_container(&self, msg: ContainerMessage) -> Option<SyslogMessage> {
        let ContainerMessage {
            base,
            mut tags,
            container,
            engine,
        } = msg;
        if self.stopped(&base) {
            return None;
        }

        let is_cee = self.apply_cee(&base, |cee| cee.container(&mut tags, &container, &engine))?;

        let host = self
            .config
            .engine_name_to_host
            .then_some(engine.name.as_str());
        Some(self.finish(&base, &tags, is_cee, host))
    }

    fn stopped(&self, base: &Base) -> bool {
        if base.stop_processing(&self.name, &self.config.inputs) {
            debug!(
                id = %base.id,
                source = %base.source_id,
                last_hop = base.last_hop().unwrap_or("-"),
                "stop processing"
            );
            try_record_dropped("stop_processing");
            return true;
        }
        false
    }

    /// Run the CEE step if configured
    ///
    /// Returns `Some(is_cee)` to continue, `None` to skip the event.
    fn apply_cee<F>(&self, base: &Base, build: F) -> Option<bool>
    where
        F: FnOnce(&CeeEnvelope) -> std::result::Result<CeeReport, TransformError>,
    {
        let Some(cee) = self.cee.as_ref() else {
            return Some(false);
        };
        match build(cee) {
            Ok(report) => {
                self.log_report(base, &report);
                Some(true)
            }
            Err(e @ TransformError::MissingKey { .. }) => {
                error!(id = %base.id, error = %e, "CEE key not found, forwarding without CEE");
                try_record_error(e.kind());
                Some(false)
            }
            Err(e) => {
                error!(id = %base.id, error = %e, kind = e.kind(), "skipping event");
                try_record_error(e.kind());
                try_record_dropped(e.kind());
                None
            }
        }
    }

    fn log_report(&self, base: &Base, report: &CeeReport) {
        if let Some(e) = &report.parse_error {
            error!(id = %base.id, error = %e, "CEE payload forwarded unannotated");
            try_record_error(e.kind());
        }
        if let Some(m) = Metrics::get() {
            m.record_collisions(report.collisions.len());
        }
    }

    fn finish(
        &self,
        base: &Base,
        tags: &Tags,
        is_cee: bool,
        host_override: Option<&str>,
    ) -> SyslogMessage {
        let structure::Structured { mut record, error } = structure::build(tags, host_override);
        if let Some(e) = error.map(TransformError::from) {
            error!(id = %base.id, error = %e, kind = e.kind(), "forwarding partial syslog5424 record");
            try_record_error(e.kind());
        }

        if is_cee {
            debug!(id = %base.id, "CEE prefix enabled");
            record.enable_cee();
        }

        SyslogMessage::new(base.forwarded_by(&self.name), record)
    }

    fn unhandled(&self, other: OtherEvent) {
        if self.config.ignore_container_events {
            try_record_dropped("ignored_variant");
            return;
        }
        trace!(id = %other.base.id, kind = %other.kind, "unhandled event type");
        try_record_dropped("unhandled_variant");
    }

    /// Consume events until the inbound channel closes
    ///
    /// Events are handled one at a time, in arrival order. Returns
    /// [`StageError::ChannelClosed`] if the downstream receiver is dropped.
    pub async fn run(
        self,
        mut rx: mpsc::Receiver<Event>,
        tx: mpsc::Sender<SyslogMessage>,
    ) -> Result<()> {
        info!(
            stage = %self.name,
            version = env!("CARGO_PKG_VERSION"),
            cee_json_key = %self.config.cee_json_key,
            engine_name_to_host = self.config.engine_name_to_host,
            "Start filter"
        );

        while let Some(event) = rx.recv().await {
            let Some(msg) = self.process(event) else {
                continue;
            };
            if tx.send(msg).await.is_err() {
                warn!(stage = %self.name, "Downstream closed, stopping filter");
                return Err(StageError::ChannelClosed);
            }
            if let Some(m) = Metrics::get() {
                m.record_emitted();
            }
        }

        info!(stage = %self.name, "Inbound channel closed, filter stopped");
        Ok(())
    }
}
