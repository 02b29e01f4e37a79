//! syslog-cee runtime - process wiring for the filter stage
//!
//! Provides [`run()`] for zero-boilerplate startup, and [`RuntimeBuilder`]
//! for callers that need to override configuration or output format.
//!
//! ```text
//! stdin ──► JsonIngestor ──► mpsc ──► SyslogFilter ──► mpsc ──► Emitter
//! ```
//!
//! # Quick start
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     let runtime = tokio::runtime::Runtime::new()?;
//!     runtime.block_on(syslog_cee_runtime::run())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod prelude;

use std::future::Future;
use std::sync::Arc;
use syslog_cee_core::{Emitter, Event, PluginError, SyslogMessage};
use syslog_cee_filter::config::{Config, LogFormat};
use syslog_cee_filter::metrics::{self, Metrics};
use syslog_cee_filter::{JsonIngestor, StdoutEmitter, SyslogFilter};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Source id given to events read from the input stream
pub const INPUT_SOURCE: &str = "stdin";

/// Maximum messages handed to the emitter per `emit` call
pub const EMIT_BATCH: usize = 64;

/// Run the stage with configuration from the environment, reading stdin
/// and writing RFC 5424 lines to stdout until EOF or a shutdown signal.
pub async fn run() -> anyhow::Result<()> {
    RuntimeBuilder::new().run().await
}

/// Counters for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Non-blank input lines read
    pub lines: u64,
    /// Events handed to the filter
    pub events: u64,
    /// Lines that could not be decoded
    pub decode_errors: u64,
}

/// Builder for controlling runtime behaviour.
///
/// # Example
///
/// ```ignore
/// RuntimeBuilder::new()
///     .config(Config::default())
///     .pretty_output(true)
///     .run()
///     .await
/// ```
#[derive(Default)]
pub struct RuntimeBuilder {
    config: Option<Config>,
    pretty_output: bool,
}

impl RuntimeBuilder {
    /// Create a new builder; configuration is loaded from the environment
    /// unless [`RuntimeBuilder::config`] is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit configuration instead of `SYSLOG_FILTER_*` variables.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Print a boxed human-readable view instead of wire lines.
    pub fn pretty_output(mut self, pretty: bool) -> Self {
        self.pretty_output = pretty;
        self
    }

    /// Run the stage to completion.
    ///
    /// Returns after stdin reaches EOF or a shutdown signal arrives, once
    /// every queued message has been emitted.
    pub async fn run(self) -> anyhow::Result<()> {
        // ── 1. Load config ───────────────────────────────────────
        let config = match self.config {
            Some(config) => config,
            None => Config::from_env()?,
        };

        // ── 2. Init tracing ──────────────────────────────────────
        init_tracing(&config);

        info!(
            stage = %config.stage_name,
            version = env!("CARGO_PKG_VERSION"),
            channel_capacity = config.channel_capacity,
            "Starting syslog-cee"
        );

        // ── 3. Init metrics ──────────────────────────────────────
        Metrics::init()?;

        // ── 4. Run the pipeline ──────────────────────────────────
        let emitter = Arc::new(if self.pretty_output {
            StdoutEmitter::pretty()
        } else {
            StdoutEmitter::new()
        });
        let input = BufReader::new(tokio::io::stdin());
        let stats =
            run_pipeline(&config, input, Arc::clone(&emitter), shutdown_signal()).await?;

        // ── 5. Shutdown ──────────────────────────────────────────
        debug!(metrics = %metrics::gather(), "Final metrics");
        info!(
            lines = stats.lines,
            events = stats.events,
            decode_errors = stats.decode_errors,
            emitted = emitter.emitted_count(),
            "syslog-cee shutdown complete"
        );

        Ok(())
    }
}

/// Wire ingest, filter and emitter together and run until `input` is
/// exhausted or `shutdown` resolves.
///
/// Either way the inbound channel is closed, the filter drains what is
/// queued and the emitter flushes before this returns.
pub async fn run_pipeline<R, E, S>(
    config: &Config,
    input: R,
    emitter: Arc<E>,
    shutdown: S,
) -> anyhow::Result<PipelineStats>
where
    R: AsyncBufRead + Unpin,
    E: Emitter + ?Sized + 'static,
    S: Future<Output = ()>,
{
    let (event_tx, event_rx) = mpsc::channel::<Event>(config.channel_capacity);
    let (syslog_tx, syslog_rx) = mpsc::channel::<SyslogMessage>(config.channel_capacity);

    let filter = SyslogFilter::new(config.filter.clone()).with_name(config.stage_name.clone());
    let filter_handle = tokio::spawn(filter.run(event_rx, syslog_tx));
    let emit_handle = tokio::spawn(emit_loop(emitter, syslog_rx));

    let mut stats = PipelineStats::default();
    {
        let ingest = ingest_lines(input, JsonIngestor::new(INPUT_SOURCE), event_tx, &mut stats);
        tokio::pin!(ingest);
        tokio::select! {
            res = &mut ingest => res?,
            _ = shutdown => info!("Shutdown requested, draining"),
        }
        // Dropping the ingest future closes the inbound channel
    }

    if let Err(e) = filter_handle.await? {
        warn!(error = %e, "Filter stopped early");
    }
    emit_handle.await??;

    Ok(stats)
}

/// Read JSON lines from `input` and forward the decoded events
async fn ingest_lines<R>(
    input: R,
    ingestor: JsonIngestor,
    tx: mpsc::Sender<Event>,
    stats: &mut PipelineStats,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        stats.lines += 1;

        let events = match ingestor.ingest(line.as_bytes()) {
            Ok(events) => events,
            Err(e) => {
                warn!(line = stats.lines, error = %e, "Failed to decode input line");
                stats.decode_errors += 1;
                metrics::try_record_dropped("decode");
                continue;
            }
        };

        for event in events {
            if tx.send(event).await.is_err() {
                warn!("Filter gone, stopping ingest");
                return Ok(());
            }
            stats.events += 1;
        }
    }

    info!(lines = stats.lines, "Input closed");
    Ok(())
}

/// Hand queued messages to `emitter` in batches until the channel closes
async fn emit_loop<E>(
    emitter: Arc<E>,
    mut rx: mpsc::Receiver<SyslogMessage>,
) -> Result<(), PluginError>
where
    E: Emitter + ?Sized,
{
    let mut batch = Vec::with_capacity(EMIT_BATCH);

    while rx.recv_many(&mut batch, EMIT_BATCH).await > 0 {
        if let Err(e) = emitter.emit(&batch).await {
            error!(
                emitter = emitter.name(),
                error = %e,
                count = batch.len(),
                "Emit failed, batch lost"
            );
        }
        batch.clear();
    }

    emitter.shutdown().await
}

/// Initialise the tracing subscriber based on config.
fn init_tracing(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_level.clone().into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Logs go to stderr; stdout carries the syslog output
    match config.log_format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = ?e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = ?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use syslog_cee_filter::FilterConfig;
    use tokio::io::AsyncWriteExt;

    // ==========================================================================
    // Test emitters
    // ==========================================================================

    #[derive(Default)]
    struct CaptureEmitter {
        captured: Mutex<Vec<SyslogMessage>>,
        shut_down: AtomicBool,
    }

    impl CaptureEmitter {
        fn take_all(&self) -> Vec<SyslogMessage> {
            self.captured.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Emitter for CaptureEmitter {
        fn name(&self) -> &'static str {
            "capture"
        }

        async fn emit(&self, messages: &[SyslogMessage]) -> Result<(), PluginError> {
            self.captured.lock().unwrap().extend_from_slice(messages);
            Ok(())
        }

        async fn health(&self) -> bool {
            true
        }

        async fn shutdown(&self) -> Result<(), PluginError> {
            self.shut_down.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingEmitter;

    #[async_trait::async_trait]
    impl Emitter for FailingEmitter {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn emit(&self, _messages: &[SyslogMessage]) -> Result<(), PluginError> {
            Err(PluginError::Send("down".to_string()))
        }

        async fn health(&self) -> bool {
            false
        }
    }

    fn config() -> Config {
        Config {
            filter: FilterConfig::default().cee_json_key("log"),
            ..Config::default()
        }
    }

    // ==========================================================================
    // Pipeline
    // ==========================================================================

    #[tokio::test]
    async fn test_pipeline_runs_to_eof() {
        let input: &[u8] = b"{\"type\":\"message\",\"tags\":{\"log\":\"{\\\"a\\\":1}\"}}\n\
            \n\
            not json\n\
            {\"type\":\"container\",\"tags\":{\"log\":\"{}\"},\"container\":{\"id\":\"c1\",\"name\":\"web\"},\"engine\":{\"name\":\"eng1\"}}\n";
        let emitter = Arc::new(CaptureEmitter::default());

        let stats = run_pipeline(
            &config(),
            BufReader::new(input),
            Arc::clone(&emitter),
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(
            stats,
            PipelineStats {
                lines: 3,
                events: 2,
                decode_errors: 1,
            }
        );

        let out = emitter.take_all();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|m| m.syslog.is_cee()));
        assert_eq!(out[0].syslog.msg, r#"{"a":1}"#);

        let body: Value = serde_json::from_str(&out[1].syslog.msg).unwrap();
        assert_eq!(body["container_id"], "c1");
        assert!(emitter.shut_down.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_events() {
        let (mut writer, reader) = tokio::io::duplex(1024);
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let emitter = Arc::new(CaptureEmitter::default());

        writer
            .write_all(b"{\"tags\":{\"log\":\"{}\"}}\n")
            .await
            .unwrap();

        let cfg = config();
        let pipeline = run_pipeline(
            &cfg,
            BufReader::new(reader),
            Arc::clone(&emitter),
            async move {
                stop_rx.await.ok();
            },
        );
        tokio::pin!(pipeline);

        // Let the line through, then signal shutdown with the writer still open
        let watch = Arc::clone(&emitter);
        let stats = tokio::select! {
            res = &mut pipeline => res.unwrap(),
            _ = async move {
                while watch.take_all().is_empty() {
                    tokio::task::yield_now().await;
                }
                stop_tx.send(()).unwrap();
                std::future::pending::<()>().await
            } => unreachable!(),
        };

        assert_eq!(stats.events, 1);
        assert_eq!(emitter.take_all().len(), 1);
        drop(writer);
    }

    #[tokio::test]
    async fn test_emit_errors_are_not_fatal() {
        let input: &[u8] = b"{\"tags\":{\"log\":\"{}\"}}\n{\"tags\":{\"log\":\"{}\"}}\n";

        let stats = run_pipeline(
            &config(),
            BufReader::new(input),
            Arc::new(FailingEmitter),
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(stats.events, 2);
    }

    #[tokio::test]
    async fn test_dyn_emitter() {
        let input: &[u8] = b"{\"tags\":{\"syslog5424_msg\":\"hi\"}}\n";
        let capture = Arc::new(CaptureEmitter::default());
        let emitter: Arc<dyn Emitter> = capture.clone();

        run_pipeline(
            &Config::default(),
            BufReader::new(input),
            emitter,
            std::future::pending(),
        )
        .await
        .unwrap();

        let out = capture.take_all();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].syslog.msg, "hi");
        assert!(!out[0].syslog.is_cee());
    }
}
