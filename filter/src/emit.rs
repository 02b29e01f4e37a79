//! Stdout emitter
//!
//! Prints syslog messages to stdout, one RFC 5424 line per message, or a
//! boxed human-readable view in pretty mode.

use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use syslog_cee_core::{Emitter, PluginError, SyslogMessage};

/// Stdout emitter
pub struct StdoutEmitter {
    /// Boxed multi-line output instead of wire lines
    pretty: bool,
    /// Count of messages emitted
    emitted_count: AtomicU64,
}

impl StdoutEmitter {
    /// Create a new StdoutEmitter writing RFC 5424 lines
    pub fn new() -> Self {
        Self {
            pretty: false,
            emitted_count: AtomicU64::new(0),
        }
    }

    /// Create a new StdoutEmitter with pretty printing
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            emitted_count: AtomicU64::new(0),
        }
    }

    /// Get total messages emitted
    pub fn emitted_count(&self) -> u64 {
        self.emitted_count.load(Ordering::Relaxed)
    }

    /// Write `messages` to `out`, returning how many were written before
    /// the first I/O error
    fn write_all<W: Write>(
        &self,
        out: &mut W,
        messages: &[SyslogMessage],
    ) -> (u64, std::io::Result<()>) {
        let mut written = 0u64;

        for msg in messages {
            let result = if self.pretty {
                write_pretty(out, msg)
            } else {
                writeln!(out, "{}", msg.syslog.to_rfc5424())
            };

            if let Err(e) = result {
                return (written, Err(e));
            }
            written += 1;
        }

        (written, Ok(()))
    }
}

impl Default for StdoutEmitter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_pretty<W: Write>(out: &mut W, msg: &SyslogMessage) -> std::io::Result<()> {
    let record = &msg.syslog;
    writeln!(out, "┌─ Syslog ────────────────────────────────────────────")?;
    writeln!(out, "│ ID:        {}", msg.base.id)?;
    writeln!(out, "│ Path:      {}", msg.base.source_path.join(" -> "))?;
    writeln!(
        out,
        "│ PRI:       {} (facility {}, severity {})",
        record.pri(),
        record.facility,
        record.severity.code()
    )?;
    if let Some(ts) = &record.timestamp {
        writeln!(out, "│ Timestamp: {}", ts.to_rfc3339())?;
    }
    if let Some(host) = &record.host {
        writeln!(out, "│ Host:      {}", host)?;
    }
    if let Some(app) = &record.app {
        writeln!(out, "│ App:       {}", app)?;
    }
    writeln!(out, "│ CEE:       {}", record.is_cee())?;
    writeln!(out, "│ Message:   {}", record.message())?;
    writeln!(out, "└─────────────────────────────────────────────────────")
}

#[async_trait]
impl Emitter for StdoutEmitter {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn emit(&self, messages: &[SyslogMessage]) -> Result<(), PluginError> {
        let mut stdout = std::io::stdout().lock();
        let (written, result) = self.write_all(&mut stdout, messages);

        // Only count successfully written messages
        self.emitted_count.fetch_add(written, Ordering::Relaxed);
        result.map_err(|e| PluginError::Send(format!("stdout write failed: {}", e)))
    }

    async fn health(&self) -> bool {
        true
    }
}
