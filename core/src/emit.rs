//! Emitter trait for syslog sinks
//!
//! The [`Emitter`] trait is the output side of the stage: whatever consumes
//! the transformed [`SyslogMessage`]s downstream.

use crate::error::PluginError;
use crate::message::SyslogMessage;
use async_trait::async_trait;

/// Emitter trait - sends transformed messages to a destination
///
/// # Implementation Requirements
///
/// - Emitters must be `Send + Sync` for use across async tasks
/// - `emit` receives a batch and should write it in order
/// - Shutdown should flush any pending data and release resources
///
/// # Example
///
/// ```ignore
/// use syslog_cee_core::{Emitter, PluginError, SyslogMessage};
/// use async_trait::async_trait;
///
/// struct UdpEmitter {
///     socket: tokio::net::UdpSocket,
/// }
///
/// #[async_trait]
/// impl Emitter for UdpEmitter {
///     fn name(&self) -> &'static str {
///         "udp"
///     }
///
///     async fn emit(&self, messages: &[SyslogMessage]) -> Result<(), PluginError> {
///         for msg in messages {
///             self.socket
///                 .send(msg.syslog.to_rfc5424().as_bytes())
///                 .await
///                 .map_err(|e| PluginError::Send(e.to_string()))?;
///         }
///         Ok(())
///     }
///
///     async fn health(&self) -> bool {
///         true
///     }
/// }
/// ```
#[async_trait]
pub trait Emitter: Send + Sync {
    /// Short name for identification and logging, e.g. "stdout"
    fn name(&self) -> &'static str;

    /// Emit a batch of messages. May be empty.
    async fn emit(&self, messages: &[SyslogMessage]) -> Result<(), PluginError>;

    /// Check if the destination is accepting messages
    async fn health(&self) -> bool;

    /// Flush and release resources. Default is a no-op.
    async fn shutdown(&self) -> Result<(), PluginError> {
        Ok(())
    }
}
