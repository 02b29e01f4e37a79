//! syslog-cee-core - Core types for the syslog CEE filter stage
//!
//! Shared between the filter and any ingest/emit plugins:
//!
//! - [`Event`] - inbound variants (plain, container, other)
//! - [`Tags`] - the flat key/value metadata of an event
//! - [`Syslog5424`] - the structured record produced from tags
//! - [`SyslogMessage`] - outbound envelope
//! - [`Emitter`] trait - async interface for downstream sinks
//! - [`TransformError`] / [`PluginError`] - error types
//! - [`metadata_keys`] - well-known tag keys

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(missing_docs)]

mod emit;
mod error;
/// Inbound and outbound event types
pub mod message;
/// Well-known tag keys
pub mod metadata_keys;
/// The syslog-5424 record
pub mod syslog;

pub use emit::Emitter;
pub use error::{PluginError, StructureError, TransformError};
pub use message::{
    Base, Container, ContainerMessage, Engine, Event, MessageId, OtherEvent, PlainMessage,
    SyslogMessage, Tags,
};
pub use syslog::{CEE_PREFIX, Severity, Syslog5424};

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // Error Tests
    // ==========================================================================

    #[test]
    fn test_missing_key_display() {
        let err = TransformError::MissingKey {
            key: "msgkey".to_string(),
        };
        assert_eq!(err.to_string(), "could not find cee-json-key 'msgkey' in tags");
        assert_eq!(err.kind(), "missing_key");
    }

    #[test]
    fn test_json_parse_display() {
        let err = TransformError::JsonParse {
            key: "msgkey".to_string(),
            reason: "expected value at line 1 column 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "value under 'msgkey' is not a JSON object: expected value at line 1 column 1"
        );
        assert_eq!(err.kind(), "json_parse");
    }

    #[test]
    fn test_structure_error_conversion() {
        let err: TransformError = StructureError {
            partial: Syslog5424::default(),
            reasons: vec!["invalid syslog5424_pri 'x'".to_string()],
        }
        .into();
        assert_eq!(err.kind(), "structure");
        assert_eq!(
            err.to_string(),
            "error parsing tags to syslog5424 record: invalid syslog5424_pri 'x'"
        );
    }

    #[test]
    fn test_plugin_error_display() {
        assert_eq!(
            PluginError::Send("timeout".to_string()).to_string(),
            "send failed: timeout"
        );
        assert_eq!(
            PluginError::Transform("bad json".to_string()).to_string(),
            "transform failed: bad json"
        );
    }

    #[test]
    fn test_errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TransformError>();
        assert_send_sync::<PluginError>();
    }

    // ==========================================================================
    // Emitter Trait Tests
    // ==========================================================================

    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingEmitter {
        count: AtomicU64,
    }

    #[async_trait::async_trait]
    impl Emitter for CountingEmitter {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn emit(&self, messages: &[SyslogMessage]) -> Result<(), PluginError> {
            self.count
                .fetch_add(messages.len() as u64, Ordering::Relaxed);
            Ok(())
        }

        async fn health(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_emitter_is_object_safe() {
        let emitter: Arc<dyn Emitter> = Arc::new(CountingEmitter {
            count: AtomicU64::new(0),
        });
        let msg = SyslogMessage::new(Base::new("test"), Syslog5424::default());

        assert_eq!(emitter.name(), "counting");
        assert!(emitter.health().await);
        assert!(emitter.emit(&[msg.clone(), msg]).await.is_ok());
        assert!(emitter.shutdown().await.is_ok());
    }
}
