//! Convenience re-exports for embedding the stage.
//!
//! ```rust
//! use syslog_cee_runtime::prelude::*;
//! ```

// Core types
pub use syslog_cee_core::{
    Base, Container, ContainerMessage, Engine, Event, MessageId, OtherEvent, PlainMessage,
    Syslog5424, SyslogMessage, Tags,
};

// Stage
pub use syslog_cee_filter::{Config, FilterConfig, LogFormat, SyslogFilter};

// Emitters
pub use syslog_cee_filter::{Emitter, StdoutEmitter};

// Ingestors
pub use syslog_cee_filter::JsonIngestor;

// Error types
pub use syslog_cee_filter::{PluginError, StageError, TransformError};

// Runtime
pub use crate::{PipelineStats, RuntimeBuilder, run_pipeline};
