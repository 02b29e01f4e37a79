//! syslog-cee-filter - CEE-aware syslog filter stage
//!
//! Turns flat key/value events into RFC 5424 syslog records, detecting
//! CEE-JSON payloads and annotating them with container and engine
//! metadata on the way.
//!
//! ```text
//! JsonIngestor ──► SyslogFilter ──► Emitter
//!                   ├─ cee        (payload merge + annotation)
//!                   └─ structure  (tags → Syslog5424)
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod annotate;
pub mod cee;
pub mod config;
pub mod emit;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod metrics;
pub mod structure;

pub use annotate::{AnnotateError, annotate};
pub use cee::{CeeEnvelope, CeeReport, Collision};
pub use config::{Config, FilterConfig, LogFormat};
pub use emit::StdoutEmitter;
pub use error::{PluginError, Result, StageError, StructureError, TransformError};
pub use filter::{DEFAULT_NAME, SyslogFilter};
pub use ingest::JsonIngestor;
pub use metrics::Metrics;
pub use structure::Structured;

// Core types most callers need alongside the filter
pub use syslog_cee_core::{
    Base, Container, ContainerMessage, Emitter, Engine, Event, MessageId, OtherEvent,
    PlainMessage, Syslog5424, SyslogMessage, Tags,
};
