//! Error types for the filter stage

use thiserror::Error;

pub use syslog_cee_core::{PluginError, StructureError, TransformError};

/// Result type alias for stage operations
pub type Result<T> = std::result::Result<T, StageError>;

/// Stage-level error
///
/// Per-event problems are [`TransformError`]s and never surface here; these
/// are the failures that affect the stage as a whole.
#[derive(Error, Debug)]
pub enum StageError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Metrics registration error
    #[error("metrics error: {0}")]
    Metrics(String),

    /// Downstream receiver went away
    #[error("downstream channel closed")]
    ChannelClosed,
}
