//! Error types for the syslog CEE stage

use crate::syslog::Syslog5424;
use thiserror::Error;

/// Error raised while transforming a single event
///
/// None of these abort the worker. Each one is reported and the event is
/// either forwarded best-effort or skipped, depending on the variant:
///
/// - [`TransformError::MissingKey`] - CEE path skipped, event still forwarded
/// - [`TransformError::JsonParse`] - raw value forwarded without annotation
/// - [`TransformError::Structure`] - partial record forwarded
/// - [`TransformError::Serialization`] - event skipped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The configured CEE key is absent from the event's tags
    #[error("could not find cee-json-key '{key}' in tags")]
    MissingKey {
        /// The configured key that was looked up
        key: String,
    },

    /// The CEE value is not a JSON object
    #[error("value under '{key}' is not a JSON object: {reason}")]
    JsonParse {
        /// Tag key holding the offending value
        key: String,
        /// Parser message
        reason: String,
    },

    /// The tags could not be converted into a syslog-5424 record
    #[error(transparent)]
    Structure(#[from] Box<StructureError>),

    /// Re-serializing an annotated JSON object failed
    #[error("failed to serialize annotated JSON: {0}")]
    Serialization(String),
}

impl TransformError {
    /// Short label used for log fields and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            TransformError::MissingKey { .. } => "missing_key",
            TransformError::JsonParse { .. } => "json_parse",
            TransformError::Structure(_) => "structure",
            TransformError::Serialization(_) => "serialization",
        }
    }
}

/// Tags could not be fully converted into a [`Syslog5424`] record
///
/// Carries the best-effort record built from whatever did parse, so the
/// caller can still forward something.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("error parsing tags to syslog5424 record: {}", reasons.join("; "))]
pub struct StructureError {
    /// Record populated from the fields that parsed, defaults elsewhere
    pub partial: Syslog5424,
    /// One entry per field that failed
    pub reasons: Vec<String>,
}

impl From<StructureError> for TransformError {
    fn from(err: StructureError) -> Self {
        TransformError::Structure(Box::new(err))
    }
}

/// Error type for ingest and emit adapters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// Decoding inbound data failed
    ///
    /// Examples: invalid JSON, invalid UTF-8.
    #[error("transform failed: {0}")]
    Transform(String),

    /// Writing to the destination failed
    #[error("send failed: {0}")]
    Send(String),
}
