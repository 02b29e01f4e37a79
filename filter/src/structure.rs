//! Syslog structurer - tags to [`Syslog5424`] record
//!
//! Never fails outright: when the tags hold malformed fields the partial
//! record is returned next to the error so the event can still be
//! forwarded.

use syslog_cee_core::syslog::header_value;
use syslog_cee_core::{StructureError, Syslog5424, Tags};

/// A structured record and the error raised while building it, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structured {
    /// Complete record, or the best-effort partial one when `error` is set
    pub record: Syslog5424,
    /// Why the record is partial
    pub error: Option<StructureError>,
}

/// Convert tags into a syslog record
///
/// `host_override`, when given, replaces whatever host the tags produced.
/// It is applied after structuring and also to partial records. An empty or
/// `-` override is no override.
pub fn build(tags: &Tags, host_override: Option<&str>) -> Structured {
    let (mut record, error) = match Syslog5424::from_tags(tags) {
        Ok(record) => (record, None),
        Err(e) => (e.partial.clone(), Some(e)),
    };

    if let Some(host) = host_override.and_then(header_value) {
        record.host = Some(host.to_string());
    }

    Structured { record, error }
}
