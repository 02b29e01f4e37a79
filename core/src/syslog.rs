//! Structured syslog-5424 record
//!
//! [`Syslog5424::from_tags`] converts a flat tag map into a record, reading
//! the `syslog5424_*` keys from [`metadata_keys`](crate::metadata_keys).
//! Missing keys fall back to defaults; malformed ones are collected into a
//! [`StructureError`] that still carries the best-effort record.
//!
//! ```text
//! <PRI>VER TIMESTAMP HOST APP PROCID MSGID SD [@cee: ]MSG
//! ```

use crate::error::StructureError;
use crate::message::Tags;
use crate::metadata_keys::{
    KEY_APP, KEY_HOST, KEY_MSG, KEY_MSGID, KEY_PRI, KEY_PROC, KEY_SD, KEY_TS, KEY_VER,
};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::fmt;

/// Prefix marking the message body as a CEE JSON payload
pub const CEE_PREFIX: &str = "@cee: ";

/// RFC 5424 nil value
const NIL: &str = "-";

/// Highest valid PRI value (facility 23, severity 7)
const MAX_PRI: u16 = 191;

/// Syslog severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    /// System is unusable
    Emergency = 0,
    /// Action must be taken immediately
    Alert = 1,
    /// Critical conditions
    Critical = 2,
    /// Error conditions
    Error = 3,
    /// Warning conditions
    Warning = 4,
    /// Normal but significant condition
    Notice = 5,
    /// Informational messages
    Informational = 6,
    /// Debug-level messages
    Debug = 7,
}

impl Severity {
    /// Severity from the low three bits of a PRI value
    pub fn from_code(code: u8) -> Self {
        match code & 0x07 {
            0 => Severity::Emergency,
            1 => Severity::Alert,
            2 => Severity::Critical,
            3 => Severity::Error,
            4 => Severity::Warning,
            5 => Severity::Notice,
            6 => Severity::Informational,
            _ => Severity::Debug,
        }
    }

    /// Numeric code
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// A syslog-5424 record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syslog5424 {
    /// Facility code, 0..=23
    pub facility: u8,
    /// Severity
    pub severity: Severity,
    /// Protocol version
    pub version: u8,
    /// Event time, `None` renders as nil
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// Originating host
    pub host: Option<String>,
    /// Application name
    pub app: Option<String>,
    /// Process id
    pub proc_id: Option<String>,
    /// Message id
    pub msg_id: Option<String>,
    /// Pre-rendered structured data elements
    pub structured_data: Option<String>,
    /// Message body
    pub msg: String,
    cee: bool,
}

impl Default for Syslog5424 {
    /// user.notice, version 1, all optional fields nil
    fn default() -> Self {
        Self {
            facility: 1,
            severity: Severity::Notice,
            version: 1,
            timestamp: None,
            host: None,
            app: None,
            proc_id: None,
            msg_id: None,
            structured_data: None,
            msg: String::new(),
            cee: false,
        }
    }
}

impl Syslog5424 {
    /// Build a record from a flat tag map
    ///
    /// Every field is attempted even after a failure, so the partial record
    /// in the error is as complete as the input allows.
    pub fn from_tags(tags: &Tags) -> Result<Self, StructureError> {
        let mut record = Syslog5424::default();
        let mut reasons = Vec::new();

        if let Some(raw) = non_nil(tags, KEY_PRI) {
            match parse_pri(raw) {
                Some(pri) => {
                    record.facility = (pri >> 3) as u8;
                    record.severity = Severity::from_code((pri & 0x07) as u8);
                }
                None => reasons.push(format!("invalid {KEY_PRI} '{raw}'")),
            }
        }

        if let Some(raw) = non_nil(tags, KEY_VER) {
            match raw.parse::<u8>() {
                Ok(v) if v > 0 => record.version = v,
                _ => reasons.push(format!("invalid {KEY_VER} '{raw}'")),
            }
        }

        if let Some(raw) = non_nil(tags, KEY_TS) {
            match DateTime::parse_from_rfc3339(raw) {
                Ok(ts) => record.timestamp = Some(ts),
                Err(e) => reasons.push(format!("invalid {KEY_TS} '{raw}': {e}")),
            }
        }

        record.host = non_nil(tags, KEY_HOST).map(str::to_string);
        record.app = non_nil(tags, KEY_APP).map(str::to_string);
        record.proc_id = non_nil(tags, KEY_PROC).map(str::to_string);
        record.msg_id = non_nil(tags, KEY_MSGID).map(str::to_string);
        record.structured_data = non_nil(tags, KEY_SD).map(str::to_string);
        record.msg = tags.get(KEY_MSG).cloned().unwrap_or_default();

        if reasons.is_empty() {
            Ok(record)
        } else {
            Err(StructureError {
                partial: record,
                reasons,
            })
        }
    }

    /// Render the record back into tags
    ///
    /// `from_tags(&r.to_tags())` reproduces `r` except for the CEE flag,
    /// which is not a tag.
    pub fn to_tags(&self) -> Tags {
        let mut tags = Tags::new();
        tags.insert(KEY_PRI.to_string(), self.pri().to_string());
        tags.insert(KEY_VER.to_string(), self.version.to_string());
        if let Some(ts) = &self.timestamp {
            tags.insert(KEY_TS.to_string(), format_ts(ts));
        }
        let optional = [
            (KEY_HOST, &self.host),
            (KEY_APP, &self.app),
            (KEY_PROC, &self.proc_id),
            (KEY_MSGID, &self.msg_id),
            (KEY_SD, &self.structured_data),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                tags.insert(key.to_string(), v.clone());
            }
        }
        tags.insert(KEY_MSG.to_string(), self.msg.clone());
        tags
    }

    /// PRI value: `facility * 8 + severity`
    pub fn pri(&self) -> u16 {
        (self.facility as u16) * 8 + self.severity.code() as u16
    }

    /// Mark the message body as a CEE payload
    pub fn enable_cee(&mut self) {
        self.cee = true;
    }

    /// Whether the CEE prefix is applied on serialization
    pub fn is_cee(&self) -> bool {
        self.cee
    }

    /// Message body as emitted, with the CEE prefix if enabled
    pub fn message(&self) -> String {
        if self.cee {
            format!("{CEE_PREFIX}{}", self.msg)
        } else {
            self.msg.clone()
        }
    }

    /// Serialize as an RFC 5424 line
    pub fn to_rfc5424(&self) -> String {
        let ts = self
            .timestamp
            .as_ref()
            .map(format_ts)
            .unwrap_or_else(|| NIL.to_string());
        let mut line = format!(
            "<{}>{} {} {} {} {} {} {}",
            self.pri(),
            self.version,
            ts,
            self.host.as_deref().unwrap_or(NIL),
            self.app.as_deref().unwrap_or(NIL),
            self.proc_id.as_deref().unwrap_or(NIL),
            self.msg_id.as_deref().unwrap_or(NIL),
            self.structured_data.as_deref().unwrap_or(NIL),
        );
        let body = self.message();
        if !body.is_empty() {
            line.push(' ');
            line.push_str(&body);
        }
        line
    }
}

impl fmt::Display for Syslog5424 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc5424())
    }
}

/// Normalise a header field value: trimmed, with empty and `-` as absent
pub fn header_value(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && value != NIL).then_some(value)
}

/// Tag value, treating empty and `-` as absent
fn non_nil<'a>(tags: &'a Tags, key: &str) -> Option<&'a str> {
    tags.get(key).and_then(|v| header_value(v))
}

/// Accepts `13` and `<13>`
fn parse_pri(raw: &str) -> Option<u16> {
    let digits = raw
        .strip_prefix('<')
        .and_then(|r| r.strip_suffix('>'))
        .unwrap_or(raw);
    digits.parse::<u16>().ok().filter(|p| *p <= MAX_PRI)
}

fn format_ts(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
