//! Event types flowing through the stage
//!
//! Every inbound event is one [`Event`] variant. Plain and container
//! messages share a [`Base`] header and a flat [`Tags`] map; container
//! messages additionally carry [`Container`] and [`Engine`] metadata.
//!
//! ```text
//! Event::Plain ─────┐
//!                   ├──► SyslogFilter ──► SyslogMessage { base, syslog }
//! Event::Container ─┘
//! Event::Other ─────────► dropped (optionally logged)
//! ```
//!
//! Events are moved into the filter by value, so the tag map of an event
//! has exactly one owner while it is being rewritten.

use crate::syslog::Syslog5424;
use std::collections::HashMap;
use std::fmt;

/// Flat key/value metadata attached to one event
pub type Tags = HashMap<String, String>;

/// Event identifier (ULID)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(ulid::Ulid);

impl MessageId {
    /// Generate a new unique ID
    #[inline]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Parse a ULID string, or derive a stable ID from an arbitrary string
    ///
    /// Upstream producers do not always hand out ULIDs. Non-ULID ids are
    /// hashed (FNV-1a) so the same input always maps to the same id.
    pub fn from_string(s: &str) -> Self {
        if let Ok(ulid) = ulid::Ulid::from_string(s) {
            return Self(ulid);
        }

        let hash = fnv1a(s);
        let hash2 = hash.wrapping_mul(0x517cc1b727220a95);
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&hash.to_le_bytes());
        bytes[8..].copy_from_slice(&hash2.to_le_bytes());
        Self(ulid::Ulid::from_bytes(bytes))
    }
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

/// Header shared by every event
///
/// Opaque to the transformation itself: it is copied from the inbound event
/// onto the outbound [`SyslogMessage`] with one extra hop recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base {
    /// Unique identifier
    pub id: MessageId,

    /// Unix timestamp in nanoseconds
    pub timestamp: i64,

    /// Identifier of the producer that created the event
    pub source_id: String,

    /// Stages the event has passed through, oldest first
    pub source_path: Vec<String>,

    /// Whether the upstream stage succeeded.
    ///
    /// `false` is the stop-processing signal: downstream stages must not
    /// act on the event.
    pub source_success: bool,
}

impl Base {
    /// Create a header with a fresh ID and the current time
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            id: MessageId::new(),
            timestamp: chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0),
            source_path: vec![source.clone()],
            source_id: source,
            source_success: true,
        }
    }

    /// Mark the event as failed upstream
    pub fn with_success(mut self, success: bool) -> Self {
        self.source_success = success;
        self
    }

    /// Last stage that touched the event
    pub fn last_hop(&self) -> Option<&str> {
        self.source_path.last().map(String::as_str)
    }

    /// Decide whether `stage` must skip this event
    ///
    /// Returns `true` when:
    /// - the upstream stage flagged the event as failed,
    /// - `stage` already handled it (routing loop), or
    /// - `inputs` is non-empty and the last hop is not listed in it
    pub fn stop_processing(&self, stage: &str, inputs: &[String]) -> bool {
        if !self.source_success {
            return true;
        }
        if self.source_path.iter().any(|hop| hop == stage) {
            return true;
        }
        if inputs.is_empty() {
            return false;
        }
        match self.last_hop() {
            Some(hop) => !inputs.iter().any(|i| i == hop),
            None => true,
        }
    }

    /// Copy of this header with `stage` appended to the path
    pub fn forwarded_by(&self, stage: &str) -> Self {
        let mut next = self.clone();
        next.source_path.push(stage.to_string());
        next
    }
}

/// Container the log line was produced by
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    /// Container ID
    pub id: String,
    /// Container name
    pub name: String,
    /// Image reference, if known
    pub image: Option<String>,
}

/// Container engine (daemon) that ran the container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Engine {
    /// Engine name, usually the docker host's name
    pub name: String,
    /// Engine version, if known
    pub version: Option<String>,
}

/// A plain tagged log message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainMessage {
    /// Header
    pub base: Base,
    /// Flat metadata
    pub tags: Tags,
}

impl PlainMessage {
    /// Create a message from a header and tags
    pub fn new(base: Base, tags: Tags) -> Self {
        Self { base, tags }
    }
}

/// A log message sourced from a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMessage {
    /// Header
    pub base: Base,
    /// Flat metadata
    pub tags: Tags,
    /// Producing container
    pub container: Container,
    /// Engine running the container
    pub engine: Engine,
}

impl ContainerMessage {
    /// Create a message from a header, tags and container/engine metadata
    pub fn new(base: Base, tags: Tags, container: Container, engine: Engine) -> Self {
        Self {
            base,
            tags,
            container,
            engine,
        }
    }
}

/// Any event the stage does not transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherEvent {
    /// Header
    pub base: Base,
    /// Type name reported by the producer, e.g. `"container-event"`
    pub kind: String,
}

/// Inbound event, matched exhaustively by the filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Plain tagged message
    Plain(PlainMessage),
    /// Container-sourced message
    Container(ContainerMessage),
    /// Anything else
    Other(OtherEvent),
}

impl Event {
    /// Variant label for logs and metrics
    pub fn variant(&self) -> &'static str {
        match self {
            Event::Plain(_) => "message",
            Event::Container(_) => "container",
            Event::Other(_) => "other",
        }
    }

    /// Header of the event, whatever the variant
    pub fn base(&self) -> &Base {
        match self {
            Event::Plain(m) => &m.base,
            Event::Container(m) => &m.base,
            Event::Other(o) => &o.base,
        }
    }
}

impl From<PlainMessage> for Event {
    fn from(msg: PlainMessage) -> Self {
        Event::Plain(msg)
    }
}

impl From<ContainerMessage> for Event {
    fn from(msg: ContainerMessage) -> Self {
        Event::Container(msg)
    }
}

/// Outbound event: original header plus the structured record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyslogMessage {
    /// Header, with the emitting stage appended to the path
    pub base: Base,
    /// Structured record
    pub syslog: Syslog5424,
}

impl SyslogMessage {
    /// Pair a header with a record
    pub fn new(base: Base, syslog: Syslog5424) -> Self {
        Self { base, syslog }
    }
}
