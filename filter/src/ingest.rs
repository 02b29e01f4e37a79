//! JSON ingestor - decodes JSON-encoded events
//!
//! Supports:
//! - Single JSON object
//! - JSON array of objects
//! - Newline-delimited JSON (NDJSON/JSON Lines)

use serde::Deserialize;
use std::collections::HashMap;
use syslog_cee_core::{
    Base, Container, ContainerMessage, Engine, Event, MessageId, OtherEvent, PlainMessage,
    PluginError,
};

/// JSON ingestor for events fed into the filter
///
/// # JSON Schema
///
/// ```json
/// {
///   "type": "message",               // "message" | "container" | anything else
///   "id": "optional-ulid",           // Generated if missing
///   "timestamp_unix_ns": 0,          // Current time if missing
///   "source": "docker-log",          // Falls back to the ingestor's source
///   "source_path": ["docker-log"],   // Defaults to [source]
///   "source_success": true,          // false = stop processing
///   "tags": {"k": "v"},              // String values only
///   "container": {"id": "...", "name": "...", "image": "..."},
///   "engine": {"name": "...", "version": "..."}
/// }
/// ```
///
/// Without `type`, an object with a `container` field is a container
/// message and anything else a plain message.
pub struct JsonIngestor {
    source: String,
}

impl JsonIngestor {
    /// Create an ingestor tagging source-less events with `source`
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Decode `data` into events
    pub fn ingest(&self, data: &[u8]) -> Result<Vec<Event>, PluginError> {
        let text = std::str::from_utf8(data)
            .map_err(|e| PluginError::Transform(format!("Invalid UTF-8: {}", e)))?;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        if trimmed.starts_with('[') {
            self.parse_array(trimmed)
        } else {
            // A single (possibly pretty-printed) object first, then NDJSON
            self.parse_single(trimmed)
                .or_else(|_| self.parse_ndjson(trimmed))
        }
    }

    fn parse_single(&self, text: &str) -> Result<Vec<Event>, PluginError> {
        let json_event: JsonEvent = serde_json::from_str(text)
            .map_err(|e| PluginError::Transform(format!("Invalid JSON: {}", e)))?;

        Ok(vec![json_event.into_event(&self.source)])
    }

    fn parse_array(&self, text: &str) -> Result<Vec<Event>, PluginError> {
        let json_events: Vec<JsonEvent> = serde_json::from_str(text)
            .map_err(|e| PluginError::Transform(format!("Invalid JSON array: {}", e)))?;

        Ok(json_events
            .into_iter()
            .map(|e| e.into_event(&self.source))
            .collect())
    }

    fn parse_ndjson(&self, text: &str) -> Result<Vec<Event>, PluginError> {
        let mut events = Vec::new();

        for (line_num, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let json_event: JsonEvent = serde_json::from_str(trimmed).map_err(|e| {
                PluginError::Transform(format!("Invalid JSON on line {}: {}", line_num + 1, e))
            })?;

            events.push(json_event.into_event(&self.source));
        }

        Ok(events)
    }
}

fn default_true() -> bool {
    true
}

/// Intermediate JSON representation
#[derive(Debug, Deserialize)]
struct JsonEvent {
    #[serde(default, rename = "type")]
    kind: Option<String>,

    #[serde(default)]
    id: Option<String>,

    #[serde(default)]
    timestamp_unix_ns: Option<i64>,

    #[serde(default)]
    source: Option<String>,

    #[serde(default)]
    source_path: Vec<String>,

    #[serde(default = "default_true")]
    source_success: bool,

    #[serde(default)]
    tags: HashMap<String, String>,

    #[serde(default)]
    container: Option<JsonContainer>,

    #[serde(default)]
    engine: Option<JsonEngine>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonContainer {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonEngine {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: Option<String>,
}

impl JsonEvent {
    fn into_event(self, fallback_source: &str) -> Event {
        let source = self.source.unwrap_or_else(|| fallback_source.to_string());
        let mut base = Base::new(source);
        if let Some(id) = self.id.as_deref() {
            base.id = MessageId::from_string(id);
        }
        if let Some(ts) = self.timestamp_unix_ns {
            base.timestamp = ts;
        }
        if !self.source_path.is_empty() {
            base.source_path = self.source_path;
        }
        base.source_success = self.source_success;

        let kind = self.kind.unwrap_or_else(|| {
            if self.container.is_some() {
                "container".to_string()
            } else {
                "message".to_string()
            }
        });

        match kind.as_str() {
            "message" | "plain" => Event::Plain(PlainMessage::new(base, self.tags)),
            "container" => {
                let container = self.container.unwrap_or_default();
                let engine = self.engine.unwrap_or_default();
                Event::Container(ContainerMessage::new(
                    base,
                    self.tags,
                    Container {
                        id: container.id,
                        name: container.name,
                        image: container.image,
                    },
                    Engine {
                        name: engine.name,
                        version: engine.version,
                    },
                ))
            }
            _ => Event::Other(OtherEvent { base, kind }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn ingest(data: &str) -> Vec<Event> {
        JsonIngestor::new("stdin").ingest(data.as_bytes()).unwrap()
    }

    #[test]
    fn test_plain_message() {
        let events = ingest(r#"{"type":"message","source":"app","tags":{"k1":"v1"}}"#);
        assert_eq!(events.len(), 1);
        let Event::Plain(msg) = &events[0] else {
            panic!("expected plain message");
        };
        assert_eq!(msg.base.source_id, "app");
        assert_eq!(msg.base.source_path, vec!["app".to_string()]);
        assert_eq!(msg.tags.get("k1"), Some(&"v1".to_string()));
    }

    #[test]
    fn test_container_message() {
        let events = ingest(
            r#"{"type":"container","tags":{},"container":{"id":"c1","name":"web"},"engine":{"name":"eng1"}}"#,
        );
        let Event::Container(msg) = &events[0] else {
            panic!("expected container message");
        };
        assert_eq!(msg.base.source_id, "stdin");
        assert_eq!(msg.container.id, "c1");
        assert_eq!(msg.container.name, "web");
        assert_eq!(msg.engine.name, "eng1");
    }

    #[test]
    fn test_type_inferred_from_container_field() {
        let events = ingest(r#"{"container":{"id":"c1"}}"#);
        assert!(matches!(events[0], Event::Container(_)));

        let events = ingest(r#"{"tags":{"a":"b"}}"#);
        assert!(matches!(events[0], Event::Plain(_)));
    }

    #[test]
    fn test_unknown_type_is_other() {
        let events = ingest(r#"{"type":"container-event"}"#);
        let Event::Other(other) = &events[0] else {
            panic!("expected other event");
        };
        assert_eq!(other.kind, "container-event");
    }

    #[test]
    fn test_header_fields() {
        let events = ingest(
            r#"{"id":"evt-1","timestamp_unix_ns":1000,"source_path":["a","b"],"source_success":false}"#,
        );
        let base = events[0].base();
        assert_eq!(base.id, MessageId::from_string("evt-1"));
        assert_eq!(base.timestamp, 1000);
        assert_eq!(base.last_hop(), Some("b"));
        assert!(!base.source_success);
    }

    #[test]
    fn test_array_and_ndjson() {
        assert_eq!(ingest(r#"[{"tags":{}},{"tags":{}}]"#).len(), 2);
        assert_eq!(ingest("{\"tags\":{}}\n\n{\"tags\":{}}\n{\"tags\":{}}").len(), 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(ingest("   \n").is_empty());
    }

    #[test]
    fn test_invalid_json_reports_line() {
        let err = JsonIngestor::new("stdin")
            .ingest(b"{\"tags\":{}}\n{oops")
            .unwrap_err();
        assert!(matches!(err, PluginError::Transform(ref m) if m.contains("line 2")));
    }

    #[test]
    fn test_non_string_tag_rejected() {
        let err = JsonIngestor::new("stdin")
            .ingest(br#"{"tags":{"n":1}}"#)
            .unwrap_err();
        assert!(matches!(err, PluginError::Transform(_)));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = JsonIngestor::new("stdin").ingest(&[0xFF, 0xFE]).unwrap_err();
        assert!(matches!(err, PluginError::Transform(ref m) if m.contains("UTF-8")));
    }
}
