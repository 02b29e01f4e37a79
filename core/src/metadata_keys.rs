//! Well-known tag keys
//!
//! The `syslog5424_*` keys are the ones the structurer reads when turning a
//! flat tag set into a [`Syslog5424`](crate::Syslog5424) record. The
//! annotation keys name the container/engine fields appended to CEE
//! payloads.

/// Priority, either `13` or `<13>`
pub const KEY_PRI: &str = "syslog5424_pri";

/// Protocol version
pub const KEY_VER: &str = "syslog5424_ver";

/// RFC 3339 timestamp
pub const KEY_TS: &str = "syslog5424_ts";

/// Originating host
pub const KEY_HOST: &str = "syslog5424_host";

/// Application name
pub const KEY_APP: &str = "syslog5424_app";

/// Process id
pub const KEY_PROC: &str = "syslog5424_proc";

/// Message id
pub const KEY_MSGID: &str = "syslog5424_msgid";

/// Pre-rendered structured data, e.g. `[origin ip="10.0.0.1"]`
pub const KEY_SD: &str = "syslog5424_sd";

/// Message body. Always holds the final text once an event is processed.
pub const KEY_MSG: &str = "syslog5424_msg";

/// Engine (docker daemon) name appended to CEE payloads
pub const ENGINE_NAME: &str = "engine_name";

/// Container id appended to CEE payloads
pub const CONTAINER_ID: &str = "container_id";

/// Container name appended to CEE payloads
pub const CONTAINER_NAME: &str = "container_name";
