//! Configuration for the filter stage
//!
//! [`FilterConfig`] holds the options that change how events are
//! transformed. [`Config`] wraps it with process-level settings and can be
//! loaded from `SYSLOG_FILTER_*` environment variables:
//!
//! | variable | option | default |
//! |---|---|---|
//! | `SYSLOG_FILTER_CEE_JSON_KEY` | `cee-json-key` | `""` |
//! | `SYSLOG_FILTER_ANNOTATE_DOCKER_META` | `annotate-docker-meta` | `false` |
//! | `SYSLOG_FILTER_ENGINE_NAME_TO_HOST` | `engine-name-to-host` | `false` |
//! | `SYSLOG_FILTER_IGNORE_CONTAINER_EVENTS` | `ignore-container-events` | `true` |
//! | `SYSLOG_FILTER_INPUTS` | `inputs` (comma separated) | any |
//! | `SYSLOG_FILTER_NAME` | `stage-name` | `syslog` |
//! | `SYSLOG_FILTER_LOG_LEVEL` | `log-level` | `info` |
//! | `SYSLOG_FILTER_LOG_FORMAT` | `log-format` | `pretty` |
//! | `SYSLOG_FILTER_CHANNEL_CAPACITY` | `channel-capacity` | `1024` |

use crate::error::{Result, StageError};
use serde::Deserialize;
use std::str::FromStr;

const ENV_PREFIX: &str = "SYSLOG_FILTER_";

/// Options controlling the transformation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FilterConfig {
    /// Tag key holding the CEE/JSON payload. Empty disables CEE handling.
    pub cee_json_key: String,

    /// Annotate plain-message CEE payloads with the container/engine tags
    /// present on the event
    pub annotate_docker_meta: bool,

    /// Overwrite the record's host with the engine name (container messages)
    pub engine_name_to_host: bool,

    /// Drop unrecognised event variants silently instead of logging them
    pub ignore_container_events: bool,

    /// Upstream stages accepted as the last hop. Empty accepts any.
    pub inputs: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cee_json_key: String::new(),
            annotate_docker_meta: false,
            engine_name_to_host: false,
            ignore_container_events: true,
            inputs: Vec::new(),
        }
    }
}

impl FilterConfig {
    /// Set the CEE key
    pub fn cee_json_key(mut self, key: impl Into<String>) -> Self {
        self.cee_json_key = key.into();
        self
    }

    /// Enable or disable plain-message metadata annotation
    pub fn annotate_docker_meta(mut self, enabled: bool) -> Self {
        self.annotate_docker_meta = enabled;
        self
    }

    /// Enable or disable the engine-name host override
    pub fn engine_name_to_host(mut self, enabled: bool) -> Self {
        self.engine_name_to_host = enabled;
        self
    }

    /// Choose whether unknown variants are dropped silently
    pub fn ignore_container_events(mut self, ignore: bool) -> Self {
        self.ignore_container_events = ignore;
        self
    }

    /// Restrict accepted upstream stages
    pub fn inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Whether CEE handling is active
    pub fn cee_enabled(&self) -> bool {
        !self.cee_json_key.is_empty()
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(StageError::Config(format!("unknown log format '{other}'"))),
        }
    }
}

/// Full stage configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Transformation options
    #[serde(flatten)]
    pub filter: FilterConfig,

    /// Name recorded in `source_path` of emitted messages
    pub stage_name: String,

    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Capacity of the inbound and outbound channels
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            stage_name: "syslog".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            channel_capacity: 1024,
        }
    }
}

impl Config {
    /// Load from `SYSLOG_FILTER_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable source
    ///
    /// `lookup` receives full variable names, e.g.
    /// `SYSLOG_FILTER_CEE_JSON_KEY`. Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut config = Config::default();

        if let Some(v) = get("CEE_JSON_KEY") {
            config.filter.cee_json_key = v.trim().to_string();
        }
        if let Some(v) = get("ANNOTATE_DOCKER_META") {
            config.filter.annotate_docker_meta = parse_bool("ANNOTATE_DOCKER_META", &v)?;
        }
        if let Some(v) = get("ENGINE_NAME_TO_HOST") {
            config.filter.engine_name_to_host = parse_bool("ENGINE_NAME_TO_HOST", &v)?;
        }
        if let Some(v) = get("IGNORE_CONTAINER_EVENTS") {
            config.filter.ignore_container_events = parse_bool("IGNORE_CONTAINER_EVENTS", &v)?;
        }
        if let Some(v) = get("INPUTS") {
            config.filter.inputs = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = get("NAME") {
            let name = v.trim();
            if name.is_empty() {
                return Err(StageError::Config(format!(
                    "{ENV_PREFIX}NAME must not be empty"
                )));
            }
            config.stage_name = name.to_string();
        }
        if let Some(v) = get("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = get("LOG_FORMAT") {
            config.log_format = v.parse()?;
        }
        if let Some(v) = get("CHANNEL_CAPACITY") {
            config.channel_capacity = match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(StageError::Config(format!(
                        "{ENV_PREFIX}CHANNEL_CAPACITY must be a positive integer, got '{v}'"
                    )));
                }
            };
        }

        Ok(config)
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(StageError::Config(format!(
            "{ENV_PREFIX}{name} must be a boolean, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FilterConfig::default();
        assert_eq!(config.cee_json_key, "");
        assert!(!config.annotate_docker_meta);
        assert!(!config.engine_name_to_host);
        assert!(config.ignore_container_events);
        assert!(config.inputs.is_empty());
        assert!(!config.cee_enabled());
    }

    #[test]
    fn test_from_lookup_empty_is_default() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_lookup_all_options() {
        let config = Config::from_lookup(lookup(&[
            ("SYSLOG_FILTER_CEE_JSON_KEY", "msgkey"),
            ("SYSLOG_FILTER_ANNOTATE_DOCKER_META", "yes"),
            ("SYSLOG_FILTER_ENGINE_NAME_TO_HOST", "1"),
            ("SYSLOG_FILTER_IGNORE_CONTAINER_EVENTS", "false"),
            ("SYSLOG_FILTER_INPUTS", "docker-log, journal,,"),
            ("SYSLOG_FILTER_NAME", "syslog-cee"),
            ("SYSLOG_FILTER_LOG_LEVEL", "debug"),
            ("SYSLOG_FILTER_LOG_FORMAT", "JSON"),
            ("SYSLOG_FILTER_CHANNEL_CAPACITY", "64"),
        ]))
        .unwrap();

        assert_eq!(config.filter.cee_json_key, "msgkey");
        assert!(config.filter.annotate_docker_meta);
        assert!(config.filter.engine_name_to_host);
        assert!(!config.filter.ignore_container_events);
        assert_eq!(config.filter.inputs, vec!["docker-log", "journal"]);
        assert_eq!(config.stage_name, "syslog-cee");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.channel_capacity, 64);
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let err = Config::from_lookup(lookup(&[("SYSLOG_FILTER_ENGINE_NAME_TO_HOST", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, StageError::Config(_)));
        assert!(err.to_string().contains("ENGINE_NAME_TO_HOST"));
    }

    #[test]
    fn test_invalid_capacity_rejected() {
        for bad in ["0", "-1", "lots"] {
            let err = Config::from_lookup(lookup(&[("SYSLOG_FILTER_CHANNEL_CAPACITY", bad)]))
                .unwrap_err();
            assert!(matches!(err, StageError::Config(_)), "accepted {bad}");
        }
    }

    #[test]
    fn test_invalid_log_format_rejected() {
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
    }

    #[test]
    fn test_deserialize_kebab_case() {
        let config: Config = serde_json::from_str(
            r#"{
                "cee-json-key": "msgkey",
                "engine-name-to-host": true,
                "log-format": "json"
            }"#,
        )
        .unwrap();

        assert_eq!(config.filter.cee_json_key, "msgkey");
        assert!(config.filter.engine_name_to_host);
        assert!(config.filter.ignore_container_events);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.stage_name, "syslog");
    }

    #[test]
    fn test_builder_methods() {
        let config = FilterConfig::default()
            .cee_json_key("msgkey")
            .annotate_docker_meta(true)
            .engine_name_to_host(true)
            .ignore_container_events(false)
            .inputs(["docker-log"]);

        assert!(config.cee_enabled());
        assert!(config.annotate_docker_meta);
        assert!(config.engine_name_to_host);
        assert!(!config.ignore_container_events);
        assert_eq!(config.inputs, vec!["docker-log".to_string()]);
    }
}
