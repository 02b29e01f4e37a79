//! CEE envelope builder
//!
//! Decides what ends up in the message key of an event whose payload sits
//! under the configured CEE key.
//!
//! - **Plain messages**: the payload is copied verbatim into
//!   [`KEY_MSG`], optionally annotated with container/engine tags.
//! - **Container messages**: the payload is parsed as a JSON object, its
//!   top-level fields are flattened into the tags (existing tags win), and
//!   the payload is annotated with `engine_name`, `container_id` and
//!   `container_name` before being written into [`KEY_MSG`].
//!
//! The tag map is borrowed mutably for the whole rewrite, so no other code
//! can observe it half-merged.

use crate::annotate::{AnnotateError, annotate, parse_object};
use serde_json::Value;
use std::collections::HashSet;
use syslog_cee_core::metadata_keys::{CONTAINER_ID, CONTAINER_NAME, ENGINE_NAME, KEY_MSG};
use syslog_cee_core::{Container, Engine, Tags, TransformError};
use tracing::debug;

/// A flattened payload field that was not merged because the tag existed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    /// Tag key
    pub key: String,
    /// Value already present, which was kept
    pub kept: String,
    /// Value from the payload, which was discarded
    pub rejected: String,
}

/// Non-fatal findings from one envelope build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CeeReport {
    /// Payload fields added to the tags
    pub merged: usize,
    /// Payload fields skipped because the tag already existed
    pub collisions: Vec<Collision>,
    /// Set when the payload was not a JSON object and went out unannotated
    pub parse_error: Option<TransformError>,
}

/// Builds CEE message bodies for one configured key
#[derive(Debug, Clone)]
pub struct CeeEnvelope {
    key: String,
    /// Payload fields never flattened into the tags
    excluded: HashSet<String>,
}

impl CeeEnvelope {
    /// Create a builder for payloads stored under `key`
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let excluded = HashSet::from([key.clone()]);
        Self { key, excluded }
    }

    /// The tag key holding the payload
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Plain message: copy the payload into the message key
    ///
    /// `annotate_meta` appends whichever of the `engine_name`,
    /// `container_id`, `container_name` tags are present on the event.
    ///
    /// # Errors
    ///
    /// - [`TransformError::MissingKey`] - tags untouched, skip CEE
    /// - [`TransformError::Serialization`] - skip the event
    pub fn plain(&self, tags: &mut Tags, annotate_meta: bool) -> Result<CeeReport, TransformError> {
        let payload = self.payload(tags)?;
        let mut report = CeeReport::default();

        let body = if annotate_meta {
            let meta: Vec<(String, String)> = [ENGINE_NAME, CONTAINER_ID, CONTAINER_NAME]
                .into_iter()
                .filter_map(|k| tags.get(k).map(|v| (k.to_string(), v.clone())))
                .collect();
            self.annotate_or_verbatim(payload, meta, &mut report)?
        } else {
            payload
        };

        debug!(key = %self.key, target_key = KEY_MSG, "Overwrite message key with payload");
        tags.insert(KEY_MSG.to_string(), body);
        Ok(report)
    }

    /// Container message: flatten, merge and annotate the payload
    ///
    /// # Errors
    ///
    /// - [`TransformError::MissingKey`] - tags untouched, skip CEE
    /// - [`TransformError::Serialization`] - skip the event
    pub fn container(
        &self,
        tags: &mut Tags,
        container: &Container,
        engine: &Engine,
    ) -> Result<CeeReport, TransformError> {
        let payload = self.payload(tags)?;
        let mut report = CeeReport::default();

        let fields = match self.flatten(&payload) {
            Ok(fields) => fields,
            Err(e) => {
                report.parse_error = Some(self.parse_error(e));
                tags.insert(KEY_MSG.to_string(), payload);
                return Ok(report);
            }
        };

        for (key, value) in fields {
            match tags.get(&key) {
                Some(existing) => {
                    debug!(
                        tag = %key,
                        kept = %existing,
                        rejected = %value,
                        "Won't overwrite existing tag"
                    );
                    report.collisions.push(Collision {
                        key,
                        kept: existing.clone(),
                        rejected: value,
                    });
                }
                None => {
                    tags.insert(key, value);
                    report.merged += 1;
                }
            }
        }

        // Re-read after the merge: the payload key is excluded from
        // flattening, so this is the original payload.
        let payload = tags.get(&self.key).cloned().unwrap_or(payload);
        let meta = [
            (ENGINE_NAME, engine.name.as_str()),
            (CONTAINER_ID, container.id.as_str()),
            (CONTAINER_NAME, container.name.as_str()),
        ];
        let body = self.annotate_or_verbatim(payload, meta, &mut report)?;
        debug!(body = %body, merged = report.merged, "Rewrote JSON payload");

        tags.insert(KEY_MSG.to_string(), body);
        Ok(report)
    }

    fn payload(&self, tags: &Tags) -> Result<String, TransformError> {
        tags.get(&self.key)
            .cloned()
            .ok_or_else(|| TransformError::MissingKey {
                key: self.key.clone(),
            })
    }

    /// Top-level payload fields as tag pairs; non-string values are kept as
    /// their JSON text
    fn flatten(&self, payload: &str) -> Result<Vec<(String, String)>, AnnotateError> {
        let object = parse_object(payload)?;
        Ok(object
            .into_iter()
            .filter(|(k, _)| !self.excluded.contains(k))
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect())
    }

    fn annotate_or_verbatim<I, K, V>(
        &self,
        payload: String,
        meta: I,
        report: &mut CeeReport,
    ) -> Result<String, TransformError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        match annotate(&payload, meta) {
            Ok(body) => Ok(body),
            Err(AnnotateError::Serialize(reason)) => Err(TransformError::Serialization(reason)),
            Err(e @ AnnotateError::NotAnObject(_)) => {
                report.parse_error = Some(self.parse_error(e));
                Ok(payload)
            }
        }
    }

    fn parse_error(&self, err: AnnotateError) -> TransformError {
        TransformError::JsonParse {
            key: self.key.clone(),
            reason: err.to_string(),
        }
    }
}
