//! Diagnostic record assembly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ReporterConfig;
use crate::report::env::RequestEnv;
use crate::report::fault::Fault;

/// Prefix of fields rendered from the request context.
pub const ENV_PREFIX: &str = "_env_";

/// Structured description of one error occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub short_message: String,

    /// Backtrace frames joined by newlines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_message: Option<String>,

    /// File of the innermost frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Line of the innermost frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    pub facility: String,
    pub level: u8,
    pub host: String,

    /// `_env_*` fields and configured extra fields.
    #[serde(flatten)]
    pub additional: BTreeMap<String, Value>,
}

impl DiagnosticRecord {
    /// Assemble the record for `fault`.
    ///
    /// Returns the record and the number of context values that could not be
    /// rendered.
    pub fn build(
        config: &ReporterConfig,
        fault: &Fault,
        env: Option<&RequestEnv>,
    ) -> (Self, usize) {
        let mut record = Self {
            short_message: fault.message().to_string(),
            full_message: None,
            file: None,
            line: None,
            facility: config.facility.clone(),
            level: config.level,
            host: config.local_app_name.clone(),
            additional: BTreeMap::new(),
        };

        let frames = fault.backtrace();
        if let Some(first) = frames.first() {
            record.full_message = Some(frames.join("\n"));
            let mut segments = first.split(':');
            record.file = segments.next().map(str::to_string);
            record.line = segments.next().and_then(|line| line.trim().parse().ok());
        }

        let mut skipped = 0;
        if let Some(env) = env.filter(|env| !env.is_empty()) {
            let (rendered, failed) = env.render();
            skipped = failed;
            for (key, text) in rendered {
                record
                    .additional
                    .insert(format!("{}{}", ENV_PREFIX, key), Value::String(text));
            }
        }

        for (key, value) in &config.extra {
            record.additional.insert(key.clone(), value.clone());
        }

        (record, skipped)
    }

    /// Rendered request context entries, keyed without the prefix.
    pub fn env_fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.additional
            .iter()
            .filter_map(|(key, value)| key.strip_prefix(ENV_PREFIX).map(|key| (key, value)))
    }
}
