//! Configuration schema definitions.
//!
//! This module defines the option set of the error reporter. Every option has
//! a default so an empty override map yields a usable configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Standard record keys. They may be passed as overrides but are never
/// treated as extra fields.
pub const RESERVED_KEYS: &[&str] = &[
    "host",
    "short_message",
    "full_message",
    "file",
    "line",
    "notify",
];

/// Root configuration for the error reporter.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Log aggregator host name or address.
    pub hostname: String,

    /// Log aggregator UDP port.
    pub port: u16,

    /// Value sent as the record `host`.
    #[serde(alias = "localAppName")]
    pub local_app_name: String,

    /// Value sent as the record `facility`.
    pub facility: String,

    /// Largest datagram the transport may emit.
    #[serde(alias = "maxChunkSize")]
    pub max_chunk_size: ChunkSize,

    /// Logger-style severity (0 debug ... 5 unknown).
    pub level: u8,

    /// Caller-supplied keys outside the option set, merged into every record.
    #[serde(skip)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: 12201,
            local_app_name: local_hostname(),
            facility: "graylog2_exceptions".to_string(),
            max_chunk_size: ChunkSize::Lan,
            level: 3,
            extra: BTreeMap::new(),
        }
    }
}

/// Raw shape of an override map: recognised options plus everything else.
#[derive(Deserialize)]
struct Overrides {
    #[serde(flatten)]
    config: ReporterConfig,

    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl ReporterConfig {
    /// Merge `overrides` over the defaults.
    ///
    /// Keys with a `null` value are dropped first, so they fall back to the
    /// default. Unknown keys become extra fields, except the reserved
    /// standard record keys which are accepted and discarded.
    pub fn from_overrides(overrides: Map<String, Value>) -> Result<Self, ConfigError> {
        let present: Map<String, Value> = overrides
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect();

        let Overrides { mut config, rest } = serde_json::from_value(Value::Object(present))?;

        config.extra = rest
            .into_iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()) && !is_option_key(key))
            .collect();

        Ok(config)
    }

    /// Same as [`ReporterConfig::from_overrides`] for any JSON value.
    pub fn from_value(overrides: Value) -> Result<Self, ConfigError> {
        match overrides {
            Value::Object(map) => Self::from_overrides(map),
            Value::Null => Ok(Self::default()),
            Value::Bool(_) => Err(ConfigError::NotAnObject("a boolean")),
            Value::Number(_) => Err(ConfigError::NotAnObject("a number")),
            Value::String(_) => Err(ConfigError::NotAnObject("a string")),
            Value::Array(_) => Err(ConfigError::NotAnObject("an array")),
        }
    }

    /// Add an extra field. Reserved keys are ignored.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !RESERVED_KEYS.contains(&key.as_str()) && !is_option_key(&key) {
            self.extra.insert(key, value.into());
        }
        self
    }
}

/// Option names (and aliases) already consumed by the flattened config.
fn is_option_key(key: &str) -> bool {
    matches!(
        key,
        "hostname"
            | "port"
            | "local_app_name"
            | "localAppName"
            | "facility"
            | "max_chunk_size"
            | "maxChunkSize"
            | "level"
    )
}

fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Maximum datagram size used by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "ChunkSizeRepr", into = "ChunkSizeRepr")]
pub enum ChunkSize {
    /// 8154 bytes.
    Lan,
    /// 1420 bytes.
    Wan,
    /// Explicit byte count.
    Bytes(usize),
}

impl ChunkSize {
    pub fn bytes(&self) -> usize {
        match self {
            ChunkSize::Lan => 8154,
            ChunkSize::Wan => 1420,
            ChunkSize::Bytes(n) => *n,
        }
    }
}

impl fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkSize::Lan => write!(f, "LAN"),
            ChunkSize::Wan => write!(f, "WAN"),
            ChunkSize::Bytes(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum ChunkSizeRepr {
    Name(String),
    Bytes(usize),
}

impl TryFrom<ChunkSizeRepr> for ChunkSize {
    type Error = String;

    fn try_from(repr: ChunkSizeRepr) -> Result<Self, Self::Error> {
        match repr {
            ChunkSizeRepr::Bytes(n) => Ok(ChunkSize::Bytes(n)),
            ChunkSizeRepr::Name(name) if name.eq_ignore_ascii_case("lan") => Ok(ChunkSize::Lan),
            ChunkSizeRepr::Name(name) if name.eq_ignore_ascii_case("wan") => Ok(ChunkSize::Wan),
            ChunkSizeRepr::Name(name) => Err(format!(
                "unknown chunk size `{}`, expected \"LAN\", \"WAN\" or a byte count",
                name
            )),
        }
    }
}

impl From<ChunkSize> for ChunkSizeRepr {
    fn from(size: ChunkSize) -> Self {
        match size {
            ChunkSize::Bytes(n) => ChunkSizeRepr::Bytes(n),
            named => ChunkSizeRepr::Name(named.to_string()),
        }
    }
}
