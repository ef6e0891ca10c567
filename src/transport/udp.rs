//! GELF over UDP.
//!
//! # Responsibilities
//! - Encode records as GELF 1.0 JSON, zlib-compressed
//! - Map logger severities to syslog levels
//! - Send one datagram per record from a fresh socket
//!
//! # Design Decisions
//! - Destination and limits are a snapshot taken at construction
//! - Never detects caller location; `file` and `line` come from the record
//! - Every send binds its own ephemeral socket, so one notifier can be shared
//!   by concurrent requests
//! - The destination is resolved on the first send and cached; later sends
//!   skip the DNS lookup. A failed lookup is not cached

use std::io::Write;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::Value;

use crate::config::{ChunkSize, ReporterConfig};
use crate::error::NotifyError;
use crate::report::DiagnosticRecord;
use crate::transport::Notifier;

const GELF_VERSION: &str = "1.0";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Syslog level for a logger-style severity (0 debug ... 5 unknown).
pub fn syslog_level(level: u8) -> u8 {
    match level {
        0 => 7,
        1 => 6,
        2 => 5,
        3 => 4,
        4 => 3,
        _ => 1,
    }
}

/// Default notifier: GELF records over UDP.
#[derive(Debug, Clone)]
pub struct UdpNotifier {
    hostname: String,
    port: u16,
    max_chunk_size: ChunkSize,
    timeout: Duration,
    resolved: OnceLock<SocketAddr>,
}

impl UdpNotifier {
    pub fn new(hostname: impl Into<String>, port: u16, max_chunk_size: ChunkSize) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            max_chunk_size,
            timeout: DEFAULT_TIMEOUT,
            resolved: OnceLock::new(),
        }
    }

    pub fn from_config(config: &ReporterConfig) -> Self {
        Self::new(config.hostname.clone(), config.port, config.max_chunk_size)
    }

    /// Bound on a single send.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The datagram payload for `record`.
    pub fn encode(&self, record: &DiagnosticRecord) -> Result<Vec<u8>, NotifyError> {
        let mut message = match serde_json::to_value(record)? {
            Value::Object(map) => map,
            _ => return Err(NotifyError::Rejected("record is not a JSON object".into())),
        };

        message
            .entry("version")
            .or_insert_with(|| Value::from(GELF_VERSION));
        message
            .entry("timestamp")
            .or_insert_with(|| Value::from(unix_timestamp()));
        message.insert("level".into(), Value::from(syslog_level(record.level)));

        let json = serde_json::to_vec(&message)?;
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(json.len() / 2), Compression::default());
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }

    /// Destination address, once a send has resolved it.
    pub fn target(&self) -> Option<SocketAddr> {
        self.resolved.get().copied()
    }

    fn resolve(&self) -> Result<SocketAddr, NotifyError> {
        if let Some(addr) = self.resolved.get() {
            return Ok(*addr);
        }

        let addr = (self.hostname.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| self.unresolved())?
            .next()
            .ok_or_else(|| self.unresolved())?;
        tracing::debug!(target_addr = %addr, hostname = %self.hostname, "Resolved log aggregator");
        Ok(*self.resolved.get_or_init(|| addr))
    }

    fn unresolved(&self) -> NotifyError {
        NotifyError::Unresolved {
            target: format!("{}:{}", self.hostname, self.port),
        }
    }
}

impl Notifier for UdpNotifier {
    fn notify(&self, record: &DiagnosticRecord) -> Result<(), NotifyError> {
        if self.port == 0 {
            return Err(NotifyError::InvalidPort);
        }

        let target = self.resolve()?;
        let payload = self.encode(record)?;
        let limit = self.max_chunk_size.bytes();
        if payload.len() > limit {
            return Err(NotifyError::Oversized {
                size: payload.len(),
                limit,
            });
        }

        let bind_addr: SocketAddr = if target.is_ipv4() {
            ([0u8; 4], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_write_timeout(Some(self.timeout))?;
        socket.send_to(&payload, target)?;

        tracing::trace!(target_addr = %target, bytes = payload.len(), "GELF datagram sent");
        Ok(())
    }
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}
