//! Shared utilities for integration tests.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flate2::read::ZlibDecoder;
use graylog_exceptions::{DiagnosticRecord, ErrorReporter, Notifier, NotifyError, ReporterConfig};
use serde_json::Value;
use tokio::net::UdpSocket;

/// Notifier keeping every record it is handed.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    records: Arc<Mutex<Vec<DiagnosticRecord>>>,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, record: &DiagnosticRecord) -> Result<(), NotifyError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// A reporter whose records end up in the returned notifier.
#[allow(dead_code)]
pub fn recording_reporter(config: ReporterConfig) -> (ErrorReporter, RecordingNotifier) {
    let notifier = RecordingNotifier::default();
    (ErrorReporter::with_notifier(config, notifier.clone()), notifier)
}

/// Bind a local UDP socket standing in for the log aggregator.
#[allow(dead_code)]
pub async fn start_gelf_listener() -> (SocketAddr, UdpSocket) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    (socket.local_addr().unwrap(), socket)
}

/// Receive one datagram and decode it as zlib-compressed JSON.
#[allow(dead_code)]
pub async fn recv_gelf(socket: &UdpSocket) -> Option<Value> {
    let mut buf = vec![0u8; 65_536];
    let len = tokio::time::timeout(Duration::from_secs(2), socket.recv(&mut buf))
        .await
        .ok()?
        .ok()?;

    let mut json = String::new();
    ZlibDecoder::new(&buf[..len]).read_to_string(&mut json).ok()?;
    serde_json::from_str(&json).ok()
}
