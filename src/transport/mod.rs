//! Delivery of diagnostic records.
//!
//! # Data Flow
//! ```text
//! DiagnosticRecord
//!     → notifier.rs (Notifier seam: closures, test doubles)
//!     → udp.rs (default: GELF JSON → zlib → single UDP datagram)
//!     → log aggregator
//! ```
//!
//! # Design Decisions
//! - Notifiers are synchronous and bounded by their own timeouts
//! - A notifier reports failure through `NotifyError`; the reporter decides
//!   what to do with it
//! - Chunking of oversized payloads is not supported; they are rejected

pub mod notifier;
pub mod udp;

pub use notifier::Notifier;
pub use udp::{syslog_level, UdpNotifier};
