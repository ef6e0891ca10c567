//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Reporter produces:
//!     → logging.rs (local log line for every failed delivery)
//!     → metrics.rs (report outcome counters)
//!
//! Consumers:
//!     → Local log output (stdout via tracing-subscriber)
//!     → Any `metrics` recorder the application installs
//! ```
//!
//! # Design Decisions
//! - The local log is the only visible trace of a failed report
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
