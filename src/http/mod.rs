//! HTTP integration subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → middleware/error_report.rs (snapshot RequestEnv, call inner service)
//!     → inner service (axum Router, tower service, ...)
//!     → Err / panic / response carrying a Fault → ErrorReporter
//!     → original outcome returned to the caller
//! ```

pub mod middleware;
pub mod response;

pub use middleware::error_report::{ErrorReportLayer, ErrorReportService};
pub use response::FaultResponse;
