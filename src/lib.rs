//! Error reporting middleware for Graylog.
//!
//! Wraps a request handler, reports every error it fails with to a log
//! aggregator as a GELF record over UDP, and hands the original error back
//! to the caller unchanged.
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use graylog_exceptions::{ErrorReporter, ReporterConfig};
//!
//! let config = ReporterConfig::default().with_extra("_app", "shop");
//! let reporter = ErrorReporter::new(config);
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "ok" }))
//!     .layer(reporter.layer());
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod observability;
pub mod report;
pub mod transport;

pub use config::{ChunkSize, ReporterConfig};
pub use error::{ConfigError, NotifyError, ReportError, ValidationError};
pub use http::{ErrorReportLayer, ErrorReportService, FaultResponse};
pub use report::{install_panic_hook, DiagnosticRecord, ErrorReporter, Fault, RequestEnv};
pub use transport::{Notifier, UdpNotifier};
