//! Error reporting subsystem.
//!
//! # Data Flow
//! ```text
//! error observed (Err, panic, or recorded fault)
//!     → fault.rs (message + backtrace frames)
//!     → env.rs (request context, rendered per key)
//!     → record.rs (DiagnosticRecord, fresh per error)
//!     → reporter.rs (notify, contain failures)
//! ```
//!
//! # Design Decisions
//! - The reporter only reads its configuration; every report builds its own
//!   record, so concurrent requests share nothing mutable
//! - Reporting never changes what the caller of the wrapped handler sees

pub mod env;
pub mod fault;
pub mod record;
pub mod reporter;

pub use env::RequestEnv;
pub use fault::{install_panic_hook, Fault};
pub use record::DiagnosticRecord;
pub use reporter::ErrorReporter;
