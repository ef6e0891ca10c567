//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! override map (JSON object)
//!     → schema.rs (drop nulls, merge over defaults, partition extra fields)
//!     → validation.rs (semantic checks)
//!     → ReporterConfig (immutable)
//!     → shared via Arc by the reporter and every request it handles
//! ```
//!
//! # Design Decisions
//! - Config is immutable once built; the reporter never mutates it per request
//! - All fields have defaults to allow empty overrides
//! - The standard/extra partition happens once, at construction

pub mod schema;
pub mod validation;

pub use schema::{ChunkSize, ReporterConfig, RESERVED_KEYS};
pub use validation::validate_config;
