//! Tower middleware.

pub mod error_report;
