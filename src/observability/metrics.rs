//! Metrics collection.
//!
//! # Metrics
//! - `error_reports_total` (counter): reports by outcome (`sent`, `failed`)
//! - `error_reports_env_skipped_total` (counter): request values that could
//!   not be rendered

use metrics::counter;

pub const REPORTS_TOTAL: &str = "error_reports_total";
pub const ENV_SKIPPED_TOTAL: &str = "error_reports_env_skipped_total";

pub fn record_sent() {
    counter!(REPORTS_TOTAL, "outcome" => "sent").increment(1);
}

pub fn record_failed() {
    counter!(REPORTS_TOTAL, "outcome" => "failed").increment(1);
}

pub fn record_env_skipped(count: usize) {
    if count > 0 {
        counter!(ENV_SKIPPED_TOTAL).increment(count as u64);
    }
}
