//! The notify seam.

use crate::error::NotifyError;
use crate::report::DiagnosticRecord;

/// Sends a record to a log aggregator.
pub trait Notifier: Send + Sync {
    fn notify(&self, record: &DiagnosticRecord) -> Result<(), NotifyError>;
}

impl<F> Notifier for F
where
    F: Fn(&DiagnosticRecord) -> Result<(), NotifyError> + Send + Sync,
{
    fn notify(&self, record: &DiagnosticRecord) -> Result<(), NotifyError> {
        self(record)
    }
}
