//! The error reporter.
//!
//! # Responsibilities
//! - Run a handler and report what it failed with
//! - Build and deliver one record per error
//! - Contain every failure of the reporting path
//!
//! # Design Decisions
//! - Original errors and panics are always handed back unchanged
//! - A failed report is a log line and a counter, nothing else

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::{validate_config, ReporterConfig};
use crate::error::{ConfigError, ReportError};
use crate::http::ErrorReportLayer;
use crate::observability::metrics;
use crate::report::env::RequestEnv;
use crate::report::fault::{clear_recorded_panic, panic_message, Fault};
use crate::report::record::DiagnosticRecord;
use crate::transport::{Notifier, UdpNotifier};

/// Reports errors of a wrapped handler to a log aggregator.
#[derive(Clone)]
pub struct ErrorReporter {
    config: Arc<ReporterConfig>,
    notifier: Arc<dyn Notifier>,
}

impl ErrorReporter {
    /// Reporter delivering over GELF/UDP to the configured destination.
    pub fn new(config: ReporterConfig) -> Self {
        let notifier = UdpNotifier::from_config(&config);
        Self::with_notifier(config, notifier)
    }

    pub fn with_notifier<N: Notifier + 'static>(config: ReporterConfig, notifier: N) -> Self {
        if let Err(errors) = validate_config(&config) {
            for error in &errors {
                tracing::warn!(error = %error, "Questionable error reporter configuration");
            }
        }
        tracing::debug!(
            hostname = %config.hostname,
            port = config.port,
            facility = %config.facility,
            extra_fields = config.extra.len(),
            "Error reporter configured"
        );

        Self {
            config: Arc::new(config),
            notifier: Arc::new(notifier),
        }
    }

    /// Merge `overrides` over the defaults and deliver over GELF/UDP.
    pub fn from_overrides(overrides: Map<String, Value>) -> Result<Self, ConfigError> {
        ReporterConfig::from_overrides(overrides).map(Self::new)
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    /// Tower layer wrapping services with this reporter.
    pub fn layer(&self) -> ErrorReportLayer {
        ErrorReportLayer::new(self.clone())
    }

    /// Run `handler` with `env`, reporting what it fails with.
    ///
    /// An `Err` is reported and returned as is; a panic is reported and
    /// resumed. If the handler succeeds but recorded a fault in `env`, that
    /// fault is reported and the value returned.
    pub fn handle<T, E, F>(&self, mut env: RequestEnv, handler: F) -> Result<T, E>
    where
        F: FnOnce(&mut RequestEnv) -> Result<T, E>,
        E: fmt::Display,
    {
        clear_recorded_panic();
        match panic::catch_unwind(AssertUnwindSafe(|| handler(&mut env))) {
            Ok(Ok(value)) => {
                if let Some(fault) = env.take_fault() {
                    self.report_error(&fault, Some(&env));
                }
                Ok(value)
            }
            Ok(Err(error)) => {
                self.report_error(&Fault::from_display(&error), Some(&env));
                Err(error)
            }
            Err(payload) => {
                self.report_error(&Fault::from_panic(payload.as_ref()), Some(&env));
                panic::resume_unwind(payload)
            }
        }
    }

    /// Build a record for `fault` and hand it to the notifier.
    ///
    /// Returns the delivered record, or `None` if anything on the way failed.
    /// Failures are logged, never returned.
    pub fn report_error(&self, fault: &Fault, env: Option<&RequestEnv>) -> Option<DiagnosticRecord> {
        match self.try_report(fault, env) {
            Ok(record) => {
                metrics::record_sent();
                Some(record)
            }
            Err(error) => {
                metrics::record_failed();
                tracing::error!(
                    error = %error,
                    fault = %fault,
                    "Could not send error report"
                );
                None
            }
        }
    }

    fn try_report(
        &self,
        fault: &Fault,
        env: Option<&RequestEnv>,
    ) -> Result<DiagnosticRecord, ReportError> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let (record, skipped) = DiagnosticRecord::build(&self.config, fault, env);
            metrics::record_env_skipped(skipped);
            self.notifier.notify(&record).map(|()| record)
        }));

        match outcome {
            Ok(result) => Ok(result?),
            Err(payload) => {
                clear_recorded_panic();
                Err(ReportError::Panicked(panic_message(payload.as_ref())))
            }
        }
    }
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
