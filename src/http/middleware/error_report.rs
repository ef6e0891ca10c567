//! Error reporting middleware.
//! Reports failures of the wrapped service without changing them.
//!
//! Reports run on tokio's blocking pool and are awaited before the outcome
//! is handed back, so callers still see them in order.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::task::{Context, Poll};

use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tower::{Layer, Service};

use crate::report::fault::clear_recorded_panic;
use crate::report::{ErrorReporter, Fault, RequestEnv};

/// Layer applying [`ErrorReportService`].
#[derive(Debug, Clone)]
pub struct ErrorReportLayer {
    reporter: ErrorReporter,
}

impl ErrorReportLayer {
    pub fn new(reporter: ErrorReporter) -> Self {
        Self { reporter }
    }
}

impl<S> Layer<S> for ErrorReportLayer {
    type Service = ErrorReportService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorReportService {
            inner,
            reporter: self.reporter.clone(),
        }
    }
}

/// Wraps a service and reports its errors, panics, and faults attached to
/// responses.
#[derive(Debug, Clone)]
pub struct ErrorReportService<S> {
    inner: S,
    reporter: ErrorReporter,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for ErrorReportService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: fmt::Display + Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let env = RequestEnv::from_request(&request);
        let reporter = self.reporter.clone();

        // The ready service is the one that must handle this request.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let outcome = AssertUnwindSafe(async move {
                clear_recorded_panic();
                inner.call(request).await
            })
            .catch_unwind()
            .await;

            match outcome {
                Ok(Ok(response)) => {
                    let attached = response.extensions().get::<Fault>().cloned();
                    if let Some(fault) = attached {
                        tracing::debug!(fault = %fault, "Reporting fault attached to response");
                        report_off_thread(reporter, fault, env).await;
                    }
                    Ok(response)
                }
                Ok(Err(error)) => {
                    report_off_thread(reporter, Fault::from_display(&error), env).await;
                    Err(error)
                }
                Err(payload) => {
                    let fault = Fault::from_panic(payload.as_ref());
                    report_off_thread(reporter, fault, env).await;
                    std::panic::resume_unwind(payload)
                }
            }
        })
    }
}

/// Run the report on the blocking pool when a tokio runtime is available, so
/// name resolution and socket writes never hold up a worker thread.
async fn report_off_thread(reporter: ErrorReporter, fault: Fault, env: RequestEnv) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let task = handle.spawn_blocking(move || {
                reporter.report_error(&fault, Some(&env));
            });
            if let Err(error) = task.await {
                tracing::error!(error = %error, "Error report task failed");
            }
        }
        Err(_) => {
            reporter.report_error(&fault, Some(&env));
        }
    }
}
