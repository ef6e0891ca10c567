//! Responses for errors handled inside the application.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::report::Fault;

/// A `500 Internal Server Error` that still gets reported.
///
/// The fault travels in the response extensions, where
/// [`ErrorReportService`](crate::http::ErrorReportService) picks it up.
#[derive(Debug, Clone)]
pub struct FaultResponse {
    status: StatusCode,
    fault: Fault,
}

impl FaultResponse {
    pub fn new(fault: Fault) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            fault,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl From<Fault> for FaultResponse {
    fn from(fault: Fault) -> Self {
        Self::new(fault)
    }
}

impl IntoResponse for FaultResponse {
    fn into_response(self) -> Response {
        let body = self
            .status
            .canonical_reason()
            .unwrap_or("Internal Server Error");
        let mut response = (self.status, body).into_response();
        response.extensions_mut().insert(self.fault);
        response
    }
}
