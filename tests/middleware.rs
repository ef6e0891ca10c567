//! The tower middleware around axum routers and plain services.

use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    routing::get,
    Router,
};
use futures_util::FutureExt;
use graylog_exceptions::{
    install_panic_hook, DiagnosticRecord, ErrorReporter, Fault, FaultResponse, NotifyError,
    ReporterConfig, RequestEnv,
};
use tower::{service_fn, ServiceBuilder, ServiceExt};
use tower_http::trace::TraceLayer;

mod common;

fn app() -> Router {
    Router::new()
        .route("/ok", get(|| async { "fine" }))
        .route(
            "/handled",
            get(|| async { FaultResponse::new(Fault::new("payment gateway timed out")) }),
        )
        .route(
            "/panic",
            get(|| async {
                let items: Vec<u8> = Vec::new();
                if items.is_empty() {
                    panic!("undefined method `klopfer!'");
                }
                "unreachable"
            }),
        )
}

fn get_request(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("x-request-id", "req-1")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_successful_request_is_not_reported() {
    let (reporter, notifier) = common::recording_reporter(ReporterConfig::default());
    let service = ServiceBuilder::new().layer(reporter.layer()).service(app());

    let response = service.oneshot(get_request("/ok")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(notifier.records().is_empty());
}

#[tokio::test]
async fn test_fault_attached_to_response_is_reported() {
    let (reporter, notifier) = common::recording_reporter(ReporterConfig::default());
    let service = app().layer(reporter.layer());

    let response = service.oneshot(get_request("/handled")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let records = notifier.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].short_message, "payment gateway timed out");
    assert_eq!(records[0].additional["_env_method"], "GET");
    assert_eq!(records[0].additional["_env_uri"], "/handled");
    assert!(records[0].additional["_env_headers"]
        .as_str()
        .unwrap()
        .contains("req-1"));
}

#[tokio::test]
async fn test_service_error_is_reported_and_returned() {
    let (reporter, notifier) = common::recording_reporter(ReporterConfig::default());
    let failing = service_fn(|_request: Request<Body>| async {
        Err::<Response<Body>, io::Error>(io::Error::new(io::ErrorKind::ConnectionReset, "upstream reset"))
    });
    let service = ServiceBuilder::new().layer(reporter.layer()).service(failing);

    let error = service.oneshot(get_request("/orders")).await.unwrap_err();

    assert_eq!(error.kind(), io::ErrorKind::ConnectionReset);
    assert_eq!(error.to_string(), "upstream reset");
    let records = notifier.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].short_message, "upstream reset");
    assert_eq!(records[0].additional["_env_uri"], "/orders");
}

#[tokio::test]
async fn test_panic_is_reported_once_and_resumed() {
    install_panic_hook();
    let (reporter, notifier) = common::recording_reporter(ReporterConfig::default());
    let service = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(reporter.layer())
        .service(app());

    let outcome = AssertUnwindSafe(service.oneshot(get_request("/panic")))
        .catch_unwind()
        .await;

    let Err(payload) = outcome else {
        panic!("the panic must reach the caller")
    };
    assert_eq!(
        payload.downcast_ref::<&str>().copied(),
        Some("undefined method `klopfer!'")
    );

    let records = notifier.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].short_message, "undefined method `klopfer!'");
    assert_eq!(records[0].file.as_deref(), Some("tests/middleware.rs"));
    assert!(records[0].line.is_some());
    assert!(records[0]
        .full_message
        .as_deref()
        .unwrap()
        .starts_with("tests/middleware.rs:"));
}

#[tokio::test]
async fn test_upstream_env_is_merged() {
    let (reporter, notifier) = common::recording_reporter(ReporterConfig::default());
    let service = ServiceBuilder::new().layer(reporter.layer()).service(app());

    let mut request = get_request("/handled");
    request
        .extensions_mut()
        .insert(RequestEnv::new().with("tenant", "acme"));
    service.oneshot(request).await.unwrap();

    let records = notifier.records();
    assert_eq!(records[0].additional["_env_tenant"], "\"acme\"");
}

#[tokio::test]
async fn test_extra_fields_reach_every_record() {
    let config = ReporterConfig::default().with_extra("_app", "shop");
    let (reporter, notifier) = common::recording_reporter(config);
    let service = ServiceBuilder::new().layer(reporter.layer()).service(app());

    for _ in 0..3 {
        service.clone().oneshot(get_request("/handled")).await.unwrap();
    }

    let records = notifier.records();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|record| record.additional["_app"] == "shop"));
}

#[tokio::test(flavor = "current_thread")]
async fn test_notifier_runs_off_the_request_thread() {
    let seen: Arc<Mutex<Option<ThreadId>>> = Arc::default();
    let notifier = {
        let seen = Arc::clone(&seen);
        move |_record: &DiagnosticRecord| -> Result<(), NotifyError> {
            *seen.lock().unwrap() = Some(thread::current().id());
            Ok(())
        }
    };
    let reporter = ErrorReporter::with_notifier(ReporterConfig::default(), notifier);
    let service = ServiceBuilder::new().layer(reporter.layer()).service(app());

    service.oneshot(get_request("/handled")).await.unwrap();

    let notified_on = seen.lock().unwrap().expect("the fault must be reported");
    assert_ne!(notified_on, thread::current().id());
}
