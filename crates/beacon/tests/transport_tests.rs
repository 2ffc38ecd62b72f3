// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP transport tests against a mock collection endpoint.

use std::sync::Arc;

use beacon::{
	parse_endpoint, ErrorReporter, FlushOutcome, HttpClientConfig, HttpReportSender,
	MemoryReportStore, ReportPayload, ReportSender, ReporterError, ReportingMode, ResourceFailure,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COLLECT_PATH: &str = "/api/errors";

fn sender_for(server: &MockServer) -> HttpReportSender {
	let url = parse_endpoint(&format!("{}{COLLECT_PATH}", server.uri())).unwrap();
	HttpReportSender::from_config(&HttpClientConfig::default(), url).unwrap()
}

async fn sample_payload() -> ReportPayload {
	let reporter = ErrorReporter::builder()
		.mode(ReportingMode::Production)
		.endpoint("http://127.0.0.1:9/unused")
		.store(Arc::new(MemoryReportStore::default()))
		.build()
		.unwrap();
	reporter.capture_resource_error(ResourceFailure::new("SCRIPT", "https://cdn.example.com/app.js"));
	reporter.capture_rejection(Some(json!({"message": "boom"})));
	ReportPayload::new(reporter.queued_events(), "3.1.0")
}

#[tokio::test]
async fn posts_json_batch() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path(COLLECT_PATH))
		.and(header("content-type", "application/json"))
		.respond_with(ResponseTemplate::new(200))
		.expect(1)
		.mount(&server)
		.await;

	let payload = sample_payload().await;
	sender_for(&server).send_batch(&payload).await.unwrap();

	let requests = server.received_requests().await.unwrap();
	let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
	assert_eq!(body["appVersion"], "3.1.0");
	assert_eq!(body["errors"].as_array().map(Vec::len), Some(2));
	assert_eq!(body["errors"][0]["detail"]["kind"], "RESOURCE_LOAD_ERROR");
	assert_eq!(ReportPayload::decode(&requests[0].body).unwrap(), payload);
}

#[tokio::test]
async fn non_success_status_is_server_error() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
		.mount(&server)
		.await;

	let err = sender_for(&server)
		.send_batch(&sample_payload().await)
		.await
		.unwrap_err();

	match err {
		ReporterError::ServerError { status, message } => {
			assert_eq!(status, 503);
			assert_eq!(message, "maintenance");
		}
		other => panic!("expected server error, got {other:?}"),
	}
}

#[tokio::test]
async fn unreachable_endpoint_is_request_failure() {
	let url = parse_endpoint("http://127.0.0.1:9/api/errors").unwrap();
	let sender = HttpReportSender::from_config(&HttpClientConfig::default(), url).unwrap();

	let err = sender.send_batch(&sample_payload().await).await.unwrap_err();
	assert!(matches!(err, ReporterError::RequestFailed(_)));
}

#[tokio::test]
async fn reporter_persists_on_outage_and_delivers_on_recovery() {
	let server = MockServer::start().await;
	let store = Arc::new(MemoryReportStore::default());
	let reporter = ErrorReporter::builder()
		.mode(ReportingMode::Production)
		.endpoint(format!("{}{COLLECT_PATH}/", server.uri()))
		.store(store.clone())
		.build()
		.unwrap();

	Mock::given(method("POST"))
		.and(path(COLLECT_PATH))
		.respond_with(ResponseTemplate::new(500))
		.up_to_n_times(1)
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path(COLLECT_PATH))
		.respond_with(ResponseTemplate::new(200))
		.mount(&server)
		.await;

	reporter.capture_rejection(Some(json!("first outage")));
	assert_eq!(reporter.flush().await, FlushOutcome::Persisted(1));
	assert_eq!(store.events().await.len(), 1);

	assert_eq!(reporter.retry().await.unwrap(), 1);
	assert_eq!(reporter.flush().await, FlushOutcome::Delivered(1));
	assert!(store.events().await.is_empty());
	assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
