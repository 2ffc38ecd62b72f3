// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: capture a handful of failures and deliver them with the beacon SDK.
//!
//! Run with:
//!   BEACON_MODE=production BEACON_ENDPOINT=http://localhost:8080/api/errors \
//!     cargo run --example report_errors -p beacon

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use beacon::{
	failed_exchange_from_reqwest, load_config, BusyGuard, BusyIndicator, ErrorReporter,
	FrameworkFailure, RequestInfo, ResourceFailure, StaticContextProvider, Viewport,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

struct ConsoleSpinner;

impl BusyIndicator for ConsoleSpinner {
	fn show(&self) {
		println!("  [loading...]");
	}

	fn hide(&self) {
		println!("  [done]");
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "beacon=debug".into()))
		.init();

	let config = load_config(Some(Path::new("beacon.toml")))?;
	println!("Mode: {}", config.mode);
	println!("Endpoint: {}", config.endpoint.as_deref().unwrap_or("(none)"));

	let context = Arc::new(StaticContextProvider::default());
	context.set_url("https://app.example.com/orders/42");
	context.set_route("/orders/:id");
	context.set_viewport(Viewport::new(1440, 900));
	context.set_user_id(Some("user_example_123".to_string()));

	let reporter = ErrorReporter::builder()
		.config(config.clone())
		.context_provider(context.clone())
		.build_and_retry()
		.await?;
	reporter.install_panic_hook();

	reporter.capture_resource_error(ResourceFailure::new("IMG", "https://cdn.example.com/logo.png"));
	reporter.capture_framework_error(FrameworkFailure {
		message: Some("Cannot read properties of undefined (reading 'total')".to_string()),
		component: Some("OrderSummary".to_string()),
		lifecycle: Some("render function".to_string()),
		..Default::default()
	});

	// Same timeout and User-Agent as the reporter's own transport.
	let client = beacon_common_http::new_client(&config.http)?;
	{
		let _busy = BusyGuard::begin(Arc::new(ConsoleSpinner), true);
		if let Err(e) = client
			.get("http://127.0.0.1:9/api/orders/42")
			.send()
			.await
			.and_then(|r| r.error_for_status())
		{
			let request = RequestInfo {
				method: Some("GET".to_string()),
				params: Some(json!({"id": 42, "token": "secret-session-token"})),
				..Default::default()
			};
			reporter.capture_http_failure(failed_exchange_from_reqwest(&e, Some(request)));
		}
	}

	let manual = json!({"message": "checkout retried", "cardNo": "4111111111111111", "attempt": 2});
	if let serde_json::Value::Object(fields) = manual {
		reporter.report_manual(fields);
	}

	println!("Queued events: {}", reporter.queue_len());
	tokio::time::sleep(config.debounce_delay + Duration::from_millis(100)).await;

	reporter.shutdown().await?;
	println!("Stored for retry: {}", reporter.stored_len().await?);

	Ok(())
}
