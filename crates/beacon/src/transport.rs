// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery of report batches to the collection endpoint.

use async_trait::async_trait;
use beacon_common_http::HttpClientConfig;
use beacon_core::ReportPayload;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::{ReporterError, Result};

/// Sends one batch. Any error means the whole batch was not delivered.
#[async_trait]
pub trait ReportSender: Send + Sync {
	async fn send_batch(&self, payload: &ReportPayload) -> Result<()>;
}

/// Posts batches as JSON to a fixed URL.
///
/// Requests go out without retry. The reporter's own failures must never
/// generate further reports, so nothing here feeds back into capture.
#[derive(Debug, Clone)]
pub struct HttpReportSender {
	client: reqwest::Client,
	endpoint: reqwest::Url,
}

impl HttpReportSender {
	pub fn new(client: reqwest::Client, endpoint: reqwest::Url) -> Self {
		Self { client, endpoint }
	}

	/// Builds a dedicated client sharing the application's request settings.
	pub fn from_config(config: &HttpClientConfig, endpoint: reqwest::Url) -> Result<Self> {
		let client = beacon_common_http::new_client(config)?;
		Ok(Self::new(client, endpoint))
	}

	pub fn endpoint(&self) -> &reqwest::Url {
		&self.endpoint
	}
}

/// Parses an http(s) collection URL, dropping any trailing slash.
pub fn parse_endpoint(raw: &str) -> Result<reqwest::Url> {
	let url = reqwest::Url::parse(raw.trim().trim_end_matches('/'))
		.map_err(|e| ReporterError::InvalidEndpoint(format!("{raw}: {e}")))?;
	match url.scheme() {
		"http" | "https" => Ok(url),
		other => Err(ReporterError::InvalidEndpoint(format!(
			"{raw}: unsupported scheme '{other}'"
		))),
	}
}

#[async_trait]
impl ReportSender for HttpReportSender {
	async fn send_batch(&self, payload: &ReportPayload) -> Result<()> {
		let body = payload.encode()?;

		debug!(
			url = %self.endpoint,
			count = payload.len(),
			"sending error report batch"
		);

		let response = self
			.client
			.post(self.endpoint.clone())
			.header(CONTENT_TYPE, "application/json")
			.body(body)
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(ReporterError::ServerError {
				status: status.as_u16(),
				message,
			});
		}

		debug!(count = payload.len(), "error report batch delivered");
		Ok(())
	}
}
