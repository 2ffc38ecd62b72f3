// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Classification of failed HTTP exchanges.
//!
//! The host's HTTP client hands over whatever it knows about a failed request
//! as a [`FailedExchange`]; [`FailedExchange::classify`] turns it into the
//! [`HttpFailureDetail`] carried by `HTTP_REQUEST_ERROR` events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::redact::redact_fields;

/// Error code HTTP clients use for an aborted (timed out) request.
pub const TIMEOUT_CODE: &str = "ECONNABORTED";

const DEFAULT_METHOD: &str = "GET";
const NETWORK_ERROR_TEXT: &str = "Network Error";
const DEFAULT_MESSAGE: &str = "Request failed";

/// The request half of a failed exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
	pub method: Option<String>,
	pub url: Option<String>,
	pub params: Option<Value>,
	pub body: Option<Value>,
}

/// The response half of a failed exchange, when one was received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInfo {
	pub status: u16,
	pub status_text: Option<String>,
	pub body: Option<Value>,
}

/// Raw data about a failed HTTP exchange. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedExchange {
	pub request: Option<RequestInfo>,
	pub response: Option<ResponseInfo>,
	/// Client error code, e.g. [`TIMEOUT_CODE`].
	pub code: Option<String>,
	pub message: Option<String>,
}

/// How an exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HttpFailureClass {
	/// No response was received.
	Network,
	/// No response was received before the client gave up.
	Timeout,
	/// A response arrived with an unexpected status.
	Status { code: u16 },
}

impl HttpFailureClass {
	pub fn status(&self) -> Option<u16> {
		match self {
			HttpFailureClass::Status { code } => Some(*code),
			_ => None,
		}
	}

	/// 401: the host is expected to send the user back to login.
	pub fn is_unauthorized(&self) -> bool {
		self.status() == Some(401)
	}

	pub fn is_not_found(&self) -> bool {
		self.status() == Some(404)
	}

	pub fn is_server_error(&self) -> bool {
		matches!(self.status(), Some(500..=599))
	}
}

/// Detail of an `HTTP_REQUEST_ERROR` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpFailureDetail {
	pub failure: HttpFailureClass,
	pub method: String,
	pub url: String,
	pub params: Value,
	pub body: Value,
	pub status: u16,
	pub status_text: String,
	pub response_body: Value,
}

impl FailedExchange {
	/// Exchange that got a response with a non-success status.
	pub fn from_status(
		request: RequestInfo,
		status: u16,
		status_text: Option<String>,
		body: Option<Value>,
	) -> Self {
		Self {
			request: Some(request),
			response: Some(ResponseInfo {
				status,
				status_text,
				body,
			}),
			code: None,
			message: Some(format!("Request failed with status code {status}")),
		}
	}

	/// Exchange that never got a response.
	pub fn network(request: RequestInfo, code: Option<String>, message: Option<String>) -> Self {
		Self {
			request: Some(request),
			response: None,
			code,
			message,
		}
	}

	pub fn failure_class(&self) -> HttpFailureClass {
		match &self.response {
			Some(response) => HttpFailureClass::Status {
				code: response.status,
			},
			None if self.code.as_deref() == Some(TIMEOUT_CODE) => HttpFailureClass::Timeout,
			None => HttpFailureClass::Network,
		}
	}

	pub fn message(&self) -> String {
		self
			.message
			.as_deref()
			.filter(|m| !m.is_empty())
			.unwrap_or(DEFAULT_MESSAGE)
			.to_string()
	}

	/// Classifies the exchange, redacting request params and body.
	pub fn classify(self) -> HttpFailureDetail {
		let failure = self.failure_class();
		let request = self.request.unwrap_or_default();

		let (status, status_text, response_body) = match self.response {
			Some(response) => (
				response.status,
				response.status_text.unwrap_or_default(),
				response.body.unwrap_or_else(|| Value::String(String::new())),
			),
			None => (
				0,
				NETWORK_ERROR_TEXT.to_string(),
				Value::String(String::new()),
			),
		};

		HttpFailureDetail {
			failure,
			method: request
				.method
				.filter(|m| !m.is_empty())
				.unwrap_or_else(|| DEFAULT_METHOD.to_string()),
			url: request.url.unwrap_or_default(),
			params: redact_fields(request.params.unwrap_or_else(empty_object)),
			body: redact_fields(request.body.unwrap_or_else(empty_object)),
			status,
			status_text,
			response_body,
		}
	}
}

fn empty_object() -> Value {
	Value::Object(serde_json::Map::new())
}
