// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire payload for the collection endpoint.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::ErrorEvent;

/// Name of the durable slot holding undelivered events.
pub const FAILED_REPORTS_SLOT: &str = "failedErrorReports";

/// Body of one POST to the collection endpoint.
///
/// ```json
/// { "errors": [ ... ], "appVersion": "1.4.0" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
	pub errors: Vec<ErrorEvent>,
	pub app_version: String,
}

impl ReportPayload {
	pub fn new(errors: Vec<ErrorEvent>, app_version: impl Into<String>) -> Self {
		Self {
			errors,
			app_version: app_version.into(),
		}
	}

	pub fn len(&self) -> usize {
		self.errors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	pub fn encode(&self) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec(self)?)
	}

	pub fn decode(bytes: &[u8]) -> Result<Self> {
		Ok(serde_json::from_slice(bytes)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::{EnvironmentSnapshot, Viewport};
	use crate::http::{FailedExchange, RequestInfo};
	use crate::normalize::{normalize, FrameworkFailure, RawFailure, ScriptFailure};
	use crate::redact::MASK;
	use chrono::Utc;
	use serde_json::json;

	fn snapshot() -> EnvironmentSnapshot {
		EnvironmentSnapshot {
			user_agent: "beacon-test/1.0".to_string(),
			url: "https://shop.example.com/cart".to_string(),
			referrer: "https://shop.example.com/".to_string(),
			viewport: Viewport::new(1280, 720),
			route: "/cart".to_string(),
			user_id: "user-17".to_string(),
		}
	}

	#[test]
	fn payload_uses_camel_case_keys() {
		let payload = ReportPayload::new(Vec::new(), "2.3.1");
		let json: serde_json::Value = serde_json::from_slice(&payload.encode().unwrap()).unwrap();
		assert_eq!(json, json!({ "errors": [], "appVersion": "2.3.1" }));
	}

	#[test]
	fn mixed_batch_survives_the_wire() {
		let events = vec![
			normalize(
				RawFailure::Script(ScriptFailure {
					message: Some("boom".to_string()),
					line: Some(3),
					..Default::default()
				}),
				snapshot().into_context(Utc::now()),
			),
			normalize(
				RawFailure::Framework(FrameworkFailure {
					message: Some("render".to_string()),
					component: Some("Cart".to_string()),
					..Default::default()
				}),
				snapshot().into_context(Utc::now()),
			),
			normalize(
				RawFailure::Http(FailedExchange::from_status(
					RequestInfo {
						method: Some("POST".to_string()),
						url: Some("/api/pay".to_string()),
						params: None,
						body: Some(json!({ "cardNo": "4111111111111111", "amount": 12.5 })),
					},
					502,
					Some("Bad Gateway".to_string()),
					None,
				)),
				snapshot().into_context(Utc::now()),
			),
		];
		let payload = ReportPayload::new(events, "2.3.1");

		let decoded = ReportPayload::decode(&payload.encode().unwrap()).unwrap();
		assert_eq!(decoded, payload);

		let crate::event::EventDetail::HttpRequestError(detail) = &decoded.errors[2].detail else {
			panic!("expected http detail");
		};
		assert_eq!(detail.body["cardNo"], MASK);
	}

	#[test]
	fn decode_rejects_garbage() {
		assert!(ReportPayload::decode(b"not json").is_err());
	}
}
