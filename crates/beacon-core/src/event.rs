// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The canonical error event.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::context::EventContext;
use crate::error::CoreError;
use crate::http::HttpFailureDetail;

/// Unique identity of a captured event.
///
/// Used by the delivery queue to remove exactly the events of a flushed
/// snapshot, independent of anything enqueued while the request was in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
	pub fn new() -> Self {
		Self(Uuid::now_v7())
	}
}

impl Default for EventId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for EventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for EventId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
	/// Uncaught script error (or a Rust panic).
	ScriptError,
	/// Promise rejection nobody handled.
	UnhandledRejection,
	/// An image, script, stylesheet or frame failed to load.
	ResourceLoadError,
	/// Error raised inside a UI-framework lifecycle hook.
	FrameworkError,
	/// Warning emitted by the UI framework.
	FrameworkWarning,
	/// Failed HTTP exchange seen by the HTTP client.
	HttpRequestError,
	/// Explicit report from application code.
	ManualReport,
}

impl ErrorKind {
	pub const ALL: [ErrorKind; 7] = [
		ErrorKind::ScriptError,
		ErrorKind::UnhandledRejection,
		ErrorKind::ResourceLoadError,
		ErrorKind::FrameworkError,
		ErrorKind::FrameworkWarning,
		ErrorKind::HttpRequestError,
		ErrorKind::ManualReport,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorKind::ScriptError => "SCRIPT_ERROR",
			ErrorKind::UnhandledRejection => "UNHANDLED_REJECTION",
			ErrorKind::ResourceLoadError => "RESOURCE_LOAD_ERROR",
			ErrorKind::FrameworkError => "FRAMEWORK_ERROR",
			ErrorKind::FrameworkWarning => "FRAMEWORK_WARNING",
			ErrorKind::HttpRequestError => "HTTP_REQUEST_ERROR",
			ErrorKind::ManualReport => "MANUAL_REPORT",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ErrorKind {
	type Err = CoreError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		ErrorKind::ALL
			.into_iter()
			.find(|kind| kind.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| CoreError::InvalidKind(s.to_string()))
	}
}

/// Kind-specific fields of an event, tagged by `kind` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
	tag = "kind",
	rename_all = "SCREAMING_SNAKE_CASE",
	rename_all_fields = "camelCase"
)]
pub enum EventDetail {
	ScriptError {
		source: String,
		line: u32,
		column: u32,
		stack: String,
	},
	UnhandledRejection {
		stack: String,
	},
	ResourceLoadError {
		/// Lower-cased element tag, e.g. `img`.
		resource_type: String,
		resource_url: String,
	},
	FrameworkError {
		stack: String,
		component: String,
		lifecycle: String,
	},
	FrameworkWarning {
		trace: String,
		component: String,
	},
	HttpRequestError(HttpFailureDetail),
	ManualReport {
		fields: Map<String, Value>,
	},
}

impl EventDetail {
	pub fn kind(&self) -> ErrorKind {
		match self {
			EventDetail::ScriptError { .. } => ErrorKind::ScriptError,
			EventDetail::UnhandledRejection { .. } => ErrorKind::UnhandledRejection,
			EventDetail::ResourceLoadError { .. } => ErrorKind::ResourceLoadError,
			EventDetail::FrameworkError { .. } => ErrorKind::FrameworkError,
			EventDetail::FrameworkWarning { .. } => ErrorKind::FrameworkWarning,
			EventDetail::HttpRequestError(_) => ErrorKind::HttpRequestError,
			EventDetail::ManualReport { .. } => ErrorKind::ManualReport,
		}
	}
}

/// One captured failure, normalized and enriched with environment context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
	pub id: EventId,
	pub message: String,
	pub detail: EventDetail,
	pub context: EventContext,
}

impl ErrorEvent {
	pub fn new(message: impl Into<String>, detail: EventDetail, context: EventContext) -> Self {
		Self {
			id: EventId::new(),
			message: message.into(),
			detail,
			context,
		}
	}

	pub fn kind(&self) -> ErrorKind {
		self.detail.kind()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::EnvironmentSnapshot;
	use chrono::Utc;
	use proptest::prelude::*;

	fn context() -> EventContext {
		EnvironmentSnapshot::default().into_context(Utc::now())
	}

	#[test]
	fn kind_is_serialized_as_detail_tag() {
		let event = ErrorEvent::new(
			"boom",
			EventDetail::ResourceLoadError {
				resource_type: "img".to_string(),
				resource_url: "https://cdn.example.com/a.png".to_string(),
			},
			context(),
		);

		let json = serde_json::to_value(&event).unwrap();
		assert_eq!(json["detail"]["kind"], "RESOURCE_LOAD_ERROR");
		assert_eq!(json["detail"]["resourceType"], "img");
		assert_eq!(json["detail"]["resourceUrl"], "https://cdn.example.com/a.png");
	}

	#[test]
	fn unknown_kind_tag_is_rejected() {
		let event = ErrorEvent::new(
			"boom",
			EventDetail::UnhandledRejection {
				stack: String::new(),
			},
			context(),
		);
		let mut json = serde_json::to_value(&event).unwrap();
		json["detail"]["kind"] = Value::String("SOMETHING_ELSE".to_string());

		assert!(serde_json::from_value::<ErrorEvent>(json).is_err());
	}

	#[test]
	fn detail_kind_matches_variant() {
		let detail = EventDetail::FrameworkWarning {
			trace: "at <App>".to_string(),
			component: "App".to_string(),
		};
		assert_eq!(detail.kind(), ErrorKind::FrameworkWarning);
	}

	#[test]
	fn kind_parses_case_insensitively() {
		assert_eq!(
			"manual_report".parse::<ErrorKind>().unwrap(),
			ErrorKind::ManualReport
		);
		assert!(matches!(
			"whatever".parse::<ErrorKind>(),
			Err(CoreError::InvalidKind(_))
		));
	}

	#[test]
	fn kind_display_matches_wire_tag() {
		for kind in ErrorKind::ALL {
			let json = serde_json::to_value(kind).unwrap();
			assert_eq!(json, Value::String(kind.to_string()));
		}
	}

	proptest! {
		#[test]
		fn event_id_roundtrip(uuid_bytes in any::<[u8; 16]>()) {
			let id = EventId(Uuid::from_bytes(uuid_bytes));
			let parsed: EventId = id.to_string().parse().unwrap();
			prop_assert_eq!(id, parsed);
		}
	}
}
