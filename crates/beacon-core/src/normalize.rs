// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Conversion of raw capture data into [`ErrorEvent`]s.
//!
//! Capture sources rarely have complete data: a script error may lack a stack,
//! a rejection reason may be any value at all, a failed request may have no
//! response. Every missing piece degrades to a fixed default so that
//! normalization never fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::EventContext;
use crate::event::{ErrorEvent, EventDetail};
use crate::http::FailedExchange;
use crate::redact::redact_map;

/// Element tags whose load failures are reported.
pub const TRACKED_RESOURCE_TAGS: [&str; 4] = ["IMG", "SCRIPT", "LINK", "IFRAME"];

const UNKNOWN: &str = "unknown";
const UNKNOWN_REJECTION: &str = "Unknown Promise Error";
const DEFAULT_SCRIPT_MESSAGE: &str = "Script error";
const DEFAULT_MANUAL_MESSAGE: &str = "Manual report";

/// A global script error (or a panic).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptFailure {
	pub message: Option<String>,
	pub source: Option<String>,
	pub line: Option<u32>,
	pub column: Option<u32>,
	pub stack: Option<String>,
}

/// A failed resource load, as seen by a capture-phase listener.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFailure {
	/// Element tag name, any case.
	pub tag: String,
	/// `src` or `href` of the element.
	pub url: Option<String>,
}

impl ResourceFailure {
	pub fn new(tag: impl Into<String>, url: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			url: Some(url.into()),
		}
	}

	pub fn is_tracked(&self) -> bool {
		TRACKED_RESOURCE_TAGS
			.iter()
			.any(|tag| tag.eq_ignore_ascii_case(&self.tag))
	}
}

/// An error raised inside a UI-framework hook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkFailure {
	pub message: Option<String>,
	pub stack: Option<String>,
	pub component: Option<String>,
	/// Lifecycle hint, e.g. `mounted hook`.
	pub lifecycle: Option<String>,
}

/// A warning emitted by the UI framework.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkWarning {
	pub message: Option<String>,
	pub trace: Option<String>,
	pub component: Option<String>,
}

/// Raw failure data from any capture source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
	Script(ScriptFailure),
	/// Reason of an unhandled rejection; any JSON value, or nothing.
	Rejection(Option<Value>),
	Resource(ResourceFailure),
	Framework(FrameworkFailure),
	Warning(FrameworkWarning),
	Http(FailedExchange),
	Manual(Map<String, Value>),
}

fn or_default(value: Option<String>, default: &str) -> String {
	value
		.filter(|v| !v.is_empty())
		.unwrap_or_else(|| default.to_string())
}

fn rejection_parts(reason: Option<Value>) -> (String, String) {
	match reason {
		None | Some(Value::Null) | Some(Value::Bool(false)) => {
			(UNKNOWN_REJECTION.to_string(), String::new())
		}
		Some(Value::String(s)) if s.is_empty() => (UNKNOWN_REJECTION.to_string(), String::new()),
		Some(Value::String(s)) => (s, String::new()),
		Some(Value::Object(map)) => {
			let message = map
				.get("message")
				.and_then(Value::as_str)
				.filter(|m| !m.is_empty())
				.unwrap_or(UNKNOWN_REJECTION)
				.to_string();
			let stack = map
				.get("stack")
				.and_then(Value::as_str)
				.unwrap_or_default()
				.to_string();
			(message, stack)
		}
		Some(other) => (other.to_string(), String::new()),
	}
}

/// Builds the single event for `raw`, stamped with `context`.
pub fn normalize(raw: RawFailure, context: EventContext) -> ErrorEvent {
	let (message, detail) = match raw {
		RawFailure::Script(failure) => (
			or_default(failure.message, DEFAULT_SCRIPT_MESSAGE),
			EventDetail::ScriptError {
				source: failure.source.unwrap_or_default(),
				line: failure.line.unwrap_or(0),
				column: failure.column.unwrap_or(0),
				stack: failure.stack.unwrap_or_default(),
			},
		),
		RawFailure::Rejection(reason) => {
			let (message, stack) = rejection_parts(reason);
			(message, EventDetail::UnhandledRejection { stack })
		}
		RawFailure::Resource(failure) => {
			let url = failure.url.unwrap_or_default();
			(
				format!("Resource load failed: {url}"),
				EventDetail::ResourceLoadError {
					resource_type: failure.tag.to_lowercase(),
					resource_url: url,
				},
			)
		}
		RawFailure::Framework(failure) => (
			failure.message.unwrap_or_default(),
			EventDetail::FrameworkError {
				stack: failure.stack.unwrap_or_default(),
				component: or_default(failure.component, UNKNOWN),
				lifecycle: failure.lifecycle.unwrap_or_default(),
			},
		),
		RawFailure::Warning(warning) => (
			warning.message.unwrap_or_default(),
			EventDetail::FrameworkWarning {
				trace: warning.trace.unwrap_or_default(),
				component: or_default(warning.component, UNKNOWN),
			},
		),
		RawFailure::Http(exchange) => {
			let message = exchange.message();
			(message, EventDetail::HttpRequestError(exchange.classify()))
		}
		RawFailure::Manual(mut fields) => {
			redact_map(&mut fields);
			let message = fields
				.get("message")
				.and_then(Value::as_str)
				.filter(|m| !m.is_empty())
				.unwrap_or(DEFAULT_MANUAL_MESSAGE)
				.to_string();
			(message, EventDetail::ManualReport { fields })
		}
	};

	ErrorEvent::new(message, detail, context)
}
