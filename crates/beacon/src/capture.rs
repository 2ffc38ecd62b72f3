// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capture sources: the entry points that feed failures into the reporter.
//!
//! Every method here is synchronous, never fails, and returns the id of the
//! recorded event, or `None` when reporting is disabled, the reporter is shut
//! down, or the signal is one that is not tracked.

use std::backtrace::Backtrace;
use std::panic::PanicHookInfo;
use std::sync::Arc;

use beacon_core::{
	EventId, FailedExchange, FrameworkFailure, FrameworkWarning, RawFailure, RequestInfo,
	ResourceFailure, ScriptFailure, TIMEOUT_CODE,
};
use serde_json::{Map, Value};
use tracing::trace;

use crate::reporter::ErrorReporter;

impl ErrorReporter {
	/// Records an uncaught script error.
	pub fn capture_script_error(&self, failure: ScriptFailure) -> Option<EventId> {
		self.inner.capture(RawFailure::Script(failure))
	}

	/// Records an unhandled rejection. The reason may be any JSON value.
	pub fn capture_rejection(&self, reason: Option<Value>) -> Option<EventId> {
		self.inner.capture(RawFailure::Rejection(reason))
	}

	/// Records a failed resource load. Untracked element tags are ignored.
	pub fn capture_resource_error(&self, failure: ResourceFailure) -> Option<EventId> {
		if !failure.is_tracked() {
			trace!(tag = %failure.tag, "ignoring resource failure for untracked tag");
			return None;
		}
		self.inner.capture(RawFailure::Resource(failure))
	}

	pub fn capture_framework_error(&self, failure: FrameworkFailure) -> Option<EventId> {
		self.inner.capture(RawFailure::Framework(failure))
	}

	pub fn capture_framework_warning(&self, warning: FrameworkWarning) -> Option<EventId> {
		self.inner.capture(RawFailure::Warning(warning))
	}

	/// Records a failed HTTP exchange from the application's own client.
	///
	/// The request params and body are redacted before they are queued.
	pub fn capture_http_failure(&self, exchange: FailedExchange) -> Option<EventId> {
		self.inner.capture(RawFailure::Http(exchange))
	}

	/// Records a report raised explicitly by application code.
	///
	/// The `message` field, if present, becomes the event message. Sensitive
	/// top-level fields are masked.
	pub fn report_manual(&self, fields: Map<String, Value>) -> Option<EventId> {
		self.inner.capture(RawFailure::Manual(fields))
	}

	/// Installs a panic hook that records every panic as a script error.
	///
	/// The previous hook still runs afterwards. The hook holds only a weak
	/// reference, so it stops reporting once every reporter handle is dropped.
	///
	/// The hook never blocks: a panic raised while the panicking thread holds
	/// the reporter's queue lock is not recorded.
	pub fn install_panic_hook(&self) {
		let weak = Arc::downgrade(&self.inner);
		let previous = std::panic::take_hook();

		std::panic::set_hook(Box::new(move |info| {
			let backtrace = Backtrace::force_capture();
			if let Some(inner) = weak.upgrade() {
				inner.try_capture(RawFailure::Script(script_failure_from_panic(info, &backtrace)));
			}
			previous(info);
		}));
	}
}

fn script_failure_from_panic(info: &PanicHookInfo<'_>, backtrace: &Backtrace) -> ScriptFailure {
	let location = info.location();
	ScriptFailure {
		message: Some(panic_message(info)),
		source: location.map(|l| l.file().to_string()),
		line: location.map(|l| l.line()),
		column: location.map(|l| l.column()),
		stack: Some(backtrace.to_string()),
	}
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
	if let Some(s) = info.payload().downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = info.payload().downcast_ref::<String>() {
		s.clone()
	} else {
		"Box<dyn Any>".to_string()
	}
}

/// Describes a failed `reqwest` call for [`ErrorReporter::capture_http_failure`].
///
/// `request` carries what the caller knows about the request; the URL falls
/// back to the one recorded on the error. Timeouts are tagged with
/// [`TIMEOUT_CODE`].
pub fn failed_exchange_from_reqwest(
	err: &reqwest::Error,
	request: Option<RequestInfo>,
) -> FailedExchange {
	let mut request = request.unwrap_or_default();
	if request.url.is_none() {
		request.url = err.url().map(|u| u.to_string());
	}

	match err.status() {
		Some(status) => FailedExchange::from_status(
			request,
			status.as_u16(),
			status.canonical_reason().map(str::to_string),
			None,
		),
		None => {
			let code = err.is_timeout().then(|| TIMEOUT_CODE.to_string());
			FailedExchange::network(request, code, Some(err.to_string()))
		}
	}
}
