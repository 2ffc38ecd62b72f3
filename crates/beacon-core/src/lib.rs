// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Beacon client-side error reporting pipeline.
//!
//! This crate holds everything that does not touch the network, the clock or
//! durable storage:
//!
//! - [`ErrorEvent`]: the canonical unit of telemetry, with a closed
//!   [`ErrorKind`] set and a kind-tagged [`EventDetail`]
//! - [`EventContext`]: the environment snapshot stamped on every event
//! - Redaction of sensitive keys in flat mappings ([`redact_fields`])
//! - Classification of failed HTTP exchanges ([`FailedExchange`])
//! - The normalizer turning raw capture data into events ([`normalize`])
//! - The collection endpoint wire payload ([`ReportPayload`])
//!
//! The SDK crate (`beacon`) wires these into the delivery queue, transport and
//! persistence store.

pub mod context;
pub mod error;
pub mod event;
pub mod http;
pub mod normalize;
pub mod payload;
pub mod redact;

pub use context::{EnvironmentSnapshot, EventContext, Viewport, ANONYMOUS_USER};
pub use error::{CoreError, Result};
pub use event::{ErrorEvent, ErrorKind, EventDetail, EventId};
pub use http::{
	FailedExchange, HttpFailureClass, HttpFailureDetail, RequestInfo, ResponseInfo, TIMEOUT_CODE,
};
pub use normalize::{
	normalize, FrameworkFailure, FrameworkWarning, RawFailure, ResourceFailure, ScriptFailure,
	TRACKED_RESOURCE_TAGS,
};
pub use payload::{ReportPayload, FAILED_REPORTS_SLOT};
pub use redact::{is_sensitive_key, redact_fields, redact_map, MASK, SENSITIVE_KEYS};
