// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client-side error reporting SDK.
//!
//! Captures failures from many sources, normalizes them into one event shape,
//! batches them behind a debounce timer and posts each batch to a collection
//! endpoint. Batches that cannot be delivered are kept in a bounded durable
//! store and retried on the next start.
//!
//! # Example
//!
//! ```ignore
//! use beacon::{ErrorReporter, ReportingMode, ScriptFailure};
//!
//! let reporter = ErrorReporter::builder()
//!     .mode(ReportingMode::Production)
//!     .endpoint("https://collect.example.com/api/errors")
//!     .app_version(env!("CARGO_PKG_VERSION"))
//!     .build_and_retry()
//!     .await?;
//!
//! reporter.install_panic_hook();
//! reporter.capture_script_error(ScriptFailure {
//!     message: Some("cannot read property 'id' of undefined".into()),
//!     ..Default::default()
//! });
//!
//! reporter.shutdown().await?;
//! ```

mod capture;
mod config;
mod context;
mod error;
mod queue;
mod reporter;
mod store;
mod transport;

pub use capture::failed_exchange_from_reqwest;
pub use config::{
	load_config, ReporterConfig, ReporterConfigLayer, ReportingMode, DEFAULT_APP_VERSION,
	DEFAULT_DEBOUNCE_DELAY, DEFAULT_STORE_CAPACITY,
};
pub use context::{ContextProvider, StaticContextProvider};
pub use error::{ConfigError, ReporterError, Result};
pub use queue::{Debouncer, DeliveryQueue, InFlight};
pub use reporter::{ErrorReporter, ErrorReporterBuilder, FlushOutcome};
pub use store::{FailedReportStore, FileReportStore, MemoryReportStore};
pub use transport::{parse_endpoint, HttpReportSender, ReportSender};

pub use beacon_common_http::{BusyGuard, BusyIndicator, HttpClientConfig, NoopIndicator};
pub use beacon_core::{
	EnvironmentSnapshot, ErrorEvent, ErrorKind, EventContext, EventDetail, EventId,
	FailedExchange, FrameworkFailure, FrameworkWarning, HttpFailureClass, HttpFailureDetail,
	RequestInfo, ResourceFailure, ResponseInfo, ReportPayload, ScriptFailure, Viewport,
};
