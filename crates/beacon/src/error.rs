// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the reporter SDK.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for reporter operations.
pub type Result<T> = std::result::Result<T, ReporterError>;

/// Errors that can occur in the reporter SDK.
///
/// None of these ever reach the end user: delivery failures are routed to the
/// persistence store and storage failures are logged.
#[derive(Debug, Error)]
pub enum ReporterError {
	/// The reporter has been shut down.
	#[error("error reporter has been shut down")]
	ClientShutdown,

	/// Reporting is disabled in the current mode.
	#[error("error reporting is disabled")]
	ReportingDisabled,

	/// The collection endpoint is missing or not an http(s) URL.
	#[error("invalid collection endpoint: {0}")]
	InvalidEndpoint(String),

	/// No tokio runtime was available at build time.
	#[error("error reporter must be built inside a tokio runtime")]
	NoRuntime,

	/// Configuration could not be loaded.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// HTTP request failed before a response arrived.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Collection endpoint answered with a non-success status.
	#[error("server error (status {status}): {message}")]
	ServerError {
		/// HTTP status code.
		status: u16,
		/// Response body, if any.
		message: String,
	},

	/// Failed to encode or decode events.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Durable storage could not be read or written.
	#[error("storage error: {0}")]
	Storage(#[from] std::io::Error),

	/// Durable storage held something that is not a list of events.
	#[error("corrupt report store at {path}: {source}")]
	CorruptStore {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
}

impl From<beacon_core::CoreError> for ReporterError {
	fn from(err: beacon_core::CoreError) -> Self {
		match err {
			beacon_core::CoreError::Serialization(e) => ReporterError::Serialization(e),
			other => ReporterError::Serialization(serde::de::Error::custom(other.to_string())),
		}
	}
}

/// Errors that can occur while loading reporter configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// I/O error reading config file
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// TOML parsing error
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// Invalid value
	#[error("Invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },
}

impl ConfigError {
	/// Create an invalid value error
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}
