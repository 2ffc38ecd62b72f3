// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reporter configuration.
//!
//! Configuration is resolved once at process start from layers, lowest
//! precedence first:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file
//! 3. `BEACON_*` environment variables
//!
//! Each source produces a [`ReporterConfigLayer`]; layers are merged and then
//! finalized into a [`ReporterConfig`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use beacon_common_http::HttpClientConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Delay between the last capture and the flush it triggers.
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(500);
/// Events kept in the persistence store.
pub const DEFAULT_STORE_CAPACITY: usize = 100;
/// Version tag sent when the host does not provide one.
pub const DEFAULT_APP_VERSION: &str = "1.0.0";

const ENV_PREFIX: &str = "BEACON_";

/// Process mode. Only [`ReportingMode::Production`] reports anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportingMode {
	Production,
	#[default]
	Development,
	Test,
}

impl ReportingMode {
	pub fn is_reporting_enabled(self) -> bool {
		matches!(self, ReportingMode::Production)
	}
}

impl fmt::Display for ReportingMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ReportingMode::Production => "production",
			ReportingMode::Development => "development",
			ReportingMode::Test => "test",
		};
		f.write_str(s)
	}
}

impl FromStr for ReportingMode {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"production" | "prod" => Ok(ReportingMode::Production),
			"development" | "dev" => Ok(ReportingMode::Development),
			"test" => Ok(ReportingMode::Test),
			other => Err(ConfigError::invalid_value(
				"mode",
				format!("unknown mode '{other}'"),
			)),
		}
	}
}

/// One partial source of configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReporterConfigLayer {
	pub mode: Option<ReportingMode>,
	pub endpoint: Option<String>,
	pub app_version: Option<String>,
	pub debounce_ms: Option<u64>,
	pub store_capacity: Option<usize>,
	pub storage_dir: Option<PathBuf>,
	pub request_timeout_secs: Option<u64>,
}

impl ReporterConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.mode.is_some() {
			self.mode = other.mode;
		}
		if other.endpoint.is_some() {
			self.endpoint = other.endpoint;
		}
		if other.app_version.is_some() {
			self.app_version = other.app_version;
		}
		if other.debounce_ms.is_some() {
			self.debounce_ms = other.debounce_ms;
		}
		if other.store_capacity.is_some() {
			self.store_capacity = other.store_capacity;
		}
		if other.storage_dir.is_some() {
			self.storage_dir = other.storage_dir;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
	}

	pub fn finalize(self) -> ReporterConfig {
		let mut http = HttpClientConfig::default();
		if let Some(secs) = self.request_timeout_secs {
			http.timeout = Duration::from_secs(secs);
		}

		ReporterConfig {
			mode: self.mode.unwrap_or_default(),
			endpoint: self.endpoint.filter(|e| !e.trim().is_empty()),
			app_version: self
				.app_version
				.filter(|v| !v.is_empty())
				.unwrap_or_else(|| DEFAULT_APP_VERSION.to_string()),
			debounce_delay: self
				.debounce_ms
				.map(Duration::from_millis)
				.unwrap_or(DEFAULT_DEBOUNCE_DELAY),
			store_capacity: self
				.store_capacity
				.filter(|c| *c > 0)
				.unwrap_or(DEFAULT_STORE_CAPACITY),
			storage_dir: self.storage_dir.or_else(default_storage_dir),
			http,
		}
	}

	/// Parses a TOML document.
	pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
		toml::from_str(contents).map_err(|source| ConfigError::TomlParse {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Reads a TOML file. A missing file is an empty layer.
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		if !path.exists() {
			debug!(path = %path.display(), "reporter config file not found, skipping");
			return Ok(Self::default());
		}
		let contents = std::fs::read_to_string(path)?;
		Self::from_toml_str(&contents, path)
	}

	/// Reads `BEACON_*` variables from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_vars(std::env::vars())
	}

	/// Reads `BEACON_*` variables from an iterator of key/value pairs.
	pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = (String, String)>,
	{
		let mut layer = Self::default();

		for (key, value) in vars {
			let Some(name) = key.strip_prefix(ENV_PREFIX) else {
				continue;
			};
			match name {
				"MODE" => layer.mode = Some(value.parse()?),
				"ENDPOINT" => layer.endpoint = Some(value),
				"APP_VERSION" => layer.app_version = Some(value),
				"DEBOUNCE_MS" => layer.debounce_ms = Some(parse_number(&key, &value)?),
				"STORE_CAPACITY" => layer.store_capacity = Some(parse_number(&key, &value)?),
				"STORAGE_DIR" => layer.storage_dir = Some(PathBuf::from(value)),
				"REQUEST_TIMEOUT_SECS" => {
					layer.request_timeout_secs = Some(parse_number(&key, &value)?)
				}
				_ => {}
			}
		}

		Ok(layer)
	}
}

fn parse_number<T>(field: &str, value: &str) -> Result<T, ConfigError>
where
	T: FromStr,
	T::Err: fmt::Display,
{
	value
		.trim()
		.parse()
		.map_err(|e: T::Err| ConfigError::invalid_value(field, e.to_string()))
}

fn default_storage_dir() -> Option<PathBuf> {
	dirs::data_dir().map(|p| p.join("beacon"))
}

/// Fully resolved reporter configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReporterConfig {
	pub mode: ReportingMode,
	/// Collection endpoint URL. Required when reporting is enabled.
	pub endpoint: Option<String>,
	pub app_version: String,
	pub debounce_delay: Duration,
	pub store_capacity: usize,
	/// Directory of the durable store. `None` keeps failed reports in memory.
	pub storage_dir: Option<PathBuf>,
	/// Shared with the application's primary HTTP client.
	pub http: HttpClientConfig,
}

impl Default for ReporterConfig {
	fn default() -> Self {
		ReporterConfigLayer::default().finalize()
	}
}

impl ReporterConfig {
	pub fn is_reporting_enabled(&self) -> bool {
		self.mode.is_reporting_enabled()
	}
}

/// Loads configuration from an optional TOML file and the environment.
pub fn load_config(path: Option<&Path>) -> Result<ReporterConfig, ConfigError> {
	let mut layer = ReporterConfigLayer::default();
	if let Some(path) = path {
		layer.merge(ReporterConfigLayer::from_file(path)?);
	}
	layer.merge(ReporterConfigLayer::from_env()?);
	Ok(layer.finalize())
}
