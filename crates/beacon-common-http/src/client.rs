// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header and timeout.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Request timeout applied when nothing else is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every HTTP client the application builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
	/// Upper bound for a whole request, connect to last body byte.
	pub timeout: Duration,
	pub user_agent: String,
}

impl Default for HttpClientConfig {
	fn default() -> Self {
		Self {
			timeout: DEFAULT_REQUEST_TIMEOUT,
			user_agent: user_agent(),
		}
	}
}

impl HttpClientConfig {
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}
}

/// Creates a client builder from a shared [`HttpClientConfig`].
///
/// # Example
/// ```ignore
/// let client = beacon_common_http::builder_with_config(&config)
///     .https_only(true)
///     .build()?;
/// ```
pub fn builder_with_config(config: &HttpClientConfig) -> ClientBuilder {
	Client::builder()
		.user_agent(config.user_agent.clone())
		.timeout(config.timeout)
}

/// Builds a client from a shared [`HttpClientConfig`].
pub fn new_client(config: &HttpClientConfig) -> Result<Client, reqwest::Error> {
	builder_with_config(config).build()
}

/// Returns the standard Beacon User-Agent string.
///
/// Format: `beacon/{version}/{os}-{arch}`
pub fn user_agent() -> String {
	format!(
		"beacon/{}/{}-{}",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_correct_format() {
		let ua = user_agent();
		let parts: Vec<&str> = ua.split('/').collect();
		assert_eq!(parts.len(), 3);
		assert_eq!(parts[0], "beacon");
		assert!(parts[2].contains('-'));
	}

	#[test]
	fn default_config_uses_thirty_second_timeout() {
		let config = HttpClientConfig::default();
		assert_eq!(config.timeout, Duration::from_secs(30));
		assert_eq!(config.user_agent, user_agent());
	}

	#[test]
	fn client_builds_from_config() {
		let config = HttpClientConfig::default().with_timeout(Duration::from_secs(5));
		assert_eq!(config.timeout, Duration::from_secs(5));
		assert!(new_client(&config).is_ok());
	}
}
