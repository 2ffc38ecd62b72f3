// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment context stamped on every event.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User id reported when the host has not identified anyone.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Visible area of the client, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
	pub width: u32,
	pub height: u32,
}

impl Viewport {
	pub fn new(width: u32, height: u32) -> Self {
		Self { width, height }
	}
}

impl fmt::Display for Viewport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}x{}", self.width, self.height)
	}
}

/// Environment snapshot at capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
	pub timestamp: DateTime<Utc>,
	/// Client identity string (user agent).
	pub user_agent: String,
	pub url: String,
	pub referrer: String,
	pub viewport: Viewport,
	pub route: String,
	/// Opaque user or session identifier.
	pub user_id: String,
}

/// Everything in [`EventContext`] except the timestamp.
///
/// Hosts keep one of these current (navigation, login) and the reporter stamps
/// it with the capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
	pub user_agent: String,
	pub url: String,
	pub referrer: String,
	pub viewport: Viewport,
	pub route: String,
	pub user_id: String,
}

impl Default for EnvironmentSnapshot {
	fn default() -> Self {
		Self {
			user_agent: String::new(),
			url: String::new(),
			referrer: String::new(),
			viewport: Viewport::default(),
			route: String::new(),
			user_id: ANONYMOUS_USER.to_string(),
		}
	}
}

impl EnvironmentSnapshot {
	pub fn into_context(self, timestamp: DateTime<Utc>) -> EventContext {
		EventContext {
			timestamp,
			user_agent: self.user_agent,
			url: self.url,
			referrer: self.referrer,
			viewport: self.viewport,
			route: self.route,
			user_id: if self.user_id.is_empty() {
				ANONYMOUS_USER.to_string()
			} else {
				self.user_id
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_snapshot_is_anonymous() {
		let ctx = EnvironmentSnapshot::default().into_context(Utc::now());
		assert_eq!(ctx.user_id, ANONYMOUS_USER);
		assert_eq!(ctx.viewport, Viewport::default());
	}

	#[test]
	fn empty_user_id_falls_back_to_anonymous() {
		let snapshot = EnvironmentSnapshot {
			user_id: String::new(),
			..Default::default()
		};
		assert_eq!(snapshot.into_context(Utc::now()).user_id, ANONYMOUS_USER);
	}

	#[test]
	fn viewport_displays_as_dimensions() {
		assert_eq!(Viewport::new(1920, 1080).to_string(), "1920x1080");
	}
}
