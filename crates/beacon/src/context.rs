// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment context supplied by the host application.

use beacon_core::{EnvironmentSnapshot, Viewport, ANONYMOUS_USER};
use parking_lot::RwLock;

/// Source of the environment every captured event is stamped with.
///
/// Called once per capture; implementations must be cheap and must not block.
pub trait ContextProvider: Send + Sync {
	fn snapshot(&self) -> EnvironmentSnapshot;
}

/// A context provider the host updates as the user navigates and logs in.
#[derive(Debug)]
pub struct StaticContextProvider {
	current: RwLock<EnvironmentSnapshot>,
}

impl Default for StaticContextProvider {
	fn default() -> Self {
		Self::new(EnvironmentSnapshot {
			user_agent: beacon_common_http::user_agent(),
			..Default::default()
		})
	}
}

impl StaticContextProvider {
	pub fn new(snapshot: EnvironmentSnapshot) -> Self {
		Self {
			current: RwLock::new(snapshot),
		}
	}

	pub fn set_url(&self, url: impl Into<String>) {
		self.current.write().url = url.into();
	}

	pub fn set_referrer(&self, referrer: impl Into<String>) {
		self.current.write().referrer = referrer.into();
	}

	pub fn set_route(&self, route: impl Into<String>) {
		self.current.write().route = route.into();
	}

	pub fn set_viewport(&self, viewport: Viewport) {
		self.current.write().viewport = viewport;
	}

	/// Sets the signed-in user. `None` reverts to the anonymous marker.
	pub fn set_user_id(&self, user_id: Option<String>) {
		self.current.write().user_id = user_id
			.filter(|id| !id.is_empty())
			.unwrap_or_else(|| ANONYMOUS_USER.to_string());
	}
}

impl ContextProvider for StaticContextProvider {
	fn snapshot(&self) -> EnvironmentSnapshot {
		self.current.read().clone()
	}
}
