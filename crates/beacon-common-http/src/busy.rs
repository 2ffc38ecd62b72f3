// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Busy-indicator boundary around HTTP request lifecycles.

use std::sync::Arc;

use tracing::trace;

/// Something that can show and hide a busy indicator (spinner, progress bar).
pub trait BusyIndicator: Send + Sync {
	fn show(&self);
	fn hide(&self);
}

/// Indicator for hosts without any busy UI.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIndicator;

impl BusyIndicator for NoopIndicator {
	fn show(&self) {}
	fn hide(&self) {}
}

/// Signals busy when created (if asked to) and idle when dropped.
///
/// Idle is signalled on drop whether or not busy was shown, so a request that
/// fails or is cancelled always clears the indicator.
pub struct BusyGuard {
	indicator: Arc<dyn BusyIndicator>,
}

impl BusyGuard {
	pub fn begin(indicator: Arc<dyn BusyIndicator>, show_loading: bool) -> Self {
		if show_loading {
			trace!("showing busy indicator");
			indicator.show();
		}
		Self { indicator }
	}
}

impl Drop for BusyGuard {
	fn drop(&mut self) {
		trace!("hiding busy indicator");
		self.indicator.hide();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Default)]
	struct CountingIndicator {
		shown: AtomicUsize,
		hidden: AtomicUsize,
	}

	impl BusyIndicator for CountingIndicator {
		fn show(&self) {
			self.shown.fetch_add(1, Ordering::SeqCst);
		}

		fn hide(&self) {
			self.hidden.fetch_add(1, Ordering::SeqCst);
		}
	}

	#[test]
	fn guard_shows_then_hides() {
		let indicator = Arc::new(CountingIndicator::default());
		{
			let _guard = BusyGuard::begin(indicator.clone(), true);
			assert_eq!(indicator.shown.load(Ordering::SeqCst), 1);
			assert_eq!(indicator.hidden.load(Ordering::SeqCst), 0);
		}
		assert_eq!(indicator.hidden.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn guard_without_loading_still_hides() {
		let indicator = Arc::new(CountingIndicator::default());
		drop(BusyGuard::begin(indicator.clone(), false));
		assert_eq!(indicator.shown.load(Ordering::SeqCst), 0);
		assert_eq!(indicator.hidden.load(Ordering::SeqCst), 1);
	}
}
