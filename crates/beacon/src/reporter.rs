// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The error reporter: capture, debounced delivery and retry of failed reports.

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use beacon_core::{normalize, ErrorEvent, EventId, RawFailure, ReportPayload};
use chrono::Utc;
use tokio::runtime::Handle;
use tracing::{debug, error, info, trace, warn};

use crate::config::{ReporterConfig, ReportingMode};
use crate::context::{ContextProvider, StaticContextProvider};
use crate::error::{ReporterError, Result};
use crate::queue::{Debouncer, DeliveryQueue, InFlight};
use crate::store::{FailedReportStore, FileReportStore, MemoryReportStore};
use crate::transport::{parse_endpoint, HttpReportSender, ReportSender};

/// What a single flush did with the batch it took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
	/// Nothing was pending.
	Empty,
	/// The batch reached the collection endpoint.
	Delivered(usize),
	/// Delivery failed and the batch went to the failed-report store.
	Persisted(usize),
	/// Delivery and persistence both failed; the batch is gone.
	Discarded(usize),
}

/// Builder for constructing an [`ErrorReporter`].
pub struct ErrorReporterBuilder {
	config: ReporterConfig,
	sender: Option<Arc<dyn ReportSender>>,
	store: Option<Arc<dyn FailedReportStore>>,
	context: Option<Arc<dyn ContextProvider>>,
}

impl ErrorReporterBuilder {
	pub fn new() -> Self {
		Self {
			config: ReporterConfig::default(),
			sender: None,
			store: None,
			context: None,
		}
	}

	/// Replaces the whole configuration, typically from [`crate::load_config`].
	pub fn config(mut self, config: ReporterConfig) -> Self {
		self.config = config;
		self
	}

	pub fn mode(mut self, mode: ReportingMode) -> Self {
		self.config.mode = mode;
		self
	}

	/// Sets the collection endpoint URL.
	///
	/// Example: `https://collect.example.com/api/errors`
	pub fn endpoint(mut self, url: impl Into<String>) -> Self {
		self.config.endpoint = Some(url.into());
		self
	}

	pub fn app_version(mut self, version: impl Into<String>) -> Self {
		self.config.app_version = version.into();
		self
	}

	/// Sets the quiet period between the last capture and the flush.
	pub fn debounce_delay(mut self, delay: Duration) -> Self {
		self.config.debounce_delay = delay;
		self
	}

	pub fn store_capacity(mut self, capacity: usize) -> Self {
		self.config.store_capacity = capacity.max(1);
		self
	}

	/// Directory holding the durable failed-report store.
	pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.config.storage_dir = Some(dir.into());
		self
	}

	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.http.timeout = timeout;
		self
	}

	/// Uses a custom transport instead of HTTP.
	pub fn sender(mut self, sender: Arc<dyn ReportSender>) -> Self {
		self.sender = Some(sender);
		self
	}

	/// Uses a custom failed-report store instead of the configured one.
	pub fn store(mut self, store: Arc<dyn FailedReportStore>) -> Self {
		self.store = Some(store);
		self
	}

	pub fn context_provider(mut self, provider: Arc<dyn ContextProvider>) -> Self {
		self.context = Some(provider);
		self
	}

	/// Builds the reporter. Must be called inside a tokio runtime.
	///
	/// An endpoint is required only when reporting is enabled and no custom
	/// sender was supplied.
	pub fn build(self) -> Result<ErrorReporter> {
		let runtime = Handle::try_current().map_err(|_| ReporterError::NoRuntime)?;
		let config = self.config;

		let sender: Arc<dyn ReportSender> = match (self.sender, config.endpoint.as_deref()) {
			(Some(sender), _) => sender,
			(None, Some(raw)) => {
				let url = parse_endpoint(raw)?;
				Arc::new(HttpReportSender::from_config(&config.http, url)?)
			}
			(None, None) if config.is_reporting_enabled() => {
				return Err(ReporterError::InvalidEndpoint(
					"no collection endpoint configured".to_string(),
				));
			}
			(None, None) => Arc::new(DisabledSender),
		};

		let store: Arc<dyn FailedReportStore> = match (self.store, config.storage_dir.as_ref()) {
			(Some(store), _) => store,
			(None, Some(dir)) => Arc::new(FileReportStore::new(dir, config.store_capacity)),
			(None, None) => {
				warn!("no storage directory available, failed reports will not survive a restart");
				Arc::new(MemoryReportStore::new(config.store_capacity))
			}
		};

		let context = self
			.context
			.unwrap_or_else(|| Arc::new(StaticContextProvider::default()));

		let debouncer = Debouncer::new(config.debounce_delay, runtime.clone());

		info!(
			mode = %config.mode,
			endpoint = config.endpoint.as_deref().unwrap_or("-"),
			app_version = %config.app_version,
			debounce_ms = config.debounce_delay.as_millis() as u64,
			"error reporter initialized"
		);

		let inner = Arc::new(ReporterInner {
			config,
			queue: Arc::new(DeliveryQueue::new()),
			debouncer,
			sender,
			store,
			context,
			runtime,
			closed: AtomicBool::new(false),
		});

		Ok(ErrorReporter { inner })
	}

	/// Builds the reporter and immediately retries reports left over from a
	/// previous run.
	///
	/// Retry failures are logged, never returned.
	pub async fn build_and_retry(self) -> Result<ErrorReporter> {
		let reporter = self.build()?;
		if let Err(e) = reporter.retry().await {
			warn!(error = %e, "failed to restore stored error reports");
		}
		Ok(reporter)
	}
}

impl Default for ErrorReporterBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Sender used when reporting is off and no endpoint exists.
struct DisabledSender;

#[async_trait]
impl ReportSender for DisabledSender {
	async fn send_batch(&self, _payload: &ReportPayload) -> Result<()> {
		Err(ReporterError::ReportingDisabled)
	}
}

pub(crate) struct ReporterInner {
	config: ReporterConfig,
	queue: Arc<DeliveryQueue>,
	debouncer: Debouncer,
	sender: Arc<dyn ReportSender>,
	store: Arc<dyn FailedReportStore>,
	context: Arc<dyn ContextProvider>,
	runtime: Handle,
	closed: AtomicBool,
}

impl ReporterInner {
	fn is_accepting(&self) -> bool {
		self.config.is_reporting_enabled() && !self.closed.load(Ordering::SeqCst)
	}

	/// Records one failure. Returns the event id, or `None` when not reporting.
	pub(crate) fn capture(self: &Arc<Self>, raw: RawFailure) -> Option<EventId> {
		if !self.is_accepting() {
			return None;
		}

		let event = self.stamp(raw);
		let id = event.id;
		self.queue.push_captured(event);
		self.debouncer.arm(self.deferred_flush());
		Some(id)
	}

	/// Like [`capture`](Self::capture), but never waits on the queue or timer
	/// locks. Used from the panic hook, where the panicking thread may already
	/// hold one of them; the failure is dropped in that case.
	pub(crate) fn try_capture(self: &Arc<Self>, raw: RawFailure) -> Option<EventId> {
		if !self.is_accepting() {
			return None;
		}

		let event = self.stamp(raw);
		let id = event.id;
		if !self.queue.try_push_captured(event) {
			warn!(event_id = %id, "error queue busy, dropping captured event");
			return None;
		}
		if !self.debouncer.try_arm(self.deferred_flush()) {
			warn!(event_id = %id, "flush timer busy, event waits for the next flush");
		}
		Some(id)
	}

	fn stamp(&self, raw: RawFailure) -> ErrorEvent {
		let context = self.context.snapshot().into_context(Utc::now());
		let event = normalize(raw, context);
		trace!(event_id = %event.id, kind = %event.kind(), "captured error event");
		event
	}

	fn deferred_flush(self: &Arc<Self>) -> impl Future<Output = ()> + Send + 'static {
		let weak: Weak<ReporterInner> = Arc::downgrade(self);
		let runtime = self.runtime.clone();
		async move {
			if let Some(inner) = weak.upgrade() {
				// The flush runs in its own task so re-arming never aborts a send.
				runtime.spawn(async move {
					inner.flush().await;
				});
			}
		}
	}

	async fn flush(&self) -> FlushOutcome {
		let Some(batch) = InFlight::begin(&self.queue) else {
			return FlushOutcome::Empty;
		};
		let count = batch.len();
		let payload = ReportPayload::new(batch.events().to_vec(), self.config.app_version.clone());

		match self.sender.send_batch(&payload).await {
			Ok(()) => {
				batch.settle();
				debug!(count, "flushed error reports");
				FlushOutcome::Delivered(count)
			}
			Err(e) => {
				warn!(error = %e, count, "error report delivery failed, storing batch");
				let outcome = match self.store.persist(batch.events()).await {
					Ok(()) => FlushOutcome::Persisted(count),
					Err(store_err) => {
						error!(error = %store_err, count, "failed to store undelivered error reports");
						FlushOutcome::Discarded(count)
					}
				};
				batch.settle();
				outcome
			}
		}
	}
}

/// Captures client-side failures and delivers them in debounced batches.
///
/// Cheap to clone; clones share one queue, timer and store.
#[derive(Clone)]
pub struct ErrorReporter {
	pub(crate) inner: Arc<ReporterInner>,
}

impl ErrorReporter {
	pub fn builder() -> ErrorReporterBuilder {
		ErrorReporterBuilder::new()
	}

	/// True when captures are recorded.
	pub fn is_enabled(&self) -> bool {
		self.inner.config.is_reporting_enabled()
	}

	pub fn config(&self) -> &ReporterConfig {
		&self.inner.config
	}

	/// Events waiting in the queue, including any being sent.
	pub fn queue_len(&self) -> usize {
		self.inner.queue.len()
	}

	/// Copy of the queued events, in capture order.
	pub fn queued_events(&self) -> Vec<ErrorEvent> {
		self.inner.queue.events()
	}

	/// True while a debounced flush is pending.
	pub fn flush_scheduled(&self) -> bool {
		self.inner.debouncer.is_armed()
	}

	/// Sends everything pending now instead of waiting for the timer.
	pub async fn flush(&self) -> FlushOutcome {
		self.inner.debouncer.cancel();
		self.inner.flush().await
	}

	/// Moves stored failed reports back into the queue and schedules a flush.
	///
	/// Returns the number of reports restored. A no-op outside production.
	pub async fn retry(&self) -> Result<usize> {
		if !self.is_enabled() {
			return Ok(0);
		}
		self.check_closed()?;

		let restored = self.inner.store.drain().await?;
		let count = restored.len();
		for event in restored {
			self.inner.queue.push_restored(event);
		}

		if count > 0 {
			info!(count, "restored stored error reports for delivery");
			self.inner.debouncer.arm(self.inner.deferred_flush());
		}
		Ok(count)
	}

	/// Number of reports waiting in the failed-report store.
	pub async fn stored_len(&self) -> Result<usize> {
		self.inner.store.len().await
	}

	/// Stops capturing and makes one final delivery attempt.
	///
	/// Calling it again does nothing.
	pub async fn shutdown(&self) -> Result<()> {
		if self.inner.closed.swap(true, Ordering::SeqCst) {
			return Ok(());
		}

		self.inner.debouncer.cancel();
		let outcome = self.inner.flush().await;

		info!(?outcome, "error reporter shutdown");
		Ok(())
	}

	/// Returns true if the reporter has been shut down.
	pub fn is_closed(&self) -> bool {
		self.inner.closed.load(Ordering::SeqCst)
	}

	fn check_closed(&self) -> Result<()> {
		if self.is_closed() {
			return Err(ReporterError::ClientShutdown);
		}
		Ok(())
	}
}
