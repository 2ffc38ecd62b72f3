// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pending-event queue and the debounce timer that drains it.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use beacon_core::ErrorEvent;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Ordered list of events awaiting delivery.
///
/// Events taken by a flush stay in the queue, marked in flight, until the
/// flush settles them. Events added while a flush is running are untouched by
/// it and picked up by the next one. In-flight marks belong to queue entries,
/// not event ids, so an event restored from storage while its earlier copy is
/// still being flushed is a separate entry and survives that flush.
#[derive(Debug, Default)]
pub struct DeliveryQueue {
	state: Mutex<QueueState>,
}

#[derive(Debug)]
struct Slot {
	seq: u64,
	event: ErrorEvent,
	in_flight: bool,
}

#[derive(Debug, Default)]
struct QueueState {
	slots: Vec<Slot>,
	next_seq: u64,
	last_timestamp: Option<DateTime<Utc>>,
}

impl QueueState {
	fn push(&mut self, event: ErrorEvent) {
		let seq = self.next_seq;
		self.next_seq += 1;
		self.slots.push(Slot {
			seq,
			event,
			in_flight: false,
		});
	}

	fn push_captured(&mut self, mut event: ErrorEvent) {
		if let Some(last) = self.last_timestamp {
			if event.context.timestamp < last {
				event.context.timestamp = last;
			}
		}
		self.last_timestamp = Some(event.context.timestamp);
		self.push(event);
	}
}

impl DeliveryQueue {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a freshly captured event.
	///
	/// Timestamps never go backwards in capture order: a clock that steps back
	/// is clamped to the previous capture time.
	pub fn push_captured(&self, event: ErrorEvent) {
		self.state.lock().push_captured(event);
	}

	/// Like [`push_captured`](Self::push_captured), but gives up instead of
	/// waiting when the queue is locked. Returns whether the event was queued.
	pub fn try_push_captured(&self, event: ErrorEvent) -> bool {
		match self.state.try_lock() {
			Some(mut state) => {
				state.push_captured(event);
				true
			}
			None => false,
		}
	}

	/// Appends an event recovered from storage, keeping its original timestamp.
	pub fn push_restored(&self, event: ErrorEvent) {
		self.state.lock().push(event);
	}

	/// Total events held, in flight or not.
	pub fn len(&self) -> usize {
		self.state.lock().slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Events not yet taken by a flush.
	pub fn pending_len(&self) -> usize {
		self.state.lock().slots.iter().filter(|s| !s.in_flight).count()
	}

	/// Copy of every queued event, in order.
	pub fn events(&self) -> Vec<ErrorEvent> {
		self.state
			.lock()
			.slots
			.iter()
			.map(|s| s.event.clone())
			.collect()
	}

	/// Copies the pending events and marks their entries in flight.
	fn snapshot(&self) -> (Vec<ErrorEvent>, HashSet<u64>) {
		let mut state = self.state.lock();
		let mut events = Vec::new();
		let mut seqs = HashSet::new();
		for slot in state.slots.iter_mut().filter(|s| !s.in_flight) {
			slot.in_flight = true;
			seqs.insert(slot.seq);
			events.push(slot.event.clone());
		}
		(events, seqs)
	}

	/// Removes the given entries.
	fn settle(&self, seqs: &HashSet<u64>) {
		self.state.lock().slots.retain(|s| !seqs.contains(&s.seq));
	}

	/// Returns the given entries to pending without removing them.
	fn release(&self, seqs: &HashSet<u64>) {
		let mut state = self.state.lock();
		for slot in state.slots.iter_mut().filter(|s| seqs.contains(&s.seq)) {
			slot.in_flight = false;
		}
	}
}

/// A batch taken from the queue by one flush.
///
/// Dropping the batch without settling it puts its events back to pending, so
/// a cancelled flush loses nothing.
#[derive(Debug)]
pub struct InFlight {
	queue: Arc<DeliveryQueue>,
	events: Vec<ErrorEvent>,
	seqs: HashSet<u64>,
	settled: bool,
}

impl InFlight {
	/// Takes every pending event. Returns `None` when nothing is pending.
	pub fn begin(queue: &Arc<DeliveryQueue>) -> Option<Self> {
		let (events, seqs) = queue.snapshot();
		if events.is_empty() {
			return None;
		}
		Some(Self {
			queue: Arc::clone(queue),
			events,
			seqs,
			settled: false,
		})
	}

	pub fn events(&self) -> &[ErrorEvent] {
		&self.events
	}

	pub fn len(&self) -> usize {
		self.events.len()
	}

	pub fn is_empty(&self) -> bool {
		self.events.is_empty()
	}

	/// Removes the batch's entries from the queue.
	pub fn settle(mut self) {
		self.queue.settle(&self.seqs);
		self.settled = true;
	}
}

impl Drop for InFlight {
	fn drop(&mut self) {
		if !self.settled {
			warn!(count = self.seqs.len(), "flush abandoned, returning events to queue");
			self.queue.release(&self.seqs);
		}
	}
}

/// Single-shot timer that is pushed back every time it is re-armed.
#[derive(Debug)]
pub struct Debouncer {
	delay: Duration,
	handle: Mutex<Option<JoinHandle<()>>>,
	runtime: Handle,
}

impl Debouncer {
	pub fn new(delay: Duration, runtime: Handle) -> Self {
		Self {
			delay,
			handle: Mutex::new(None),
			runtime,
		}
	}

	/// Cancels any pending deadline and runs `fire` after the delay.
	pub fn arm<Fut>(&self, fire: Fut)
	where
		Fut: Future<Output = ()> + Send + 'static,
	{
		let mut handle = self.handle.lock();
		self.rearm(&mut handle, fire);
	}

	/// Like [`arm`](Self::arm), but gives up instead of waiting when the timer
	/// is locked. Returns whether the timer was armed.
	pub fn try_arm<Fut>(&self, fire: Fut) -> bool
	where
		Fut: Future<Output = ()> + Send + 'static,
	{
		match self.handle.try_lock() {
			Some(mut handle) => {
				self.rearm(&mut handle, fire);
				true
			}
			None => false,
		}
	}

	fn rearm<Fut>(&self, handle: &mut Option<JoinHandle<()>>, fire: Fut)
	where
		Fut: Future<Output = ()> + Send + 'static,
	{
		if let Some(previous) = handle.take() {
			previous.abort();
		}
		let delay = self.delay;
		trace!(delay_ms = delay.as_millis() as u64, "arming flush timer");
		*handle = Some(self.runtime.spawn(async move {
			tokio::time::sleep(delay).await;
			fire.await;
		}));
	}

	/// Cancels the pending deadline, if any.
	pub fn cancel(&self) {
		if let Some(handle) = self.handle.lock().take() {
			handle.abort();
		}
	}

	/// True while a deadline is pending.
	pub fn is_armed(&self) -> bool {
		self.handle
			.lock()
			.as_ref()
			.is_some_and(|h| !h.is_finished())
	}
}

impl Drop for Debouncer {
	fn drop(&mut self) {
		self.cancel();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use beacon_core::{EnvironmentSnapshot, EventDetail};
	use chrono::TimeZone;
	use serde_json::Map;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn event_at(message: &str, secs: i64) -> ErrorEvent {
		let timestamp = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
		ErrorEvent::new(
			message,
			EventDetail::ManualReport { fields: Map::new() },
			EnvironmentSnapshot::default().into_context(timestamp),
		)
	}

	#[test]
	fn captured_timestamps_never_go_backwards() {
		let queue = DeliveryQueue::new();
		queue.push_captured(event_at("a", 10));
		queue.push_captured(event_at("b", 5));
		queue.push_captured(event_at("c", 20));

		let events = queue.events();
		assert_eq!(events[1].context.timestamp, events[0].context.timestamp);
		assert!(events[2].context.timestamp > events[1].context.timestamp);
	}

	#[test]
	fn restored_events_keep_their_timestamps() {
		let queue = DeliveryQueue::new();
		queue.push_captured(event_at("new", 100));
		let old = event_at("old", 1);
		let old_ts = old.context.timestamp;
		queue.push_restored(old);

		assert_eq!(queue.events()[1].context.timestamp, old_ts);
	}

	#[test]
	fn settle_removes_only_the_batch() {
		let queue = Arc::new(DeliveryQueue::new());
		queue.push_captured(event_at("a", 1));
		queue.push_captured(event_at("b", 2));

		let batch = InFlight::begin(&queue).unwrap();
		assert_eq!(batch.len(), 2);
		assert_eq!(queue.pending_len(), 0);

		queue.push_captured(event_at("c", 3));
		assert!(InFlight::begin(&queue).map(|b| b.len()) == Some(1));

		batch.settle();
		let remaining = queue.events();
		assert_eq!(remaining.len(), 1);
		assert_eq!(remaining[0].message, "c");
	}

	#[test]
	fn overlapping_batches_are_disjoint() {
		let queue = Arc::new(DeliveryQueue::new());
		queue.push_captured(event_at("a", 1));
		let first = InFlight::begin(&queue).unwrap();
		queue.push_captured(event_at("b", 2));
		let second = InFlight::begin(&queue).unwrap();

		assert_eq!(first.events()[0].message, "a");
		assert_eq!(second.len(), 1);
		assert_eq!(second.events()[0].message, "b");
		assert!(InFlight::begin(&queue).is_none());

		first.settle();
		second.settle();
		assert!(queue.is_empty());
	}

	#[test]
	fn dropped_batch_is_released() {
		let queue = Arc::new(DeliveryQueue::new());
		queue.push_captured(event_at("a", 1));
		drop(InFlight::begin(&queue).unwrap());

		assert_eq!(queue.len(), 1);
		assert_eq!(queue.pending_len(), 1);
	}

	#[test]
	fn restored_copy_of_in_flight_event_survives_settle() {
		let queue = Arc::new(DeliveryQueue::new());
		queue.push_captured(event_at("a", 1));
		let batch = InFlight::begin(&queue).unwrap();

		let restored = batch.events()[0].clone();
		queue.push_restored(restored.clone());
		assert_eq!(queue.pending_len(), 1);

		batch.settle();
		assert_eq!(queue.events(), vec![restored]);
		assert_eq!(queue.pending_len(), 1);
	}

	#[test]
	fn release_leaves_other_copies_alone() {
		let queue = Arc::new(DeliveryQueue::new());
		queue.push_captured(event_at("a", 1));
		let first = InFlight::begin(&queue).unwrap();
		queue.push_restored(first.events()[0].clone());
		let second = InFlight::begin(&queue).unwrap();

		drop(first);
		assert_eq!(queue.pending_len(), 1);
		second.settle();
		assert_eq!(queue.len(), 1);
		assert_eq!(queue.pending_len(), 1);
	}

	#[test]
	fn try_push_gives_up_while_locked() {
		let queue = DeliveryQueue::new();
		{
			let _held = queue.state.lock();
			assert!(!queue.try_push_captured(event_at("a", 1)));
		}
		assert!(queue.is_empty());
		assert!(queue.try_push_captured(event_at("b", 2)));
		assert_eq!(queue.len(), 1);
	}

	#[test]
	fn empty_queue_has_no_batch() {
		let queue = Arc::new(DeliveryQueue::new());
		assert!(InFlight::begin(&queue).is_none());
	}

	proptest::proptest! {
		#[test]
		fn captured_timestamps_are_monotonic(offsets in proptest::collection::vec(-3600i64..3600, 1..40)) {
			let queue = DeliveryQueue::new();
			for (i, offset) in offsets.iter().enumerate() {
				queue.push_captured(event_at(&i.to_string(), *offset));
			}
			let events = queue.events();
			proptest::prop_assert_eq!(events.len(), offsets.len());
			for pair in events.windows(2) {
				proptest::prop_assert!(pair[0].context.timestamp <= pair[1].context.timestamp);
			}
		}
	}

	#[tokio::test(start_paused = true)]
	async fn debouncer_fires_once_after_last_arm() {
		let fired = Arc::new(AtomicUsize::new(0));
		let debouncer = Debouncer::new(Duration::from_millis(500), Handle::current());

		for _ in 0..3 {
			let fired = fired.clone();
			debouncer.arm(async move {
				fired.fetch_add(1, Ordering::SeqCst);
			});
			tokio::time::sleep(Duration::from_millis(100)).await;
		}

		tokio::time::sleep(Duration::from_millis(399)).await;
		assert_eq!(fired.load(Ordering::SeqCst), 0);
		assert!(debouncer.is_armed());

		tokio::time::sleep(Duration::from_millis(2)).await;
		assert_eq!(fired.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn try_arm_gives_up_while_locked() {
		let fired = Arc::new(AtomicUsize::new(0));
		let debouncer = Debouncer::new(Duration::from_millis(500), Handle::current());
		{
			let _held = debouncer.handle.lock();
			let counter = fired.clone();
			assert!(!debouncer.try_arm(async move {
				counter.fetch_add(1, Ordering::SeqCst);
			}));
		}
		assert!(!debouncer.is_armed());

		let counter = fired.clone();
		assert!(debouncer.try_arm(async move {
			counter.fetch_add(1, Ordering::SeqCst);
		}));
		tokio::time::sleep(Duration::from_millis(501)).await;
		assert_eq!(fired.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn cancelled_debouncer_never_fires() {
		let fired = Arc::new(AtomicUsize::new(0));
		let debouncer = Debouncer::new(Duration::from_millis(500), Handle::current());
		let counter = fired.clone();
		debouncer.arm(async move {
			counter.fetch_add(1, Ordering::SeqCst);
		});
		debouncer.cancel();

		tokio::time::sleep(Duration::from_secs(2)).await;
		assert_eq!(fired.load(Ordering::SeqCst), 0);
		assert!(!debouncer.is_armed());
	}
}
