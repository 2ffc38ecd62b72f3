// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded durable storage for events that could not be delivered.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use beacon_core::{ErrorEvent, FAILED_REPORTS_SLOT};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::DEFAULT_STORE_CAPACITY;
use crate::error::{ReporterError, Result};

/// Storage for undelivered events.
///
/// Holds at most [`capacity`](FailedReportStore::capacity) events; when an
/// append would exceed it, the oldest are dropped.
#[async_trait]
pub trait FailedReportStore: Send + Sync + std::fmt::Debug {
	/// Appends events in order, trimming to capacity.
	async fn persist(&self, events: &[ErrorEvent]) -> Result<()>;

	/// Removes and returns everything stored, oldest first.
	async fn drain(&self) -> Result<Vec<ErrorEvent>>;

	/// Number of events currently stored.
	async fn len(&self) -> Result<usize>;

	fn capacity(&self) -> usize;

	async fn is_empty(&self) -> Result<bool> {
		Ok(self.len().await? == 0)
	}
}

fn append_capped(stored: &mut Vec<ErrorEvent>, events: &[ErrorEvent], capacity: usize) {
	stored.extend_from_slice(events);
	if stored.len() > capacity {
		let excess = stored.len() - capacity;
		warn!(dropped = excess, capacity, "failed report store full, dropping oldest");
		stored.drain(..excess);
	}
}

/// Store backed by one JSON file, `failedErrorReports.json`, in a directory.
///
/// The file holds a JSON array of events and is replaced atomically on every
/// write.
#[derive(Debug)]
pub struct FileReportStore {
	path: PathBuf,
	capacity: usize,
	lock: Mutex<()>,
}

impl FileReportStore {
	pub fn new(dir: impl AsRef<Path>, capacity: usize) -> Self {
		Self {
			path: dir.as_ref().join(format!("{FAILED_REPORTS_SLOT}.json")),
			capacity,
			lock: Mutex::new(()),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	async fn read_slot(&self) -> Result<Vec<ErrorEvent>> {
		if !fs::try_exists(&self.path).await? {
			return Ok(Vec::new());
		}

		let contents = fs::read(&self.path).await?;
		if contents.iter().all(u8::is_ascii_whitespace) {
			return Ok(Vec::new());
		}
		serde_json::from_slice(&contents).map_err(|source| ReporterError::CorruptStore {
			path: self.path.clone(),
			source,
		})
	}

	async fn write_slot(&self, events: &[ErrorEvent]) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).await?;
		}

		let contents = serde_json::to_vec(events)?;

		let temp_path = self.path.with_extension("tmp");
		let mut file = fs::File::create(&temp_path).await?;
		file.write_all(&contents).await?;
		file.sync_all().await?;
		drop(file);

		fs::rename(&temp_path, &self.path).await?;

		debug!(path = ?self.path, count = events.len(), "failed report store written");
		Ok(())
	}

	async fn clear_slot(&self) -> Result<()> {
		match fs::remove_file(&self.path).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}
}

#[async_trait]
impl FailedReportStore for FileReportStore {
	async fn persist(&self, events: &[ErrorEvent]) -> Result<()> {
		if events.is_empty() {
			return Ok(());
		}
		let _guard = self.lock.lock().await;

		let mut stored = match self.read_slot().await {
			Ok(stored) => stored,
			Err(ReporterError::CorruptStore { path, source }) => {
				warn!(path = ?path, error = %source, "discarding corrupt failed report store");
				Vec::new()
			}
			Err(e) => return Err(e),
		};
		append_capped(&mut stored, events, self.capacity);
		self.write_slot(&stored).await
	}

	async fn drain(&self) -> Result<Vec<ErrorEvent>> {
		let _guard = self.lock.lock().await;

		let stored = match self.read_slot().await {
			Ok(stored) => stored,
			Err(e @ ReporterError::CorruptStore { .. }) => {
				self.clear_slot().await?;
				return Err(e);
			}
			Err(e) => return Err(e),
		};
		if !stored.is_empty() {
			self.clear_slot().await?;
		}
		Ok(stored)
	}

	async fn len(&self) -> Result<usize> {
		let _guard = self.lock.lock().await;
		Ok(self.read_slot().await?.len())
	}

	fn capacity(&self) -> usize {
		self.capacity
	}
}

/// Store that lives only as long as the process.
#[derive(Debug)]
pub struct MemoryReportStore {
	events: Mutex<Vec<ErrorEvent>>,
	capacity: usize,
}

impl Default for MemoryReportStore {
	fn default() -> Self {
		Self::new(DEFAULT_STORE_CAPACITY)
	}
}

impl MemoryReportStore {
	pub fn new(capacity: usize) -> Self {
		Self {
			events: Mutex::new(Vec::new()),
			capacity,
		}
	}

	/// Copy of the stored events, for inspection.
	pub async fn events(&self) -> Vec<ErrorEvent> {
		self.events.lock().await.clone()
	}
}

#[async_trait]
impl FailedReportStore for MemoryReportStore {
	async fn persist(&self, events: &[ErrorEvent]) -> Result<()> {
		let mut stored = self.events.lock().await;
		append_capped(&mut stored, events, self.capacity);
		Ok(())
	}

	async fn drain(&self) -> Result<Vec<ErrorEvent>> {
		Ok(std::mem::take(&mut *self.events.lock().await))
	}

	async fn len(&self) -> Result<usize> {
		Ok(self.events.lock().await.len())
	}

	fn capacity(&self) -> usize {
		self.capacity
	}
}
