// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory image store for tests that do not need SQLite.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use pixdrop_core::{
    AdapterType, ConnectionStatus, HealthStatus, ImageRecord, ImageStore, PixdropError,
    PluginAdapter,
};

/// An `ImageStore` backed by a vector.
///
/// Orders listings like the SQLite store (newest first, ties by message id).
/// `set_reachable(false)` makes every operation fail with a connection error.
/// `set_timing_out(true)` makes reads fail the way a query past
/// `storage.query_timeout_secs` does, while the connection stays up.
pub struct MockImageStore {
    records: Mutex<Vec<ImageRecord>>,
    reachable: AtomicBool,
    timing_out: AtomicBool,
    queries: AtomicUsize,
}

/// Duration reported by reads in timing-out mode.
pub const MOCK_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

impl MockImageStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            reachable: AtomicBool::new(true),
            timing_out: AtomicBool::new(false),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_timing_out(&self, timing_out: bool) {
        self.timing_out.store(timing_out, Ordering::SeqCst);
    }

    /// Number of read operations served (get, list, count).
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Snapshot of the stored records in insertion order.
    pub fn records(&self) -> Vec<ImageRecord> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ImageRecord>> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check_reachable(&self) -> Result<(), PixdropError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PixdropError::Connection {
                message: "mock store unreachable".to_string(),
            })
        }
    }

    fn read(&self) -> Result<std::sync::MutexGuard<'_, Vec<ImageRecord>>, PixdropError> {
        self.check_reachable()?;
        if self.timing_out.load(Ordering::SeqCst) {
            return Err(PixdropError::Timeout {
                duration: MOCK_QUERY_TIMEOUT,
            });
        }
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock())
    }
}

impl Default for MockImageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockImageStore {
    fn name(&self) -> &str {
        "mock-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PixdropError> {
        match self.check_reachable() {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), PixdropError> {
        Ok(())
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn initialize(&self) -> Result<(), PixdropError> {
        self.check_reachable()
    }

    async fn insert_image(&self, record: &ImageRecord) -> Result<(), PixdropError> {
        self.check_reachable()?;
        let mut records = self.lock();
        if records.iter().any(|r| r.message_id == record.message_id) {
            return Err(PixdropError::DuplicateRecord {
                message_id: record.message_id.clone(),
            });
        }
        records.push(record.clone());
        Ok(())
    }

    async fn get_image(&self, message_id: &str) -> Result<Option<ImageRecord>, PixdropError> {
        let records = self.read()?;
        Ok(records.iter().find(|r| r.message_id == message_id).cloned())
    }

    async fn list_images(
        &self,
        offset: u64,
        limit: Option<u64>,
    ) -> Result<Vec<ImageRecord>, PixdropError> {
        let mut sorted = self.read()?.clone();
        sorted.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.message_id.cmp(&b.message_id))
        });
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        Ok(sorted.into_iter().skip(skip).take(take).collect())
    }

    async fn count_images(&self) -> Result<u64, PixdropError> {
        Ok(self.read()?.len() as u64)
    }

    fn connection_status(&self) -> ConnectionStatus {
        if self.reachable.load(Ordering::SeqCst) {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }

    async fn close(&self) -> Result<(), PixdropError> {
        Ok(())
    }
}
