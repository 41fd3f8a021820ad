// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-through cached queries over the image store.
//!
//! Cache keys:
//! - `image_<id>` for single records
//! - `images_page_<page>_<size>` for listing pages
//! - `all_images` for the full listing
//!
//! Only hits are cached. A missing record is looked up again on every request,
//! so an image stored after a 404 is visible right away.

use std::sync::Arc;
use std::time::Duration;

use pixdrop_cache::{CacheStats, TtlCache};
use pixdrop_config::model::{CacheConfig, GatewayConfig};
use pixdrop_core::{ImageRecord, ImageStore, PixdropError};
use tracing::{debug, warn};

const ALL_IMAGES_KEY: &str = "all_images";

/// A cached query result. Shared, never mutated after insertion.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Record(Arc<ImageRecord>),
    List(Arc<Vec<ImageRecord>>),
}

pub struct ImageQueryService {
    store: Arc<dyn ImageStore>,
    cache: TtlCache<CachedValue>,
    max_page_size: u32,
    list_all_warn_threshold: usize,
}

impl ImageQueryService {
    pub fn new(
        store: Arc<dyn ImageStore>,
        ttl: Duration,
        max_page_size: u32,
        list_all_warn_threshold: usize,
    ) -> Self {
        Self {
            store,
            cache: TtlCache::new(ttl),
            max_page_size: max_page_size.max(1),
            list_all_warn_threshold,
        }
    }

    pub fn from_config(
        store: Arc<dyn ImageStore>,
        cache: &CacheConfig,
        gateway: &GatewayConfig,
    ) -> Self {
        Self::new(
            store,
            cache.ttl(),
            gateway.max_page_size,
            gateway.list_all_warn_threshold,
        )
    }

    /// Looks up one image, serving from cache while fresh.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Arc<ImageRecord>>, PixdropError> {
        let key = format!("image_{id}");
        if let Some(CachedValue::Record(record)) = self.cache.get(&key) {
            debug!(message_id = id, "image cache hit");
            return Ok(Some(record));
        }

        let Some(record) = self.store.get_image(id).await? else {
            debug!(message_id = id, "image not found");
            return Ok(None);
        };
        let record = Arc::new(record);
        self.cache.set(key, CachedValue::Record(Arc::clone(&record)));
        Ok(Some(record))
    }

    /// One page of images, newest first. Pages are 1-based.
    pub async fn list_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Arc<Vec<ImageRecord>>, PixdropError> {
        let (page, size) = self.normalize_page(page, page_size);
        let key = format!("images_page_{page}_{size}");
        if let Some(CachedValue::List(records)) = self.cache.get(&key) {
            debug!(page, size, "page cache hit");
            return Ok(records);
        }

        let offset = u64::from(page - 1) * u64::from(size);
        let records = Arc::new(self.store.list_images(offset, Some(u64::from(size))).await?);
        self.cache.set(key, CachedValue::List(Arc::clone(&records)));
        Ok(records)
    }

    /// Every stored image, newest first.
    pub async fn list_all(&self) -> Result<Arc<Vec<ImageRecord>>, PixdropError> {
        if let Some(CachedValue::List(records)) = self.cache.get(ALL_IMAGES_KEY) {
            return Ok(records);
        }

        let records = self.store.list_images(0, None).await?;
        if records.len() > self.list_all_warn_threshold {
            warn!(
                count = records.len(),
                threshold = self.list_all_warn_threshold,
                "listing every image; consider paging"
            );
        }
        let records = Arc::new(records);
        self.cache
            .set(ALL_IMAGES_KEY, CachedValue::List(Arc::clone(&records)));
        Ok(records)
    }

    /// Total number of stored images. Not cached.
    pub async fn count(&self) -> Result<u64, PixdropError> {
        self.store.count_images().await
    }

    /// Treats page 0 as page 1 and clamps the size to `[1, max_page_size]`.
    pub fn normalize_page(&self, page: u32, page_size: u32) -> (u32, u32) {
        (page.max(1), page_size.clamp(1, self.max_page_size))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyStore;

    #[async_trait::async_trait]
    impl pixdrop_core::PluginAdapter for EmptyStore {
        fn name(&self) -> &str {
            "empty"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> pixdrop_core::AdapterType {
            pixdrop_core::AdapterType::Storage
        }
        async fn health_check(&self) -> Result<pixdrop_core::HealthStatus, PixdropError> {
            Ok(pixdrop_core::HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), PixdropError> {
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl ImageStore for EmptyStore {
        async fn initialize(&self) -> Result<(), PixdropError> {
            Ok(())
        }
        async fn insert_image(&self, _: &ImageRecord) -> Result<(), PixdropError> {
            Ok(())
        }
        async fn get_image(&self, _: &str) -> Result<Option<ImageRecord>, PixdropError> {
            Ok(None)
        }
        async fn list_images(
            &self,
            _: u64,
            _: Option<u64>,
        ) -> Result<Vec<ImageRecord>, PixdropError> {
            Ok(Vec::new())
        }
        async fn count_images(&self) -> Result<u64, PixdropError> {
            Ok(0)
        }
        fn connection_status(&self) -> pixdrop_core::ConnectionStatus {
            pixdrop_core::ConnectionStatus::Connected
        }
        async fn close(&self) -> Result<(), PixdropError> {
            Ok(())
        }
    }

    fn service(max_page_size: u32) -> ImageQueryService {
        ImageQueryService::new(Arc::new(EmptyStore), Duration::from_secs(60), max_page_size, 10)
    }

    #[test]
    fn page_zero_is_page_one() {
        assert_eq!(service(100).normalize_page(0, 10), (1, 10));
    }

    #[test]
    fn page_size_is_clamped() {
        let svc = service(50);
        assert_eq!(svc.normalize_page(3, 0), (3, 1));
        assert_eq!(svc.normalize_page(3, 500), (3, 50));
    }

    #[tokio::test]
    async fn missing_image_is_not_cached() {
        let svc = service(10);
        assert!(svc.get_by_id("nope").await.unwrap().is_none());
        assert!(svc.get_by_id("nope").await.unwrap().is_none());
        let stats = svc.cache_stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.misses, 2);
    }
}
