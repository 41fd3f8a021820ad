// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ImageStore trait.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use pixdrop_config::model::StorageConfig;
use pixdrop_core::{
    AdapterType, ConnectionStatus, HealthStatus, ImageRecord, ImageStore, PixdropError,
    PluginAdapter,
};
use pixdrop_resilience::{ConnectError, ConnectionManager};
use tracing::{debug, warn};

use crate::database::{Database, map_tr_err};
use crate::queries;

const ADAPTER_NAME: &str = "sqlite";

/// SQLite-backed image store.
///
/// The database is opened lazily by the first operation (or by
/// [`ImageStore::initialize`]); concurrent first operations share a single
/// open attempt. Each operation is bounded by `storage.query_timeout_secs`.
pub struct SqliteImageStore {
    config: StorageConfig,
    manager: ConnectionManager<Database>,
}

impl SqliteImageStore {
    /// Create a new store with the given configuration.
    ///
    /// The database file is not opened until the first operation.
    pub fn new(config: StorageConfig) -> Self {
        let path = config.database_path.clone();
        let wal_mode = config.wal_mode;
        let manager = ConnectionManager::new(ADAPTER_NAME, config.connect_timeout(), move || {
            let path = path.clone();
            async move {
                Database::open_with(&path, wal_mode)
                    .await
                    .map_err(|e| ConnectError::failed(ADAPTER_NAME, e.to_string()))
            }
            .boxed()
        });
        Self { config, manager }
    }

    fn query_timeout(&self) -> Duration {
        self.config.query_timeout()
    }

    /// Run `op` against a connected database, bounded by the query timeout.
    ///
    /// A closed connection invalidates the handle so the next operation reconnects.
    async fn run<T, F, Fut>(&self, op: F) -> Result<T, PixdropError>
    where
        F: FnOnce(Database) -> Fut,
        Fut: Future<Output = Result<T, PixdropError>>,
    {
        let db = self.manager.ensure_connected().await?;
        let timeout = self.query_timeout();
        let result = match tokio::time::timeout(timeout, op(db)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?timeout, "store query timed out");
                Err(PixdropError::Timeout { duration: timeout })
            }
        };
        if matches!(result, Err(PixdropError::Connection { .. })) {
            self.manager.invalidate();
        }
        result
    }
}

#[async_trait]
impl PluginAdapter for SqliteImageStore {
    fn name(&self) -> &str {
        ADAPTER_NAME
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PixdropError> {
        let ping = self
            .run(|db| async move {
                db.connection()
                    .call(|conn| -> Result<(), rusqlite::Error> {
                        conn.execute_batch("SELECT 1;")?;
                        Ok(())
                    })
                    .await
                    .map_err(map_tr_err)
            })
            .await;
        Ok(match ping {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), PixdropError> {
        self.close().await
    }
}

#[async_trait]
impl ImageStore for SqliteImageStore {
    async fn initialize(&self) -> Result<(), PixdropError> {
        self.manager.ensure_connected().await?;
        debug!(path = %self.config.database_path, "SQLite image store initialized");
        Ok(())
    }

    async fn insert_image(&self, record: &ImageRecord) -> Result<(), PixdropError> {
        self.run(|db| async move { queries::images::insert_image(&db, record).await })
            .await
    }

    async fn get_image(&self, message_id: &str) -> Result<Option<ImageRecord>, PixdropError> {
        self.run(|db| async move { queries::images::get_image(&db, message_id).await })
            .await
    }

    async fn list_images(
        &self,
        offset: u64,
        limit: Option<u64>,
    ) -> Result<Vec<ImageRecord>, PixdropError> {
        self.run(|db| async move { queries::images::list_images(&db, offset, limit).await })
            .await
    }

    async fn count_images(&self) -> Result<u64, PixdropError> {
        self.run(|db| async move { queries::images::count_images(&db).await })
            .await
    }

    fn connection_status(&self) -> ConnectionStatus {
        self.manager.status()
    }

    async fn close(&self) -> Result<(), PixdropError> {
        if let Some(db) = self.manager.disconnect() {
            db.close().await?;
            debug!("SQLite image store closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            ..StorageConfig::default()
        }
    }

    #[tokio::test]
    async fn sqlite_store_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteImageStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
        assert_eq!(store.adapter_type(), AdapterType::Storage);
        assert_eq!(store.connection_status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let store = SqliteImageStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
        assert_eq!(store.connection_status(), ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn first_operation_connects_lazily() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lazy.db");
        let store = SqliteImageStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.count_images().await.unwrap(), 0);
        assert_eq!(store.connection_status(), ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn unreachable_store_reports_connection_error() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened as a database file.
        let store = SqliteImageStore::new(make_config(dir.path().to_str().unwrap()));

        let err = store.get_image("m1").await.unwrap_err();
        assert!(err.is_connection(), "got {err:?}");
        assert_eq!(store.connection_status(), ConnectionStatus::Disconnected);

        let health = store.health_check().await.unwrap();
        assert!(matches!(health, HealthStatus::Unhealthy(_)));
    }

    #[tokio::test]
    async fn close_then_reuse_reconnects() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let store = SqliteImageStore::new(make_config(db_path.to_str().unwrap()));

        let record = ImageRecord::new("m1", "s1", "image/jpeg", vec![7; 4]);
        store.insert_image(&record).await.unwrap();
        store.close().await.unwrap();
        assert_eq!(store.connection_status(), ConnectionStatus::Disconnected);

        let fetched = store.get_image("m1").await.unwrap().unwrap();
        assert_eq!(fetched.image_data, vec![7; 4]);
    }

    #[tokio::test]
    async fn slow_query_times_out_and_keeps_connection() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("slow.db");
        let store = SqliteImageStore::new(StorageConfig {
            query_timeout_secs: 1,
            ..make_config(db_path.to_str().unwrap())
        });
        store.initialize().await.unwrap();

        let err = store
            .run(|_db| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err, PixdropError::Timeout { duration } if duration == Duration::from_secs(1)),
            "got {err:?}"
        );

        assert_eq!(store.connection_status(), ConnectionStatus::Connected);
        assert_eq!(store.count_images().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn health_check_returns_healthy_when_reachable() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let store = SqliteImageStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
