// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the ingestion and retrieval stack around a mock
//! transport and a temp SQLite database. `ingest()` drives one inbound event
//! through the ingestor; `router()` serves the HTTP API over the same store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pixdrop_config::model::{
    CacheConfig, Environment, PixdropConfig, SessionConfig, StorageConfig,
};
use pixdrop_core::{
    ImageEvent, ImageStore, InboundEvent, MediaSource, PixdropError, SessionState,
};
use pixdrop_gateway::AppState;
use pixdrop_session::{
    FileCredentialStore, ImageIngestor, IngestOutcome, SessionController, SessionSettings,
};
use pixdrop_storage::SqliteImageStore;
use tokio::sync::watch;

use crate::mock_transport::MockTransport;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    cache_ttl: Duration,
    environment: Environment,
    notify_target: Option<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            environment: Environment::Production,
            notify_target: None,
        }
    }

    /// Set the query cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Run the HTTP layer in development mode (detailed 500 bodies).
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Send failure notices here instead of to the sender.
    pub fn with_notify_target(mut self, target: impl Into<String>) -> Self {
        self.notify_target = Some(target.into());
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, PixdropError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| PixdropError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = PixdropConfig::default();
        config.app.environment = self.environment;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            ..StorageConfig::default()
        };
        config.cache = CacheConfig {
            ttl_secs: self.cache_ttl.as_secs(),
        };
        config.session = SessionConfig {
            auth_dir: temp_dir.path().join("auth").to_string_lossy().to_string(),
            notify_target: self.notify_target,
            drain_timeout_secs: 2,
            ..SessionConfig::default()
        };

        let store = Arc::new(SqliteImageStore::new(config.storage.clone()));
        store.initialize().await?;

        let transport = Arc::new(MockTransport::new());
        let ingestor = ImageIngestor::new(
            Arc::clone(&transport) as _,
            Arc::clone(&store) as _,
            config.session.notify_target.clone(),
        );

        let (session_state, session_rx) = watch::channel(SessionState::Open);
        let app_state = AppState::new(Arc::clone(&store) as _, session_rx, &config);

        Ok(TestHarness {
            transport,
            store,
            ingestor,
            app_state,
            session_state,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock transport and temp storage.
pub struct TestHarness {
    /// The mock messaging transport.
    pub transport: Arc<MockTransport>,
    /// SQLite store (temp DB, cleaned up on drop).
    pub store: Arc<SqliteImageStore>,
    /// Ingestor writing into `store` and notifying through `transport`.
    pub ingestor: ImageIngestor,
    /// HTTP state over `store`.
    pub app_state: AppState,
    /// Drives the session state reported by `/health`.
    pub session_state: watch::Sender<SessionState>,
    pub config: PixdropConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default settings.
    pub async fn new() -> Result<Self, PixdropError> {
        Self::builder().build().await
    }

    /// The gateway router over this harness's store.
    pub fn router(&self) -> axum::Router {
        pixdrop_gateway::router(self.app_state.clone())
    }

    /// Run one inbound event through the ingestor.
    pub async fn ingest(&self, event: InboundEvent) -> IngestOutcome {
        self.ingestor.handle(event).await
    }

    /// A session controller wired to the mock transport, the store and a
    /// file credential store in the harness's temp directory.
    pub fn controller(&self, settings: SessionSettings) -> SessionController {
        SessionController::new(
            Arc::clone(&self.transport) as _,
            Arc::new(FileCredentialStore::new(&self.config.session.auth_dir)),
            Arc::clone(&self.store) as _,
            settings,
        )
    }
}

/// An inline image event.
pub fn image_event(id: &str, sender: &str, mime: &str, bytes: Vec<u8>) -> InboundEvent {
    InboundEvent::Image(ImageEvent {
        message_id: id.to_string(),
        sender: sender.to_string(),
        timestamp: None,
        mime_type: Some(mime.to_string()),
        caption: None,
        media: MediaSource::Inline(bytes),
    })
}

/// An inline image event with a fixed timestamp.
pub fn image_event_at(id: &str, timestamp: DateTime<Utc>) -> InboundEvent {
    InboundEvent::Image(ImageEvent {
        message_id: id.to_string(),
        sender: "tester".to_string(),
        timestamp: Some(timestamp),
        mime_type: Some("image/png".to_string()),
        caption: None,
        media: MediaSource::Inline(vec![0x89, b'P', b'N', b'G']),
    })
}

/// A text event.
pub fn text_event(id: &str, sender: &str, text: &str) -> InboundEvent {
    InboundEvent::Text {
        message_id: id.to_string(),
        sender: sender.to_string(),
        text: text.to_string(),
    }
}
