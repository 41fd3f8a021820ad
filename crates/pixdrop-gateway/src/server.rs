// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{Router, routing::get};
use pixdrop_config::model::{Environment, PixdropConfig};
use pixdrop_core::{ImageStore, PixdropError, SessionState};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers;
use crate::query::ImageQueryService;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cached read path over the store.
    pub images: Arc<ImageQueryService>,
    /// Direct store handle for connection status.
    pub store: Arc<dyn ImageStore>,
    /// Latest messaging session state.
    pub session_state: watch::Receiver<SessionState>,
    /// Page size used when a listing request has no `limit`.
    pub default_page_size: u32,
    /// Include error details in 500 responses.
    pub expose_errors: bool,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ImageStore>,
        session_state: watch::Receiver<SessionState>,
        config: &PixdropConfig,
    ) -> Self {
        let images = ImageQueryService::from_config(Arc::clone(&store), &config.cache, &config.gateway);
        Self {
            images: Arc::new(images),
            store,
            session_state,
            default_page_size: config.gateway.default_page_size,
            expose_errors: config.app.environment == Environment::Development,
        }
    }

    pub(crate) fn api_error(&self, err: PixdropError) -> ApiError {
        ApiError::from_error(err, self.expose_errors)
    }
}

/// Build the gateway router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::gallery))
        .route("/health", get(handlers::health))
        .route("/api/images", get(handlers::list_images))
        .route("/api/image/{id}", get(handlers::get_image))
        .route("/api/image/{id}/download", get(handlers::download_image))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `bind_address:port` and serve until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish after cancellation.
pub async fn serve(
    bind_address: &str,
    port: u16,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), PixdropError> {
    let addr = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PixdropError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| PixdropError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
