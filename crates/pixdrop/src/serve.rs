// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pixdrop serve` command implementation.
//!
//! Opens the image store, starts the messaging session for the configured
//! transport and serves the HTTP API until SIGINT/SIGTERM.

use std::sync::Arc;

use pixdrop_config::model::{PixdropConfig, TransportKind};
use pixdrop_core::{ImageStore, MessagingTransport, PixdropError};
use pixdrop_gateway::AppState;
use pixdrop_session::{
    FileCredentialStore, SessionController, SessionOutcome, SessionSettings, install_signal_handler,
};
use pixdrop_storage::SqliteImageStore;
use tracing::{error, info, warn};

/// Runs the `pixdrop serve` command.
///
/// The HTTP server keeps serving stored images after the session ends
/// (logout or exhausted reconnects) until a shutdown signal arrives.
pub async fn run_serve(config: PixdropConfig) -> Result<(), PixdropError> {
    init_tracing(&config.app.log_level);

    info!(
        environment = %config.app.environment,
        transport = %config.session.transport,
        "starting pixdrop serve"
    );

    // A failed first connect is not fatal; the store reconnects on demand.
    let store = Arc::new(SqliteImageStore::new(config.storage.clone()));
    if let Err(e) = store.initialize().await {
        warn!(error = %e, "image store unavailable at startup, serving degraded");
    }

    let transport = build_transport(&config)?;
    let credentials = Arc::new(FileCredentialStore::new(&config.session.auth_dir));
    let controller = Arc::new(SessionController::new(
        transport,
        credentials,
        Arc::clone(&store) as _,
        SessionSettings::from_config(&config.session),
    ));
    let app_state = AppState::new(Arc::clone(&store) as _, controller.subscribe(), &config);

    let cancel = install_signal_handler();

    let session = tokio::spawn({
        let controller = Arc::clone(&controller);
        let cancel = cancel.clone();
        async move {
            let outcome = controller.run(cancel).await;
            match &outcome {
                Ok(SessionOutcome::LoggedOut) => {
                    warn!("messaging account logged out; re-pair and restart to resume ingestion");
                }
                Ok(SessionOutcome::GaveUp { attempts }) => {
                    warn!(attempts, "messaging session gave up reconnecting");
                }
                Ok(SessionOutcome::Shutdown) => {}
                Err(e) => error!(error = %e, "messaging session failed"),
            }
            outcome
        }
    });

    let bind_address = config.gateway.bind_address.clone();
    let port = config.gateway.port;
    let served = pixdrop_gateway::serve(&bind_address, port, app_state, cancel.clone()).await;
    if let Err(e) = &served {
        error!(error = %e, "gateway stopped with error");
    }

    // Covers the bind-failure path, where no signal was received.
    cancel.cancel();
    match session.await {
        Ok(Ok(outcome)) => info!(outcome = ?outcome, "session stopped"),
        Ok(Err(_)) => {}
        Err(e) => error!(error = %e, "session task panicked"),
    }

    if let Err(e) = store.close().await {
        warn!(error = %e, "failed to close image store");
    }

    info!("pixdrop serve shutdown complete");
    served
}

/// Builds the messaging transport selected by `session.transport`.
fn build_transport(config: &PixdropConfig) -> Result<Arc<dyn MessagingTransport>, PixdropError> {
    match config.session.transport {
        #[cfg(feature = "bridge")]
        TransportKind::Bridge => Ok(Arc::new(pixdrop_bridge::BridgeTransport::new(
            &config.bridge,
        ))),
        #[cfg(feature = "telegram")]
        TransportKind::Telegram => Ok(Arc::new(pixdrop_telegram::TelegramTransport::new(
            &config.telegram,
        )?)),
        #[allow(unreachable_patterns)]
        other => Err(PixdropError::Config(format!(
            "transport `{other}` is not compiled into this binary"
        ))),
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides `app.log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pixdrop={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
