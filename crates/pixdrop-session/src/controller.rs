// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging session state machine.
//!
//! ```text
//! Init -> Connecting -> Open -> ClosedRecoverable -> Connecting -> ...
//!                  \       \
//!                   +-------+-> ClosedTerminal (logged out, halt)
//! ```
//!
//! The controller drives one transport connection at a time in a loop. Each
//! inbound image is handed to its own tracked task, so a slow store never
//! stalls event delivery.

use std::sync::Arc;
use std::time::Duration;

use pixdrop_config::model::{ReconnectConfig, ReconnectStrategy, SessionConfig};
use pixdrop_core::{
    CloseReason, CredentialStore, ImageStore, InboundEvent, MessagingTransport, PixdropError,
    SessionState, TransportEvent,
};
use pixdrop_resilience::ReconnectPolicy;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::ingest::ImageIngestor;
use crate::shutdown::drain_tasks;

/// Pause after a connect attempt fails, when the policy asks for no delay.
///
/// Keeps an unreachable transport from turning the loop into a busy spin.
const CONNECT_ERROR_PAUSE: Duration = Duration::from_secs(1);

/// Why [`SessionController::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The transport reported a logout. Credentials must be renewed.
    LoggedOut,
    /// The cancellation token fired.
    Shutdown,
    /// A bounded reconnect policy ran out of attempts.
    GaveUp { attempts: u32 },
}

/// Tunables for the session controller.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub policy: ReconnectPolicy,
    pub notify_target: Option<String>,
    pub drain_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            policy: ReconnectPolicy::default(),
            notify_target: None,
            drain_timeout: Duration::from_secs(10),
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            policy: reconnect_policy(&config.reconnect),
            notify_target: config.notify_target.clone(),
            drain_timeout: Duration::from_secs(config.drain_timeout_secs),
        }
    }
}

/// Builds the reconnect policy described by the `[session.reconnect]` section.
pub fn reconnect_policy(config: &ReconnectConfig) -> ReconnectPolicy {
    match config.strategy {
        ReconnectStrategy::Immediate => ReconnectPolicy::Immediate {
            max_attempts: config.max_attempts,
        },
        ReconnectStrategy::Exponential => ReconnectPolicy::Exponential {
            initial: Duration::from_millis(config.initial_delay_ms),
            max: Duration::from_millis(config.max_delay_ms),
            max_attempts: config.max_attempts,
        },
    }
}

/// How one connection ended.
struct ConnectionEnd {
    opened: bool,
    /// Never reached the transport: credentials or `connect` failed.
    connect_failed: bool,
    reason: CloseReason,
}

impl ConnectionEnd {
    fn failed(message: String) -> Self {
        Self {
            opened: false,
            connect_failed: true,
            reason: CloseReason::Other(message),
        }
    }
}

/// Owns the messaging session lifecycle.
pub struct SessionController {
    transport: Arc<dyn MessagingTransport>,
    credentials: Arc<dyn CredentialStore>,
    ingestor: Arc<ImageIngestor>,
    settings: SessionSettings,
    state: watch::Sender<SessionState>,
    tasks: TaskTracker,
}

impl SessionController {
    pub fn new(
        transport: Arc<dyn MessagingTransport>,
        credentials: Arc<dyn CredentialStore>,
        store: Arc<dyn ImageStore>,
        settings: SessionSettings,
    ) -> Self {
        let ingestor = Arc::new(ImageIngestor::new(
            Arc::clone(&transport),
            store,
            settings.notify_target.clone(),
        ));
        let (state, _) = watch::channel(SessionState::Init);
        Self {
            transport,
            credentials,
            ingestor,
            settings,
            state,
            tasks: TaskTracker::new(),
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// A receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Number of ingest tasks still running.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Runs the session until logout, cancellation, or an exhausted reconnect policy.
    ///
    /// On return the transport is disconnected and in-flight ingests have been
    /// drained (bounded by the drain timeout).
    pub async fn run(&self, cancel: CancellationToken) -> Result<SessionOutcome, PixdropError> {
        self.set_state(SessionState::Init);
        let outcome = self.drive(&cancel).await;

        if let Err(e) = self.transport.disconnect().await {
            warn!(error = %e, "transport disconnect failed");
        }
        drain_tasks(&self.tasks, self.settings.drain_timeout).await;
        info!(outcome = ?outcome, "session ended");
        Ok(outcome)
    }

    async fn drive(&self, cancel: &CancellationToken) -> SessionOutcome {
        // Reconnects since the session was last open.
        let mut attempts: u32 = 0;

        loop {
            self.set_state(SessionState::Connecting);
            let end = tokio::select! {
                end = self.run_connection() => end,
                _ = cancel.cancelled() => return SessionOutcome::Shutdown,
            };

            if end.opened {
                attempts = 0;
            }
            if end.reason.is_terminal() {
                self.set_state(SessionState::ClosedTerminal);
                warn!("session logged out, not reconnecting");
                return SessionOutcome::LoggedOut;
            }

            self.set_state(SessionState::ClosedRecoverable);
            attempts = attempts.saturating_add(1);
            let Some(mut delay) = self.settings.policy.delay_for(attempts) else {
                let made = attempts - 1;
                warn!(attempts = made, "reconnect attempts exhausted");
                return SessionOutcome::GaveUp { attempts: made };
            };
            if end.connect_failed && delay.is_zero() {
                delay = CONNECT_ERROR_PAUSE;
            }

            info!(reason = %end.reason, attempt = attempts, delay = ?delay, "reconnecting");
            if !delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return SessionOutcome::Shutdown,
                }
            }
        }
    }

    /// One connection attempt, from credential load to close.
    ///
    /// Credentials are read fresh each time; the sidecar may have rewritten
    /// them while the previous connection was up.
    async fn run_connection(&self) -> ConnectionEnd {
        let credentials = match self.credentials.load().await {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(error = %e, "credential load failed");
                return ConnectionEnd::failed(format!("credential load failed: {e}"));
            }
        };
        if credentials.is_empty() {
            debug!("no stored credentials, transport will have to pair");
        }

        if let Err(e) = self.transport.connect(&credentials).await {
            warn!(transport = self.transport.name(), error = %e, "transport connect failed");
            return ConnectionEnd::failed(format!("connect failed: {e}"));
        }

        let mut opened = false;
        loop {
            match self.transport.next_event().await {
                Some(TransportEvent::Open) => {
                    opened = true;
                    self.set_state(SessionState::Open);
                }
                Some(TransportEvent::Closed(reason)) => {
                    return ConnectionEnd {
                        opened,
                        connect_failed: false,
                        reason,
                    };
                }
                Some(TransportEvent::Message(event)) if opened => self.dispatch(event),
                Some(TransportEvent::Message(event)) => {
                    warn!(kind = event.kind(), "dropping message received before open");
                }
                None => {
                    debug!("transport event stream ended");
                    return ConnectionEnd {
                        opened,
                        connect_failed: false,
                        reason: CloseReason::ConnectionLost,
                    };
                }
            }
        }
    }

    fn dispatch(&self, event: InboundEvent) {
        let ingestor = Arc::clone(&self.ingestor);
        self.tasks.spawn(async move {
            ingestor.handle(event).await;
        });
    }

    fn set_state(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!(from = %previous, to = %next, "session state changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_maps_to_immediate_unbounded() {
        let policy = reconnect_policy(&ReconnectConfig::default());
        assert_eq!(policy, ReconnectPolicy::Immediate { max_attempts: None });
    }

    #[test]
    fn exponential_config_maps_delays() {
        let config = ReconnectConfig {
            strategy: ReconnectStrategy::Exponential,
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
            max_attempts: Some(4),
        };
        assert_eq!(
            reconnect_policy(&config),
            ReconnectPolicy::Exponential {
                initial: Duration::from_millis(200),
                max: Duration::from_secs(5),
                max_attempts: Some(4),
            }
        );
    }

    #[test]
    fn settings_follow_session_config() {
        let config = SessionConfig {
            notify_target: Some("ops".into()),
            drain_timeout_secs: 3,
            ..SessionConfig::default()
        };
        let settings = SessionSettings::from_config(&config);
        assert_eq!(settings.notify_target.as_deref(), Some("ops"));
        assert_eq!(settings.drain_timeout, Duration::from_secs(3));
    }
}
