// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! De-duplicated connection establishment.
//!
//! Callers ask for a handle with [`ConnectionManager::ensure_connected`]. While
//! an attempt is pending, every caller awaits the same shared future, so the
//! connector runs once no matter how many requests arrive at the same time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use pixdrop_core::{ConnectionStatus, PixdropError};
use tracing::{debug, info, warn};

/// Future returned by a connector.
pub type ConnectFuture<C> = BoxFuture<'static, Result<C, ConnectError>>;

type Connector<C> = Arc<dyn Fn() -> ConnectFuture<C> + Send + Sync>;

/// Failure of a single connection attempt. Cloned to every waiter of the attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("{name}: connection failed: {message}")]
    Failed { name: String, message: String },

    #[error("{name}: connection attempt timed out after {timeout:?}")]
    TimedOut { name: String, timeout: Duration },
}

impl ConnectError {
    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<ConnectError> for PixdropError {
    fn from(err: ConnectError) -> Self {
        PixdropError::Connection {
            message: err.to_string(),
        }
    }
}

enum Slot<C> {
    Disconnected,
    Connecting {
        id: u64,
        attempt: Shared<ConnectFuture<C>>,
    },
    Connected(C),
}

/// Owns the connection to one backing resource.
///
/// The handle type `C` is cloned out to callers, so it should be a cheap
/// shared handle (an `Arc` or a channel-backed client).
pub struct ConnectionManager<C> {
    name: String,
    connector: Connector<C>,
    timeout: Duration,
    slot: Mutex<Slot<C>>,
    next_attempt: AtomicU64,
}

impl<C> ConnectionManager<C>
where
    C: Clone + Send + Sync + 'static,
{
    /// Creates a manager that connects with `connector`, bounding each attempt by `timeout`.
    pub fn new<F>(name: impl Into<String>, timeout: Duration, connector: F) -> Self
    where
        F: Fn() -> ConnectFuture<C> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            connector: Arc::new(connector),
            timeout,
            slot: Mutex::new(Slot::Disconnected),
            next_attempt: AtomicU64::new(1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a connected handle, connecting first if needed.
    ///
    /// If connected, returns at once without calling the connector. If an
    /// attempt is pending, waits for that attempt. Otherwise starts exactly
    /// one new attempt. A failed or timed-out attempt leaves the manager
    /// disconnected so the next call retries.
    pub async fn ensure_connected(&self) -> Result<C, ConnectError> {
        let (id, attempt) = {
            let mut slot = self.lock();
            match &*slot {
                Slot::Connected(handle) => return Ok(handle.clone()),
                Slot::Connecting { id, attempt } => {
                    debug!(name = %self.name, attempt = id, "joining pending connection attempt");
                    (*id, attempt.clone())
                }
                Slot::Disconnected => {
                    let id = self.next_attempt.fetch_add(1, Ordering::Relaxed);
                    let attempt = self.start_attempt();
                    *slot = Slot::Connecting {
                        id,
                        attempt: attempt.clone(),
                    };
                    debug!(name = %self.name, attempt = id, "starting connection attempt");
                    (id, attempt)
                }
            }
        };

        let result = attempt.await;
        self.settle(id, &result);
        result
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        match &*self.lock() {
            Slot::Disconnected => ConnectionStatus::Disconnected,
            Slot::Connecting { .. } => ConnectionStatus::Connecting,
            Slot::Connected(_) => ConnectionStatus::Connected,
        }
    }

    /// The connected handle, without connecting.
    pub fn current(&self) -> Option<C> {
        match &*self.lock() {
            Slot::Connected(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    /// Drops a connected handle that turned out to be dead.
    ///
    /// A pending attempt is left alone.
    pub fn invalidate(&self) {
        let mut slot = self.lock();
        if matches!(*slot, Slot::Connected(_)) {
            warn!(name = %self.name, "connection invalidated");
            *slot = Slot::Disconnected;
        }
    }

    /// Takes the connected handle out of the manager, leaving it disconnected.
    pub fn disconnect(&self) -> Option<C> {
        let mut slot = self.lock();
        match std::mem::replace(&mut *slot, Slot::Disconnected) {
            Slot::Connected(handle) => Some(handle),
            other => {
                *slot = other;
                None
            }
        }
    }

    fn start_attempt(&self) -> Shared<ConnectFuture<C>> {
        let connect = (self.connector)();
        let name = self.name.clone();
        let timeout = self.timeout;
        async move {
            match tokio::time::timeout(timeout, connect).await {
                Ok(result) => result,
                Err(_) => Err(ConnectError::TimedOut { name, timeout }),
            }
        }
        .boxed()
        .shared()
    }

    /// Records the outcome of attempt `id`, unless a newer state already replaced it.
    fn settle(&self, id: u64, result: &Result<C, ConnectError>) {
        let mut slot = self.lock();
        let current = matches!(&*slot, Slot::Connecting { id: pending, .. } if *pending == id);
        if !current {
            return;
        }
        match result {
            Ok(handle) => {
                info!(name = %self.name, attempt = id, "connected");
                *slot = Slot::Connected(handle.clone());
            }
            Err(e) => {
                warn!(name = %self.name, attempt = id, error = %e, "connection attempt failed");
                *slot = Slot::Disconnected;
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<C>> {
        // The slot is only swapped under the lock, so a panic elsewhere cannot leave it torn.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
