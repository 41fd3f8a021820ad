// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging transport for deterministic testing.
//!
//! `MockTransport` implements `MessagingTransport` with scripted per-connection
//! events and captured outbound texts for assertion in tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, watch};

use pixdrop_core::{
    AdapterType, Credentials, HealthStatus, MediaSource, MessageId, MessagingTransport,
    PixdropError, PluginAdapter, TransportEvent,
};

/// A text captured from `send_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentText {
    pub to: String,
    pub text: String,
}

struct Script {
    events: Vec<TransportEvent>,
    ends: bool,
}

/// A mock messaging transport.
///
/// Each `connect()` takes the next script pushed with `push_connection()` and
/// makes its events available to `next_event()`. Once a script is drained,
/// `next_event()` waits for events injected with `push_event()`, or returns
/// `None` if the script was pushed with `push_ending_connection()` or
/// `end_stream()` was called. A connect with no script left yields an idle
/// connection that only reacts to injected events.
pub struct MockTransport {
    scripts: Mutex<VecDeque<Script>>,
    current: Mutex<VecDeque<TransportEvent>>,
    stream_ended: AtomicBool,
    notify: Notify,
    fail_connects: AtomicU32,
    fail_sends: AtomicBool,
    media: std::sync::Mutex<HashMap<String, Vec<u8>>>,
    sent: Mutex<Vec<SentText>>,
    last_credentials: Mutex<Option<Credentials>>,
    connects: watch::Sender<u32>,
    sent_count: watch::Sender<usize>,
    disconnects: AtomicU32,
}

impl MockTransport {
    /// Create a transport with no scripted connections.
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            current: Mutex::new(VecDeque::new()),
            stream_ended: AtomicBool::new(false),
            notify: Notify::new(),
            fail_connects: AtomicU32::new(0),
            fail_sends: AtomicBool::new(false),
            media: std::sync::Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            last_credentials: Mutex::new(None),
            connects: watch::channel(0).0,
            sent_count: watch::channel(0).0,
            disconnects: AtomicU32::new(0),
        }
    }

    /// Queue the events the next connection will deliver.
    pub async fn push_connection(&self, events: Vec<TransportEvent>) {
        self.scripts.lock().await.push_back(Script {
            events,
            ends: false,
        });
    }

    /// Queue events for the next connection, after which its stream ends.
    pub async fn push_ending_connection(&self, events: Vec<TransportEvent>) {
        self.scripts
            .lock()
            .await
            .push_back(Script { events, ends: true });
    }

    /// Inject an event into the current connection.
    pub async fn push_event(&self, event: TransportEvent) {
        self.current.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Make the current connection's event stream end once drained.
    pub fn end_stream(&self) {
        self.stream_ended.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Make the next `n` calls to `connect()` fail.
    pub fn fail_next_connects(&self, n: u32) {
        self.fail_connects.store(n, Ordering::SeqCst);
    }

    /// Make every `send_text()` fail while set.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Register the bytes `download()` returns for a remote reference.
    pub fn add_media(&self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.media
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(reference.into(), bytes);
    }

    /// Number of `connect()` calls so far, failed ones included.
    pub fn connect_count(&self) -> u32 {
        *self.connects.borrow()
    }

    /// Number of `disconnect()` calls so far.
    pub fn disconnect_count(&self) -> u32 {
        self.disconnects.load(Ordering::SeqCst)
    }

    /// Wait until `connect()` has been called at least `n` times.
    pub async fn wait_for_connects(&self, n: u32) {
        let mut rx = self.connects.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    /// Wait until at least `n` texts have been sent.
    pub async fn wait_for_sent(&self, n: usize) {
        let mut rx = self.sent_count.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    /// All texts passed to `send_text()`, including failed ones.
    pub async fn sent_texts(&self) -> Vec<SentText> {
        self.sent.lock().await.clone()
    }

    /// Credentials passed to the most recent `connect()`.
    pub async fn last_credentials(&self) -> Option<Credentials> {
        self.last_credentials.lock().await.clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, PixdropError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PixdropError> {
        Ok(())
    }
}

#[async_trait]
impl MessagingTransport for MockTransport {
    async fn connect(&self, credentials: &Credentials) -> Result<(), PixdropError> {
        self.connects.send_modify(|count| *count += 1);
        *self.last_credentials.lock().await = Some(credentials.clone());

        let failing = self
            .fail_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PixdropError::transport("mock connect failure"));
        }

        let (events, ends) = match self.scripts.lock().await.pop_front() {
            Some(script) => (script.events, script.ends),
            None => (Vec::new(), false),
        };
        self.stream_ended.store(ends, Ordering::SeqCst);
        *self.current.lock().await = events.into();
        Ok(())
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        loop {
            {
                let mut queue = self.current.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Some(event);
                }
                if self.stream_ended.load(Ordering::SeqCst) {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    async fn download(&self, media: &MediaSource) -> Result<Vec<u8>, PixdropError> {
        match media {
            MediaSource::Inline(bytes) => Ok(bytes.clone()),
            MediaSource::Remote(reference) => self
                .media
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .get(reference)
                .cloned()
                .ok_or_else(|| PixdropError::transport(format!("no mock media for {reference}"))),
        }
    }

    async fn send_text(&self, to: &str, text: &str) -> Result<MessageId, PixdropError> {
        let id = {
            let mut sent = self.sent.lock().await;
            sent.push(SentText {
                to: to.to_string(),
                text: text.to_string(),
            });
            sent.len()
        };
        self.sent_count.send_replace(id);
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(PixdropError::transport("mock send failure"));
        }
        Ok(MessageId(format!("mock-msg-{id}")))
    }

    async fn disconnect(&self) -> Result<(), PixdropError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
