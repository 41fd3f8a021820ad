// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging transport adapter trait.

use async_trait::async_trait;

use crate::error::PixdropError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Credentials, MediaSource, MessageId, TransportEvent};

/// A connection to a messaging network that delivers inbound images.
///
/// The transport owns the wire protocol. One `connect` call starts one
/// connection; its lifecycle is observed through [`next_event`](Self::next_event),
/// which yields `Open`, then messages, then a final `Closed`.
#[async_trait]
pub trait MessagingTransport: PluginAdapter {
    /// Starts a connection using the given credentials.
    ///
    /// Returning `Ok` does not mean the session is open; that is reported by
    /// a [`TransportEvent::Open`] event.
    async fn connect(&self, credentials: &Credentials) -> Result<(), PixdropError>;

    /// Waits for the next event of the current connection.
    ///
    /// Returns `None` when the event stream of the connection has ended
    /// without an explicit close.
    async fn next_event(&self) -> Option<TransportEvent>;

    /// Fetches the bytes behind a media reference.
    async fn download(&self, media: &MediaSource) -> Result<Vec<u8>, PixdropError>;

    /// Sends a plain-text message to an account.
    async fn send_text(&self, to: &str, text: &str) -> Result<MessageId, PixdropError>;

    /// Tears down the current connection, if any.
    async fn disconnect(&self) -> Result<(), PixdropError>;
}
