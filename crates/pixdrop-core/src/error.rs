// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Pixdrop.

use thiserror::Error;

/// The primary error type used across all Pixdrop adapter traits and core operations.
#[derive(Debug, Error)]
pub enum PixdropError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The backing store could not be reached or the connection attempt timed out.
    #[error("connection error: {message}")]
    Connection { message: String },

    /// Storage backend errors (query failure, serialization, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A record with the same message id already exists.
    #[error("duplicate record: message `{message_id}` is already stored")]
    DuplicateRecord { message_id: String },

    /// The requested resource does not exist.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// An inbound transport event was missing fields it needs to be processed.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// Messaging transport errors (handshake failure, send failure, download failure).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PixdropError {
    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` when the error means the backing store is unreachable.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}
