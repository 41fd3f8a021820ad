// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Pixdrop.
//!
//! This crate provides the trait definitions, error types, and common types
//! shared by every Pixdrop crate. Transports, stores and credential sources
//! implement the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PixdropError;
pub use types::{
    AdapterType, CloseReason, ConnectionStatus, Credentials, HealthStatus, ImageEvent,
    ImageRecord, InboundEvent, MediaSource, MessageId, SessionState, TransportEvent,
};

pub use traits::{CredentialStore, ImageStore, MessagingTransport, PluginAdapter};
