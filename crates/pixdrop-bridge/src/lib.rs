// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging transport backed by a bridge sidecar.
//!
//! The sidecar speaks the real messaging protocol (pairing, encryption,
//! media keys) and relays events to Pixdrop as JSON frames over a local
//! WebSocket. See [`codec`] for the frame format.

pub mod codec;
pub mod transport;

pub use transport::BridgeTransport;
