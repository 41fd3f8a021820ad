// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for Pixdrop.
//!
//! - [`ConnectionManager`] guarantees at most one in-flight connection attempt
//!   per backing resource and shares its outcome with every concurrent caller.
//! - [`ReconnectPolicy`] decides whether, and how long after, a dropped
//!   messaging session is reconnected.

pub mod backoff;
pub mod connection;

pub use backoff::ReconnectPolicy;
pub use connection::{ConnectError, ConnectFuture, ConnectionManager};
