// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging session management for Pixdrop.
//!
//! The [`SessionController`] is the ingestion-side coordinator that:
//! - Loads stored credentials and connects the messaging transport
//! - Tracks the session through an explicit state machine
//! - Reconnects after recoverable closes according to a [`ReconnectPolicy`](pixdrop_resilience::ReconnectPolicy)
//! - Hands each inbound image to the [`ImageIngestor`] on its own task
//! - Stops for good when the account is logged out

pub mod controller;
pub mod credentials;
pub mod ingest;
pub mod shutdown;

pub use controller::{SessionController, SessionOutcome, SessionSettings, reconnect_policy};
pub use credentials::FileCredentialStore;
pub use ingest::{ImageIngestor, IngestOutcome};
pub use shutdown::{drain_tasks, install_signal_handler};
