// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Pixdrop integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockTransport`] - Scripted messaging transport with captured sends
//! - [`MockImageStore`] - In-memory image store with an unreachable toggle
//! - [`TestHarness`] - Temp SQLite store, ingestor and HTTP router

pub mod harness;
pub mod mock_store;
pub mod mock_transport;

pub use harness::{TestHarness, image_event, image_event_at, text_event};
pub use mock_store::MockImageStore;
pub use mock_transport::{MockTransport, SentText};
