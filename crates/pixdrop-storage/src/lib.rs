// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite image store for Pixdrop.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. The connection is
//! owned by a [`ConnectionManager`](pixdrop_resilience::ConnectionManager),
//! so concurrent first requests open the database once, and every query is
//! bounded by the configured query timeout.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteImageStore;
pub use database::Database;
pub use models::*;
