// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use pixdrop_core::PixdropError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Handle to the SQLite database.
///
/// Cloning shares the same background connection thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode and apply migrations.
    pub async fn open(path: &str) -> Result<Self, PixdropError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing the journal mode.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, PixdropError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| PixdropError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| PixdropError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            let journal_mode = if wal_mode { "WAL" } else { "DELETE" };
            let applied: String =
                conn.pragma_update_and_check(None, "journal_mode", journal_mode, |row| row.get(0))?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            debug!(journal_mode = %applied, "database pragmas applied");
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| run_migrations(conn))
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(inner) => inner,
                other => PixdropError::Storage {
                    source: Box::new(other),
                },
            })?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Fold the WAL back into the main database file.
    pub async fn checkpoint(&self) -> Result<(), PixdropError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// Checkpoint and close the connection. Other clones see the connection as closed.
    pub async fn close(self) -> Result<(), PixdropError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Convert a tokio-rusqlite error into a [`PixdropError`].
///
/// A closed connection means the store is unreachable and maps to
/// [`PixdropError::Connection`]; everything else is a storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> PixdropError {
    match e {
        tokio_rusqlite::Error::ConnectionClosed => PixdropError::Connection {
            message: "database connection closed".to_string(),
        },
        other => PixdropError::Storage {
            source: Box::new(other),
        },
    }
}
