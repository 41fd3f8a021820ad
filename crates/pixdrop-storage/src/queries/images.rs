// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image record CRUD operations.

use pixdrop_core::PixdropError;
use rusqlite::{ErrorCode, OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{ImageRecord, format_timestamp, parse_timestamp};

const SELECT_COLUMNS: &str =
    "SELECT message_id, sender, timestamp, image_data, content_type, caption FROM images";

/// Insert a new image record.
///
/// Fails with [`PixdropError::DuplicateRecord`] when the message id exists;
/// the stored row is left untouched.
pub async fn insert_image(db: &Database, record: &ImageRecord) -> Result<(), PixdropError> {
    let record = record.clone();
    let message_id = record.message_id.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let result = conn.execute(
                "INSERT INTO images (message_id, sender, timestamp, image_data, content_type, caption)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.message_id,
                    record.sender,
                    format_timestamp(&record.timestamp),
                    record.image_data,
                    record.content_type,
                    record.caption,
                ],
            );
            match result {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation
                        && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
                {
                    Ok(false)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    if inserted {
        Ok(())
    } else {
        Err(PixdropError::DuplicateRecord { message_id })
    }
}

/// Get a single image by message id.
pub async fn get_image(db: &Database, message_id: &str) -> Result<Option<ImageRecord>, PixdropError> {
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<ImageRecord>, rusqlite::Error> {
            let sql = format!("{SELECT_COLUMNS} WHERE message_id = ?1");
            conn.query_row(&sql, params![message_id], row_to_image)
                .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List images newest first, ties broken by message id ascending.
///
/// `limit = None` returns every record after `offset`.
pub async fn list_images(
    db: &Database,
    offset: u64,
    limit: Option<u64>,
) -> Result<Vec<ImageRecord>, PixdropError> {
    // SQLite treats a negative LIMIT as "no limit".
    let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<ImageRecord>, rusqlite::Error> {
            let sql = format!(
                "{SELECT_COLUMNS} ORDER BY timestamp DESC, message_id ASC LIMIT ?1 OFFSET ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![limit, offset], row_to_image)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Total number of stored images.
pub async fn count_images(db: &Database) -> Result<u64, PixdropError> {
    db.connection()
        .call(|conn| -> Result<u64, rusqlite::Error> {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_image(row: &rusqlite::Row<'_>) -> Result<ImageRecord, rusqlite::Error> {
    let timestamp: String = row.get(2)?;
    let timestamp = parse_timestamp(&timestamp).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(ImageRecord {
        message_id: row.get(0)?,
        sender: row.get(1)?,
        timestamp,
        image_data: row.get(3)?,
        content_type: row.get(4)?,
        caption: row.get(5)?,
    })
}
