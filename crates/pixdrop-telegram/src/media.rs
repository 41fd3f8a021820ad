// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media selection and download for Telegram messages.

use pixdrop_core::PixdropError;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{Document, FileId, PhotoSize};
use tracing::debug;

/// MIME type Telegram uses for re-encoded photos.
pub const PHOTO_MIME: &str = "image/jpeg";

/// Downloads a file from Telegram servers by its file id.
///
/// Uses the Bot API's `getFile` to resolve the file path, then downloads
/// the file content as bytes.
pub async fn download_file(bot: &Bot, file_id: &str) -> Result<Vec<u8>, PixdropError> {
    let file = bot
        .get_file(FileId(file_id.to_string()))
        .await
        .map_err(|e| PixdropError::Transport {
            message: format!("failed to get file info: {e}"),
            source: Some(Box::new(e)),
        })?;

    let mut buf = Vec::new();
    bot.download_file(&file.path, &mut buf)
        .await
        .map_err(|e| PixdropError::Transport {
            message: format!("failed to download file: {e}"),
            source: Some(Box::new(e)),
        })?;

    debug!(file_id, size = buf.len(), "downloaded file from Telegram");
    Ok(buf)
}

/// Telegram provides multiple sizes; the last one is the largest.
pub fn largest_photo(photos: &[PhotoSize]) -> Option<&PhotoSize> {
    photos.last()
}

/// MIME type of a document if it is an image.
pub fn image_document_mime(doc: &Document) -> Option<String> {
    doc.mime_type
        .as_ref()
        .map(|m| m.essence_str().to_ascii_lowercase())
        .filter(|m| m.starts_with("image/"))
}
