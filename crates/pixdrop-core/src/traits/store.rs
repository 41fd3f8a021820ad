// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image store adapter trait.

use async_trait::async_trait;

use crate::error::PixdropError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConnectionStatus, ImageRecord};

/// Persistence for received images.
///
/// Listing operations order records newest first, breaking timestamp ties by
/// `message_id` ascending.
#[async_trait]
pub trait ImageStore: PluginAdapter {
    /// Opens the backing store and applies pending migrations.
    async fn initialize(&self) -> Result<(), PixdropError>;

    /// Inserts a new record.
    ///
    /// Fails with [`PixdropError::DuplicateRecord`] if the message id is
    /// already stored; the stored record is left unchanged.
    async fn insert_image(&self, record: &ImageRecord) -> Result<(), PixdropError>;

    /// Looks up a single record by message id.
    async fn get_image(&self, message_id: &str) -> Result<Option<ImageRecord>, PixdropError>;

    /// Lists records skipping `offset`, returning at most `limit` (all if `None`).
    async fn list_images(
        &self,
        offset: u64,
        limit: Option<u64>,
    ) -> Result<Vec<ImageRecord>, PixdropError>;

    /// Total number of stored records.
    async fn count_images(&self) -> Result<u64, PixdropError>;

    /// Current status of the connection to the backing store.
    fn connection_status(&self) -> ConnectionStatus;

    /// Closes the backing store.
    async fn close(&self) -> Result<(), PixdropError>;
}
