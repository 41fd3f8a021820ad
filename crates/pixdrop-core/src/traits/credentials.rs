// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential source trait.

use async_trait::async_trait;

use crate::error::PixdropError;
use crate::types::Credentials;

/// Supplies the persisted session credentials for a transport.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Loads the current credentials. Absent credentials are not an error.
    async fn load(&self) -> Result<Credentials, PixdropError>;
}
