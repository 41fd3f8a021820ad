// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed session credentials.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pixdrop_core::{CredentialStore, Credentials, PixdropError};
use tracing::{debug, info};

/// Name of the credentials file inside the auth directory.
pub const CREDENTIALS_FILE: &str = "creds.json";

/// Loads credentials from `<auth_dir>/creds.json`.
///
/// The file is written by whatever performed the pairing (the bridge sidecar
/// shares the directory); this store only reads it. A missing file yields
/// empty credentials so a first run can pair.
pub struct FileCredentialStore {
    auth_dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(auth_dir: impl Into<PathBuf>) -> Self {
        Self {
            auth_dir: auth_dir.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.auth_dir.join(CREDENTIALS_FILE)
    }

    pub fn auth_dir(&self) -> &Path {
        &self.auth_dir
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Credentials, PixdropError> {
        tokio::fs::create_dir_all(&self.auth_dir)
            .await
            .map_err(|e| PixdropError::Storage {
                source: Box::new(e),
            })?;

        let path = self.path();
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no stored credentials, starting unpaired");
                return Ok(Credentials::default());
            }
            Err(e) => {
                return Err(PixdropError::Storage {
                    source: Box::new(e),
                });
            }
        };

        let value: serde_json::Value = serde_json::from_slice(&raw).map_err(|e| {
            PixdropError::Config(format!("invalid credentials file {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loaded stored credentials");
        Ok(Credentials(value))
    }
}
