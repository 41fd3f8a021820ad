// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Pixdrop.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use pixdrop_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Serving on port {}", config.gateway.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, ConfigSource, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::PixdropConfig;

/// Loads configuration from the standard locations and `PIXDROP_*` env vars,
/// then validates it.
pub fn load_and_validate() -> Result<PixdropConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Like [`load_and_validate`], with `path` replacing the file hierarchy.
pub fn load_and_validate_path(path: &Path) -> Result<PixdropConfig, Vec<ConfigError>> {
    if !path.exists() {
        return Err(vec![ConfigError::Other(format!(
            "config file `{}` does not exist",
            path.display()
        ))]);
    }
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![ConfigSource::new(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Loads and validates configuration from a TOML string, without env vars.
pub fn load_and_validate_str(toml_content: &str) -> Result<PixdropConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![ConfigSource::new("<inline>", toml_content)]
    })
}

/// Validates a loaded config, or turns a figment failure into diagnostics.
///
/// Sources are only read when there is an error to point into.
fn finish(
    loaded: Result<PixdropConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<ConfigSource>,
) -> Result<PixdropConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// The TOML layers that exist on disk, most specific first.
fn collect_toml_sources() -> Vec<ConfigSource> {
    let local = std::env::current_dir()
        .map(|dir| dir.join(loader::LOCAL_CONFIG_FILE))
        .unwrap_or_else(|_| loader::LOCAL_CONFIG_FILE.into());

    [
        Some(local),
        loader::user_config_path(),
        Some(loader::SYSTEM_CONFIG_PATH.into()),
    ]
    .into_iter()
    .flatten()
    .filter_map(|path| {
        std::fs::read_to_string(&path)
            .ok()
            .map(|content| ConfigSource::new(path.display().to_string(), content))
    })
    .collect()
}
