// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./pixdrop.toml` > `~/.config/pixdrop/pixdrop.toml` > `/etc/pixdrop/pixdrop.toml`
//! with environment variable overrides via `PIXDROP_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PixdropConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/pixdrop/pixdrop.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "pixdrop.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/pixdrop/pixdrop.toml` (system-wide)
/// 3. `~/.config/pixdrop/pixdrop.toml` (user XDG config)
/// 4. `./pixdrop.toml` (local directory)
/// 5. `PIXDROP_*` environment variables
pub fn load_config() -> Result<PixdropConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PixdropConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PixdropConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PixdropConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PixdropConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PixdropConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Per-user configuration file under the XDG config directory.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("pixdrop").join(LOCAL_CONFIG_FILE))
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` instead of `Env::split("_")` because key names contain
/// underscores: `PIXDROP_STORAGE_DATABASE_PATH` must map to
/// `storage.database_path`, not `storage.database.path`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("PIXDROP_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    // Nested sections come before their parents so the longest prefix wins.
    const SECTIONS: &[(&str, &str)] = &[
        ("session_reconnect_", "session.reconnect."),
        ("app_", "app."),
        ("storage_", "storage."),
        ("cache_", "cache."),
        ("gateway_", "gateway."),
        ("session_", "session."),
        ("bridge_", "bridge."),
        ("telegram_", "telegram."),
    ];

    SECTIONS
        .iter()
        .find_map(|(prefix, dotted)| key.strip_prefix(prefix).map(|rest| format!("{dotted}{rest}")))
        .unwrap_or_else(|| key.to_string())
}
