// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Pixdrop.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level Pixdrop configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PixdropConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Document store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Read-through cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// HTTP API settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Messaging session settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// WebSocket bridge transport settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Telegram transport settings.
    #[serde(default)]
    pub telegram: TelegramConfig,
}

/// Deployment environment. Controls how much error detail the API exposes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

/// Process-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            environment: Environment::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Upper bound on a single connection attempt, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Upper bound on a single query, in seconds.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

impl StorageConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            connect_timeout_secs: default_connect_timeout_secs(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("pixdrop").join("pixdrop.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("pixdrop.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_query_timeout_secs() -> u64 {
    30
}

/// Read-through cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// How long a cached entry stays fresh, in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    300
}

/// HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address to bind the HTTP server to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port for the HTTP server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Page size used when a listing request has no `limit`.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Largest accepted `limit` for listing requests.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Record count above which rendering the full gallery logs a warning.
    #[serde(default = "default_list_all_warn_threshold")]
    pub list_all_warn_threshold: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            list_all_warn_threshold: default_list_all_warn_threshold(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_page_size() -> u32 {
    10
}

fn default_max_page_size() -> u32 {
    100
}

fn default_list_all_warn_threshold() -> usize {
    1000
}

/// Which messaging transport feeds the session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Bridge,
    Telegram,
}

/// Messaging session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Transport used for the session.
    #[serde(default)]
    pub transport: TransportKind,

    /// Directory holding persisted session credentials (`creds.json`).
    #[serde(default = "default_auth_dir")]
    pub auth_dir: String,

    /// Account notified about failed ingests. `None` notifies the sender.
    #[serde(default)]
    pub notify_target: Option<String>,

    /// How long shutdown waits for in-flight ingests, in seconds.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,

    /// Reconnect behavior after a recoverable close.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            auth_dir: default_auth_dir(),
            notify_target: None,
            drain_timeout_secs: default_drain_timeout_secs(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

fn default_auth_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("pixdrop").join("auth"))
        .unwrap_or_else(|| std::path::PathBuf::from("auth_info"))
        .to_string_lossy()
        .into_owned()
}

fn default_drain_timeout_secs() -> u64 {
    10
}

/// Reconnect strategy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReconnectStrategy {
    /// Reconnect at once, forever.
    #[default]
    Immediate,
    /// Exponential backoff between attempts.
    Exponential,
}

/// Reconnect policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectConfig {
    #[serde(default)]
    pub strategy: ReconnectStrategy,

    /// First backoff delay, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Backoff cap, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Consecutive failed attempts before giving up. `None` never gives up.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            strategy: ReconnectStrategy::default(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: None,
        }
    }
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

/// WebSocket bridge transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// WebSocket URL of the messaging sidecar.
    #[serde(default = "default_bridge_url")]
    pub url: String,

    /// Upper bound on the WebSocket handshake, in seconds.
    #[serde(default = "default_bridge_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: default_bridge_url(),
            connect_timeout_secs: default_bridge_connect_timeout_secs(),
        }
    }
}

fn default_bridge_url() -> String {
    "ws://127.0.0.1:8765/ws".to_string()
}

fn default_bridge_connect_timeout_secs() -> u64 {
    30
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required when `session.transport = "telegram"`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Telegram user IDs or usernames allowed to submit images. Empty allows everyone.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}
