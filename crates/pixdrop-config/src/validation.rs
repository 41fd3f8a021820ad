// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, non-zero timeouts, and consistent page sizes.

use crate::diagnostic::ConfigError;
use crate::model::{PixdropConfig, ReconnectStrategy, TransportKind};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PixdropConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.app.log_level.to_ascii_lowercase().as_str()) {
        fail(format!(
            "app.log_level `{}` must be one of: {}",
            config.app.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }
    if config.storage.connect_timeout_secs == 0 {
        fail("storage.connect_timeout_secs must be greater than 0".to_string());
    }
    if config.storage.query_timeout_secs == 0 {
        fail("storage.query_timeout_secs must be greater than 0".to_string());
    }

    if config.cache.ttl_secs == 0 {
        fail("cache.ttl_secs must be greater than 0".to_string());
    }

    let addr = config.gateway.bind_address.trim();
    if addr.is_empty() {
        fail("gateway.bind_address must not be empty".to_string());
    } else {
        // Accept valid IPv4, IPv6, or hostname patterns
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "gateway.bind_address `{addr}` is not a valid IP address or hostname"
            ));
        }
    }
    if config.gateway.max_page_size == 0 {
        fail("gateway.max_page_size must be greater than 0".to_string());
    }
    if config.gateway.default_page_size == 0
        || config.gateway.default_page_size > config.gateway.max_page_size
    {
        fail(format!(
            "gateway.default_page_size must be between 1 and gateway.max_page_size ({}), got {}",
            config.gateway.max_page_size, config.gateway.default_page_size
        ));
    }

    if config.session.auth_dir.trim().is_empty() {
        fail("session.auth_dir must not be empty".to_string());
    }
    if config
        .session
        .notify_target
        .as_deref()
        .is_some_and(|t| t.trim().is_empty())
    {
        fail("session.notify_target must not be blank when set".to_string());
    }

    let reconnect = &config.session.reconnect;
    if reconnect.strategy == ReconnectStrategy::Exponential {
        if reconnect.initial_delay_ms == 0 {
            fail("session.reconnect.initial_delay_ms must be greater than 0".to_string());
        }
        if reconnect.max_delay_ms < reconnect.initial_delay_ms {
            fail(format!(
                "session.reconnect.max_delay_ms ({}) must not be below initial_delay_ms ({})",
                reconnect.max_delay_ms, reconnect.initial_delay_ms
            ));
        }
    }
    if reconnect.max_attempts == Some(0) {
        fail("session.reconnect.max_attempts must be greater than 0 when set".to_string());
    }

    match config.session.transport {
        TransportKind::Bridge => {
            let url = config.bridge.url.trim();
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                fail(format!(
                    "bridge.url `{url}` must start with ws:// or wss://"
                ));
            }
        }
        TransportKind::Telegram => {
            if config
                .telegram
                .bot_token
                .as_deref()
                .is_none_or(|t| t.trim().is_empty())
            {
                fail(
                    "telegram.bot_token is required when session.transport is \"telegram\""
                        .to_string(),
                );
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
