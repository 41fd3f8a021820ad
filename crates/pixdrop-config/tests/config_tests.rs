// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Pixdrop configuration system.

use pixdrop_config::diagnostic::{ConfigError, suggest_key};
use pixdrop_config::model::{Environment, PixdropConfig, ReconnectStrategy, TransportKind};
use pixdrop_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use serial_test::serial;

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_pixdrop_config() {
    let toml = r#"
[app]
log_level = "debug"
environment = "development"

[storage]
database_path = "/tmp/test.db"
wal_mode = false
connect_timeout_secs = 3
query_timeout_secs = 4

[cache]
ttl_secs = 60

[gateway]
bind_address = "0.0.0.0"
port = 8080
default_page_size = 20
max_page_size = 50
list_all_warn_threshold = 200

[session]
transport = "telegram"
auth_dir = "/tmp/auth"
notify_target = "admin@s.whatsapp.net"

[session.reconnect]
strategy = "exponential"
initial_delay_ms = 250
max_delay_ms = 8000
max_attempts = 5

[bridge]
url = "wss://bridge.local/ws"

[telegram]
bot_token = "123:ABC"
allowed_users = ["alice", "bob"]
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.log_level, "debug");
    assert_eq!(config.app.environment, Environment::Development);
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.storage.connect_timeout_secs, 3);
    assert_eq!(config.storage.query_timeout_secs, 4);
    assert_eq!(config.cache.ttl_secs, 60);
    assert_eq!(config.gateway.bind_address, "0.0.0.0");
    assert_eq!(config.gateway.port, 8080);
    assert_eq!(config.gateway.default_page_size, 20);
    assert_eq!(config.gateway.max_page_size, 50);
    assert_eq!(config.gateway.list_all_warn_threshold, 200);
    assert_eq!(config.session.transport, TransportKind::Telegram);
    assert_eq!(config.session.auth_dir, "/tmp/auth");
    assert_eq!(
        config.session.notify_target.as_deref(),
        Some("admin@s.whatsapp.net")
    );
    assert_eq!(config.session.reconnect.strategy, ReconnectStrategy::Exponential);
    assert_eq!(config.session.reconnect.max_attempts, Some(5));
    assert_eq!(config.bridge.url, "wss://bridge.local/ws");
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(config.telegram.allowed_users, vec!["alice", "bob"]);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.app.log_level, "info");
    assert_eq!(config.app.environment, Environment::Production);
    assert!(config.storage.wal_mode);
    assert_eq!(config.storage.connect_timeout_secs, 10);
    assert_eq!(config.storage.query_timeout_secs, 30);
    assert_eq!(config.cache.ttl_secs, 300);
    assert_eq!(config.gateway.bind_address, "127.0.0.1");
    assert_eq!(config.gateway.default_page_size, 10);
    assert_eq!(config.session.transport, TransportKind::Bridge);
    assert!(config.session.notify_target.is_none());
    assert_eq!(config.session.reconnect.strategy, ReconnectStrategy::Immediate);
    assert!(config.telegram.bot_token.is_none());
}

/// Unknown field in [cache] section produces an UnknownField error.
#[test]
fn unknown_field_in_cache_produces_error() {
    let toml = r#"
[cache]
ttl_sec = 10
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    // Figment wraps serde's deny_unknown_fields error
    assert!(
        err_str.contains("unknown field") || err_str.contains("ttl_sec"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[logging]
level = "debug"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Dotted overrides land on underscore-containing keys, not nested tables.
#[test]
fn dotted_override_sets_underscore_key() {
    use figment::{Figment, providers::Serialized};

    let config: PixdropConfig = Figment::new()
        .merge(Serialized::defaults(PixdropConfig::default()))
        .merge(("storage.query_timeout_secs", 5))
        .merge(("session.reconnect.max_attempts", 3))
        .extract()
        .expect("should set keys via dot notation");

    assert_eq!(config.storage.query_timeout_secs, 5);
    assert_eq!(config.session.reconnect.max_attempts, Some(3));
}

/// PIXDROP_* environment variables override the config file.
#[test]
#[serial]
fn env_vars_override_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixdrop.toml");
    std::fs::write(&path, "[cache]\nttl_secs = 60\n\n[gateway]\nport = 4000\n").unwrap();

    // SAFETY: serialized with every other env-mutating test in this file.
    unsafe {
        std::env::set_var("PIXDROP_CACHE_TTL_SECS", "5");
        std::env::set_var("PIXDROP_SESSION_RECONNECT_STRATEGY", "exponential");
    }
    let result = load_and_validate_path(&path);
    unsafe {
        std::env::remove_var("PIXDROP_CACHE_TTL_SECS");
        std::env::remove_var("PIXDROP_SESSION_RECONNECT_STRATEGY");
    }

    let config = result.expect("config should load");
    assert_eq!(config.cache.ttl_secs, 5);
    assert_eq!(config.gateway.port, 4000);
    assert_eq!(config.session.reconnect.strategy, ReconnectStrategy::Exponential);
}

/// A --config path that does not exist is reported, not silently skipped.
#[test]
#[serial]
fn explicit_missing_path_is_an_error() {
    let errors = load_and_validate_path(std::path::Path::new("/nonexistent/pixdrop.toml"))
        .expect_err("missing explicit file should fail");
    assert!(matches!(&errors[0], ConfigError::Other(msg) if msg.contains("does not exist")));
}

/// load_and_validate with defaults works (no config file needed).
#[test]
#[serial]
fn load_and_validate_defaults() {
    let config = pixdrop_config::load_and_validate().expect("defaults should validate");
    assert_eq!(config.cache.ttl_secs, 300);
}

// ============================================================================
// Diagnostic tests
// ============================================================================

/// Unknown key "ttl_sec" in [cache] produces the suggestion `ttl_secs`.
#[test]
fn diagnostic_error_includes_unknown_key() {
    let toml = r#"
[cache]
ttl_sec = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "ttl_sec"
                && suggestion.as_deref() == Some("ttl_secs")
                && valid_keys.contains("ttl_secs")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error for 'ttl_sec' with suggestion 'ttl_secs', got: {errors:?}"
    );
}

/// Error output includes the list of valid keys for the section.
#[test]
fn diagnostic_error_includes_valid_keys() {
    let toml = r#"
[gateway]
prot = 8080
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_valid_keys = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { valid_keys, .. } if {
            valid_keys.contains("port")
                && valid_keys.contains("bind_address")
                && valid_keys.contains("max_page_size")
        })
    });
    assert!(has_valid_keys, "error should list valid keys for [gateway] section");
}

/// Unknown key with no close match does NOT produce a suggestion.
#[test]
fn diagnostic_no_suggestion_for_distant_typo() {
    let valid_keys = &["ttl_secs"];
    assert!(suggest_key("zzzzzz", valid_keys).is_none());
}

/// Invalid type (string where number expected) produces clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[gateway]
port = "not_a_number"
"#;

    let err = load_config_from_str(toml).expect_err("should reject invalid type");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("invalid type") || err_str.contains("port"),
        "error should mention type mismatch, got: {err_str}"
    );
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "ttl_sec".to_string(),
        table: "cache".to_string(),
        suggestion: Some("ttl_secs".to_string()),
        valid_keys: "ttl_secs".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some(), "should have diagnostic code");
    let help = error.help().expect("should have help text").to_string();
    assert!(help.contains("did you mean `ttl_secs`"), "got: {help}");

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("ttl_sec"), "rendered report should mention the key");
}

/// Validation errors surface through load_and_validate_str.
#[test]
fn validation_catches_zero_query_timeout() {
    let toml = r#"
[storage]
query_timeout_secs = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero timeout should fail");
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("query_timeout_secs"))
    }));
}

/// Inline sources still get a span pointing at the offending key.
#[test]
fn diagnostic_unknown_key_has_span_for_inline_source() {
    let toml = "[gateway]\nprot = 8080\n";

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let expected = toml.find("prot").unwrap();
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { table, span: Some(span), .. }
            if table == "gateway" && span.offset() == expected)
    }));
}
