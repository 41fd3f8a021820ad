// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pixdrop check` command implementation.
//!
//! Runs diagnostic checks against the loaded configuration: the image store,
//! stored credentials and the configured transport.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use pixdrop_config::model::{PixdropConfig, TransportKind};
use pixdrop_core::{CredentialStore, ImageStore, PixdropError};
use pixdrop_session::FileCredentialStore;
use pixdrop_storage::SqliteImageStore;

/// Bound on each network check.
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name,
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `pixdrop check` command.
///
/// Fails when any check fails; warnings are reported but do not fail.
pub async fn run_check(config: &PixdropConfig, plain: bool) -> Result<(), PixdropError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_config(config),
        check_database(config).await,
        check_credentials(config).await,
        check_transport(config).await,
    ];

    println!();
    println!("  pixdrop check");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", format_line(result, use_color));
    }
    println!();

    let failed = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    let warned = results
        .iter()
        .filter(|r| r.status == CheckStatus::Warn)
        .count();

    if failed == 0 && warned == 0 {
        println!("  All checks passed.");
    } else {
        let issues = failed + warned;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    }
    println!();

    if failed > 0 {
        return Err(PixdropError::Internal(format!("{failed} check(s) failed")));
    }
    Ok(())
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!(
            "    {symbol} {:<14} {message} ({duration_ms}ms)",
            result.name
        )
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<14} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

fn check_config(config: &PixdropConfig) -> CheckResult {
    let start = Instant::now();
    CheckResult::new(
        "Configuration",
        CheckStatus::Pass,
        format!(
            "valid (transport={}, listen={}:{})",
            config.session.transport, config.gateway.bind_address, config.gateway.port
        ),
        start,
    )
}

/// Opens the store (applying migrations) and counts records.
async fn check_database(config: &PixdropConfig) -> CheckResult {
    let start = Instant::now();
    let store = SqliteImageStore::new(config.storage.clone());
    let result = match store.count_images().await {
        Ok(count) => CheckResult::new(
            "Database",
            CheckStatus::Pass,
            format!("{count} images in {}", config.storage.database_path),
            start,
        ),
        Err(e) => CheckResult::new("Database", CheckStatus::Fail, e.to_string(), start),
    };
    let _ = store.close().await;
    result
}

async fn check_credentials(config: &PixdropConfig) -> CheckResult {
    let start = Instant::now();
    if config.session.transport == TransportKind::Telegram {
        return CheckResult::new(
            "Credentials",
            CheckStatus::Pass,
            "bot token from configuration",
            start,
        );
    }
    let store = FileCredentialStore::new(&config.session.auth_dir);
    match store.load().await {
        Ok(creds) if creds.is_empty() => CheckResult::new(
            "Credentials",
            CheckStatus::Warn,
            format!("none in {} (pairing required)", store.path().display()),
            start,
        ),
        Ok(_) => CheckResult::new(
            "Credentials",
            CheckStatus::Pass,
            format!("found in {}", store.path().display()),
            start,
        ),
        Err(e) => CheckResult::new("Credentials", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_transport(config: &PixdropConfig) -> CheckResult {
    match config.session.transport {
        TransportKind::Bridge => check_bridge(&config.bridge.url).await,
        TransportKind::Telegram => check_telegram(config).await,
    }
}

/// A TCP connect only; a WebSocket handshake would take over the sidecar session.
async fn check_bridge(url: &str) -> CheckResult {
    let start = Instant::now();
    let parsed = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            return CheckResult::new("Bridge", CheckStatus::Fail, format!("invalid url: {e}"), start);
        }
    };
    let (Some(host), Some(port)) = (parsed.host_str(), parsed.port_or_known_default()) else {
        return CheckResult::new("Bridge", CheckStatus::Fail, "url has no host", start);
    };

    let addr = format!("{host}:{port}");
    match tokio::time::timeout(CHECK_TIMEOUT, tokio::net::TcpStream::connect(&addr)).await {
        Ok(Ok(_)) => CheckResult::new("Bridge", CheckStatus::Pass, format!("reachable at {addr}"), start),
        Ok(Err(e)) => CheckResult::new(
            "Bridge",
            CheckStatus::Warn,
            format!("not reachable at {addr}: {e}"),
            start,
        ),
        Err(_) => CheckResult::new(
            "Bridge",
            CheckStatus::Warn,
            format!("timed out connecting to {addr}"),
            start,
        ),
    }
}

#[cfg(feature = "telegram")]
async fn check_telegram(config: &PixdropConfig) -> CheckResult {
    use pixdrop_core::{HealthStatus, PluginAdapter};

    let start = Instant::now();
    let transport = match pixdrop_telegram::TelegramTransport::new(&config.telegram) {
        Ok(transport) => transport,
        Err(e) => return CheckResult::new("Telegram", CheckStatus::Fail, e.to_string(), start),
    };
    match tokio::time::timeout(CHECK_TIMEOUT, transport.health_check()).await {
        Ok(Ok(HealthStatus::Healthy)) => {
            CheckResult::new("Telegram", CheckStatus::Pass, "bot token accepted", start)
        }
        Ok(Ok(HealthStatus::Degraded(msg))) => {
            CheckResult::new("Telegram", CheckStatus::Warn, msg, start)
        }
        Ok(Ok(HealthStatus::Unhealthy(msg))) => {
            CheckResult::new("Telegram", CheckStatus::Fail, msg, start)
        }
        Ok(Err(e)) => CheckResult::new("Telegram", CheckStatus::Fail, e.to_string(), start),
        Err(_) => CheckResult::new("Telegram", CheckStatus::Warn, "getMe timed out", start),
    }
}

#[cfg(not(feature = "telegram"))]
async fn check_telegram(_config: &PixdropConfig) -> CheckResult {
    CheckResult::new(
        "Telegram",
        CheckStatus::Fail,
        "telegram support is not compiled into this binary",
        Instant::now(),
    )
}
