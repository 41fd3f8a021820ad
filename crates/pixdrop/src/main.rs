// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pixdrop - receive images over a messaging account and serve them over HTTP.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Pixdrop - receive images over a messaging account and serve them over HTTP.
#[derive(Parser, Debug)]
#[command(name = "pixdrop", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the ingestion session and the HTTP server (default).
    Serve,
    /// Validate configuration and check that the store and transport are reachable.
    Check {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => pixdrop_config::load_and_validate_path(path),
        None => pixdrop_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            pixdrop_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Check { plain } => check::run_check(&config, plain).await,
    };

    if let Err(e) = result {
        eprintln!("pixdrop: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::parse_from(["pixdrop"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["pixdrop", "check", "--plain", "--config", "/tmp/p.toml"]);
        assert!(matches!(cli.command, Some(Commands::Check { plain: true })));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.toml")));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = pixdrop_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.gateway.port, 3000);
    }
}
