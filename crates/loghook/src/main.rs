//! loghook - structured logs into ClickHouse
//!
//! # Usage
//!
//! ```bash
//! # Create the log table described in loghook.toml
//! loghook init
//! loghook init --dry-run                  # print the DDL only
//!
//! # Emit demo entries through the hook and report what was inserted
//! loghook emit --count 100
//!
//! # Drop the log table
//! loghook clear --yes
//!
//! # Use another config file or log level
//! loghook --config configs/app.toml --log-level debug emit
//! ```

mod cmd;
mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use loghook_config::Config;

/// Config file used when `--config` is not given
const DEFAULT_CONFIG_PATH: &str = "loghook.toml";

/// loghook - structured logs into ClickHouse
#[derive(Parser, Debug)]
#[command(name = "loghook")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the table description and create the table
    Init(cmd::init::InitArgs),

    /// Send demo log entries through the ClickHouse hook
    Emit(cmd::emit::EmitArgs),

    /// Drop the log table (removes all data!)
    Clear(cmd::clear::ClearArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    let log_level = resolve_log_level(cli.log_level.as_deref(), &config);

    let hook_handle = logging::init(&config.log, &log_level)?;

    match cli.command {
        Command::Init(args) => cmd::init::run(args, &config).await,
        Command::Emit(args) => cmd::emit::run(args, &config, &hook_handle).await,
        Command::Clear(args) => cmd::clear::run(args, &config).await,
    }
}

/// Load the config file, falling back to defaults when the default path is absent
fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH) {
        return Ok(Config::default());
    }

    Config::from_file(path).with_context(|| format!("failed to load config {}", path.display()))
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<&str>, config: &Config) -> String {
    match cli_level {
        Some(level) => level.to_string(),
        None => config.log.level.as_str().to_string(),
    }
}
