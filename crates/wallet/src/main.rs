//! ethkey CLI
//!
//! Creates, restores or opens an Ethereum account on an offline machine and
//! prints the result. Prompts and logs go to stderr; the report goes to stdout.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ethkey_crypto::OsEntropy;
use ethkey_wallet::terminal::{deliver_report, CANCELLED_MESSAGE};
use ethkey_wallet::{
    LogFormat, Mode, Outcome, TerminalPrompter, WalletConfig, WorkflowEngine, EXIT_CONFIG_ERROR,
};
use tracing::{error, Level};
use tracing_subscriber::EnvFilter;

/// Offline Ethereum key tool
#[derive(Parser)]
#[command(name = "ethkey")]
#[command(version)]
#[command(about = "Create or restore an Ethereum account offline", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, env = "ETHKEY_CONFIG")]
    config: Option<PathBuf>,

    /// Skip the mode question
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Write the exported keystore JSON to this file as well
    #[arg(long)]
    keystore_out: Option<PathBuf>,

    /// The logging level (trace|debug|info|warn|error)
    #[arg(long)]
    log_level: Option<String>,

    /// The logging format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Disable colored logs
    #[arg(long, default_value = "false")]
    log_no_color: bool,
}

fn main() {
    let cli = Cli::parse();

    let mut config = match WalletConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };
    if let Some(mode) = cli.mode {
        config.mode = Some(mode);
    }

    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let log_format = cli.log_format.unwrap_or(config.log_format);
    init_tracing(log_level, log_format, cli.log_no_color);

    let code = match run(config, cli.keystore_out) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "ethkey failed");
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

fn run(config: WalletConfig, keystore_out: Option<PathBuf>) -> Result<i32> {
    let mut engine = WorkflowEngine::new(config, TerminalPrompter::stdio(), OsEntropy);

    match engine.run() {
        Outcome::Completed(report) => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            deliver_report(&report, &mut out, keystore_out.as_deref())?;
            Ok(0)
        }
        Outcome::Cancelled => {
            eprintln!("{CANCELLED_MESSAGE}");
            Ok(0)
        }
        Outcome::Failed(e) => Err(e).context("Wallet workflow failed"),
    }
}

fn init_tracing(log_level: &str, log_format: LogFormat, no_color: bool) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(!no_color)
        .with_writer(io::stderr);

    match log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Plain => subscriber.init(),
    }
}
