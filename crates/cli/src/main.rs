// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dbup - database schema upgrades

mod color;
mod commands;
mod config;
mod env;
mod output;
mod table;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{history, plan, status, upgrade, Context};
use config::Config;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "dbup", version, about = "dbup - versioned SQLite schema upgrades")]
struct Cli {
    /// Config file (default: $DBUP_CONFIG, ./dbup.toml, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current schema version and ledger health
    Status,
    /// Show the steps an upgrade would run
    Plan(plan::PlanArgs),
    /// Upgrade the database
    Upgrade(upgrade::UpgradeArgs),
    /// List recorded upgrade steps
    History,
}

fn main() {
    setup_logging();
    if let Err(e) = run() {
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(1);
    }
}

/// Logs go to stderr so `-o json` output stays parseable.
fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_env(env::LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Format an anyhow error, deduplicating the chain.
///
/// When the top-level message already contains every cause (common with
/// `#[error("... {source}")]` variants) the chain is skipped; otherwise it is
/// rendered like anyhow's Debug output.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();
    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));
    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    let cwd = std::env::current_dir()?;
    let config = Config::discover(cli.config.as_deref(), &cwd)?;
    let ctx = Context::new(config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Status => status::handle(&ctx, format, &mut out),
        Commands::Plan(args) => plan::handle(args, &ctx, format, &mut out),
        Commands::Upgrade(args) => upgrade::handle(args, &ctx, format, &mut out),
        Commands::History => history::handle(&ctx, format, &mut out),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
