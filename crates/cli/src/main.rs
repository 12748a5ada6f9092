// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! warden - hook dispatcher for coding-assistant tool events
//!
//! The default invocation reads one event envelope from stdin, runs it
//! through the configured hook pipeline, and writes a decision envelope to
//! stdout. Subcommands expose pool occupancy, probed tool availability,
//! and the hook registry.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod logging;
mod paths;
mod runtime;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, warn};
use warden_core::{HookEvent, Response};
use warden_pool::{PoolManager, PoolsConfig};

use crate::paths::WardenPaths;

#[derive(Parser)]
#[command(
    name = "warden",
    version,
    about = "Warden - hook pipeline between a coding assistant and its tools"
)]
struct Cli {
    /// Directory holding registry.json, pools.json, and hook configs
    #[arg(long = "config-dir", global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read one event from stdin and emit a decision (the default)
    Dispatch,
    /// Show resource pool occupancy
    Status {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Probe external tools and report availability
    Tools,
    /// List registered hooks
    Hooks,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let paths = WardenPaths::resolve(cli.config_dir);
    let pools = PoolsConfig::load(&paths.pools_file).context("loading pool configuration")?;
    let _log_guard = logging::init(&pools.settings);

    match cli.command.unwrap_or(Commands::Dispatch) {
        Commands::Dispatch => dispatch(&paths, pools).await,
        Commands::Status { json } => status(pools, json),
        Commands::Tools => tools(&paths).await,
        Commands::Hooks => hooks(&paths),
    }
}

/// One event in, one decision out. The response envelope is produced for
/// every readable dispatch; only unrecoverable setup errors exit nonzero.
async fn dispatch(paths: &WardenPaths, pools: PoolsConfig) -> Result<()> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("reading event from stdin")?;

    let event: HookEvent = match serde_json::from_str(raw.trim()) {
        Ok(event) => event,
        Err(e) => {
            // A host glitch must not wedge the assistant: allow and move on.
            if !raw.trim().is_empty() {
                warn!(error = %e, "unparsable event envelope");
            }
            print_response(&Response::new(true, ""))?;
            return Ok(());
        }
    };

    let dispatcher = runtime::build(paths, pools).await?;
    debug!(hooks = dispatcher.hook_count(), "dispatching event");
    let response = dispatcher.dispatch(&event).await;
    dispatcher.shutdown().await;
    print_response(&response)
}

fn print_response(response: &Response) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string(response).context("encoding response envelope")?
    );
    Ok(())
}

fn status(pools: PoolsConfig, json: bool) -> Result<()> {
    let manager = PoolManager::new(pools);
    let status = manager.status();
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{:<16} {:>7} {:>5} {:>9}  {}",
        "POOL", "CURRENT", "MAX", "AVAILABLE", "DESCRIPTION"
    );
    for (name, entry) in &status.pools {
        println!(
            "{:<16} {:>7} {:>5} {:>9}  {}",
            name, entry.current, entry.max, entry.available, entry.description
        );
    }
    println!(
        "total: {}/{} permits in use",
        status.total_current, status.total_max
    );
    Ok(())
}

async fn tools(paths: &WardenPaths) -> Result<()> {
    let catalog = runtime::probe_tools(paths).await;
    println!("{}", catalog.report());
    Ok(())
}

fn hooks(paths: &WardenPaths) -> Result<()> {
    let registry = warden_hooks::Registry::load(&paths.registry_file)?;
    println!("registry version {}", registry.version);
    for (name, entry) in &registry.hooks {
        let category = entry.category.as_deref().unwrap_or("-");
        let description = entry.description.as_deref().unwrap_or("");
        let state = if entry.enabled { "" } else { " (disabled)" };
        println!("  {name:<20} [{category}] {description}{state}");
    }
    Ok(())
}
