//! keepalive - a lightweight liveness monitor
//!
//! Usage:
//!     api_endpoint_users=https://users.example.com/ping keepalive [--config <path>]
//!
//! See --help for more options.

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use keepalive::api::ApiServer;
use keepalive::config::{load_config, load_env_file, Config, Overrides};
use keepalive::monitor::{derive_targets, HttpProber, PollCoordinator, Scheduler, Target};
use keepalive::state::AppState;
use keepalive::util::init_logging;

/// Keeps HTTP endpoints warm and reports whether they are reachable.
#[derive(Parser, Debug)]
#[command(name = "keepalive")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Optional YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the status API port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Print the resolved configuration and targets, then exit
    #[arg(long)]
    validate: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    load_env_file(Path::new(".env")).context("failed to load .env file")?;
    let env: HashMap<String, String> = std::env::vars().collect();

    let overrides = Overrides {
        port: cli.port,
        log_level: cli.log_level.clone(),
    };
    let config = load_config(cli.config.as_deref(), &env, &overrides)
        .context("failed to load configuration")?;

    let targets = derive_targets(&env, &config.monitor.endpoint_prefix);

    if cli.validate {
        print_summary(&config, &targets);
        return Ok(());
    }

    init_logging(&config.global.log_level, &config.global.log_format)
        .context("failed to initialize logging")?;

    info!(
        port = config.server.port,
        interval = %humantime::format_duration(config.monitor.interval),
        timeout = %humantime::format_duration(config.monitor.timeout),
        targets = targets.len(),
        "keepalive starting"
    );

    if targets.is_empty() {
        info!(
            prefix = %config.monitor.endpoint_prefix,
            "no targets configured, cycles will be empty"
        );
    }
    for target in &targets {
        info!(name = %target.name, url = %target.url, "configured target");
    }

    run(config, targets)
}

fn print_summary(config: &Config, targets: &[Target]) {
    println!("Configuration is valid.");
    println!("  Listen: {}", config.server.address());
    println!(
        "  Interval: {}",
        humantime::format_duration(config.monitor.interval)
    );
    println!(
        "  Timeout: {}",
        humantime::format_duration(config.monitor.timeout)
    );
    println!("  Targets: {}", targets.len());
    for target in targets {
        println!("    - {} -> {}", target.name, target.url);
    }
}

/// Run the monitor with the given configuration.
fn run(config: Config, targets: Vec<Target>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(async { run_async(config, targets).await })
}

/// Async entry point for the monitor.
async fn run_async(config: Config, targets: Vec<Target>) -> Result<()> {
    let state = AppState::new(config, targets);
    let monitor = &state.config().monitor;

    let prober = HttpProber::new(monitor.timeout).context("failed to build HTTP client")?;
    let coordinator = Arc::new(PollCoordinator::from_state(&state, prober));
    let scheduler = Scheduler::new(coordinator, monitor.interval);

    let address = state.config().server.address();
    let server = ApiServer::bind(address, state.clone())
        .await
        .with_context(|| format!("failed to bind status API on {}", address))?;

    let scheduler_handle = tokio::spawn(scheduler.run(state.shutdown().subscribe()));
    let server_handle = tokio::spawn(server.run(state.shutdown().subscribe()));

    info!("keepalive is running");
    info!("press Ctrl+C to stop");

    state.shutdown().shutdown_on_ctrl_c().await;

    let _ = scheduler_handle.await;
    let _ = server_handle.await;

    info!("keepalive shut down complete");
    Ok(())
}
