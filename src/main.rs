//! Eco-Grid API server

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use eco_grid::{
    api::start_server,
    core::{factory, Config},
    system::metrics,
};
use tokio::signal;
use tracing::{info, warn};

#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new(eco_grid::NAME)
        .version(eco_grid::VERSION)
        .about("Content, tools and telemetry backend for the Eco-Grid platform.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("http-addr")
                .long("http-addr")
                .value_name("ADDR")
                .help("HTTP server bind address"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("no-telemetry")
                .long("no-telemetry")
                .action(ArgAction::SetTrue)
                .help("Do not run the synthetic telemetry generator"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .action(ArgAction::SetTrue)
                .help("Insert demo content at startup"),
        )
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env_overrides()?;
            config
        }
        None => Config::load()?,
    };
    apply_cli_overrides(&mut config, &matches)?;
    config.validate()?;

    eco_grid::init_tracing(&config.logging)?;

    if config.metrics.enable_prometheus {
        metrics::init_registry().context("registering metrics")?;
    }

    let addr = config.server.http_addr;
    let state = factory::create_app_state(config).context("building application state")?;

    let telemetry = factory::create_telemetry_generator(&state).map(|generator| generator.spawn());
    if telemetry.is_none() {
        info!("Telemetry generator disabled");
    }

    start_server(addr, state, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    if let Some(handle) = telemetry {
        handle.abort();
    }
    info!("Shutdown complete");
    Ok(())
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &ArgMatches) -> anyhow::Result<()> {
    if let Some(addr) = matches.get_one::<String>("http-addr") {
        config.server.http_addr = addr
            .parse()
            .with_context(|| format!("Invalid HTTP address: {}", addr))?;
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    if matches.get_flag("no-telemetry") {
        config.telemetry.enabled = false;
    }

    if matches.get_flag("seed") {
        config.server.seed_demo_content = true;
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
    warn!("Initiating graceful shutdown...");
}
