//! adr-app
//!
//! Serves recipe results over HTTP on a local port.

#![forbid(unsafe_code)]

use adr_app::{AppState, router};
use adr_client::ActiveDataClient;
use adr_core::{AdrConfig, CachingQueryClient, Executor};
use anyhow::Context;
use clap::{ArgAction, Parser};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// adr-app - serve ActiveData recipes over HTTP
#[derive(Parser, Debug)]
#[command(name = "adr-app", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Bind address (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Increase log verbosity
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = AdrConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.app.host = host;
    }
    if let Some(port) = args.port {
        config.app.port = port;
    }

    let registry = adr_recipes::default_registry(&config.recipe_paths)?;
    let client = ActiveDataClient::from_config(&config)?;
    let recipe_count = registry.len();
    let client = CachingQueryClient::wrap(Arc::new(client), &config.cache);
    let executor = Executor::new(Arc::new(registry), client);

    let addr = format!("{}:{}", config.app.host, config.app.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, recipes = recipe_count, backend = %config.url, "adr-app listening");

    axum::serve(listener, router(AppState::new(executor)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_logging(verbosity: u8) {
    let directive = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
