//! BioGuard diagnostics server binary.
//!
//! Loads the properties configuration, wires the stores through the router,
//! and serves FASTA-framed requests over TLS until SIGINT or SIGTERM.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bioguard_server::assembly::{self, StoragePaths};
use bioguard_server::config::{ServerConfig, KEYSTORE_PASSWORD, KEYSTORE_PATH};
use bioguard_server::transport;
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// BioGuard diagnostics server.
#[derive(Parser, Debug)]
#[command(name = "bioguard-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the properties configuration file
    #[arg(short, long, default_value = "application.properties")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_file(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?;

    let paths = StoragePaths::from_config(&config)?;
    let router = assembly::build_router(&paths)?;

    let port = config.port()?;
    let keystore_path = PathBuf::from(config.require(KEYSTORE_PATH)?);
    let keystore_password = config.require(KEYSTORE_PASSWORD)?.to_owned();
    let acceptor = transport::build_acceptor(&keystore_path, &keystore_password)?;

    info!(
        port,
        config = %args.config.display(),
        "bioguard server starting"
    );

    tokio::select! {
        result = transport::run(port, acceptor, router) => result,
        () = shutdown_signal() => {
            info!("shutdown signal received, stopping server");
            Ok(())
        }
    }
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to register SIGTERM handler");
                std::future::pending::<()>().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
