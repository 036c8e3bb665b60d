//! DECIMER Server
//!
//! Serves image-to-SMILES recognition over HTTP, or runs it directly on
//! local files with the `predict` subcommand.

use anyhow::Result;
use clap::Parser;
use decimer_core::RecognitionOptions;
use decimer_models::RecognitionEngine;
use decimer_server::cli::{Cli, Commands, ServeArgs};
use decimer_server::{create_router, metrics, AppState, ServerConfig};
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Predict {
            images,
            config,
            hand_drawn,
            no_classify,
            verbose,
        } => {
            init_tracing(verbose);
            let options = RecognitionOptions::default()
                .hand_drawn(hand_drawn)
                .classify(!no_classify);
            predict(&config, images, options).await
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    init_tracing(args.verbose);

    info!("Starting DECIMER server");

    let config = ServerConfig::load(&args.config, &args)?;
    info!("Configuration loaded successfully");
    info!("Max image size: {} bytes", config.max_image_bytes);

    let metrics_handle = metrics::init_metrics()?;

    info!("Initializing application state...");
    let state = AppState::load(config).await?.with_metrics(metrics_handle);
    info!("Application state initialized successfully");

    let listener = state.config.bind().await?;
    info!("Listening on http://{}", listener.local_addr()?);

    let app = create_router(state);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Recognize local files without starting the service
async fn predict(config_path: &str, images: Vec<PathBuf>, options: RecognitionOptions) -> Result<()> {
    let config = ServerConfig::from_path(config_path)?;
    let engine = RecognitionEngine::from_config(config.models).await?;

    for path in images {
        match engine.predict_smiles(&path, options).await {
            Ok(Some(smiles)) => println!("{}\t{}", path.display(), smiles),
            Ok(None) => println!("{}\tNone", path.display()),
            Err(e) => {
                error!("{}: {}", path.display(), e);
                println!("{}\tNone", path.display());
            }
        }
    }

    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("decimer=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("decimer=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
