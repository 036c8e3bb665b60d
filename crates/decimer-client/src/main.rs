//! DECIMER Client CLI
//!
//! Checks whether a service is up and sends images to it for recognition.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use decimer_client::{DecimerApi, ServerStatus, DEFAULT_HOST, DEFAULT_PORT};
use std::path::PathBuf;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "decimer-client")]
#[command(author, version, about = "Client for the DECIMER image-to-SMILES service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Target {
    /// Service host
    #[arg(long, default_value = DEFAULT_HOST, env = "DECIMER_HOST")]
    host: String,

    /// Service port
    #[arg(short = 'P', long, default_value_t = DEFAULT_PORT, env = "DECIMER_PORT")]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check whether the service is running
    Status {
        #[command(flatten)]
        target: Target,
    },

    /// Send images to the service and print their SMILES
    Predict {
        /// Image files (JPG, PNG, GIF)
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Use the hand-drawn model
        #[arg(long)]
        hand_drawn: bool,

        /// Skip the structure classifier
        #[arg(long)]
        no_classify: bool,

        /// Also send EMF drawings for server-side conversion
        #[arg(long)]
        emf: bool,

        #[command(flatten)]
        target: Target,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status { target } => {
            init_logging(target.verbose);
            let api = DecimerApi::new(&target.host, target.port)?;
            match api.server_status().await {
                ServerStatus::Running => println!("Server at {} is running", api.base_url()),
                ServerStatus::NotRunning => {
                    println!("Server at {} is not running", api.base_url());
                    std::process::exit(1);
                }
            }
        }

        Commands::Predict {
            images,
            hand_drawn,
            no_classify,
            emf,
            target,
        } => {
            init_logging(target.verbose);
            let api = DecimerApi::new(&target.host, target.port)?.with_emf(emf);

            for path in images {
                match api.call_image2smiles(&path, hand_drawn, !no_classify).await {
                    Ok(Some(smiles)) => println!("{}\t{}", path.display(), smiles),
                    Ok(None) => println!("{}\tNone", path.display()),
                    Err(e) => {
                        error!("{}: {}", path.display(), e);
                        println!("{}\tNone", path.display());
                    }
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "decimer_client=debug"
    } else {
        "decimer_client=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}
