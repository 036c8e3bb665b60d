use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "decimer-server")]
#[command(
    author,
    version,
    about = "DECIMER image-to-SMILES service"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),

    /// Recognize images directly, without a server
    Predict {
        /// Image files to recognize
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Configuration file path (only the `models` section is used)
        #[arg(short, long, default_value = "decimer.yaml", env = "DECIMER_CONFIG")]
        config: String,

        /// Use the hand-drawn model
        #[arg(long)]
        hand_drawn: bool,

        /// Skip the structure classifier
        #[arg(long)]
        no_classify: bool,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "decimer.yaml", env = "DECIMER_CONFIG")]
    pub config: String,

    /// Listen address
    #[arg(short = 'l', long, env = "DECIMER_LISTEN")]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "DECIMER_PORT")]
    pub port: Option<u16>,

    /// Classifier threshold; scores below it count as structures
    #[arg(short, long, env = "DECIMER_THRESHOLD")]
    pub threshold: Option<f32>,

    /// Reject EMF uploads instead of converting them
    #[arg(long)]
    pub no_conversion: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
