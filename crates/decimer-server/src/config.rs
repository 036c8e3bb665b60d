//! Server configuration

use crate::cli::ServeArgs;
use decimer_models::ModelsConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest decoded image accepted, in bytes
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    /// Largest request body accepted, in bytes (form encoding inflates base64)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Predictor and classifier models
    #[serde(default)]
    pub models: ModelsConfig,

    /// EMF rasterization
    #[serde(default)]
    pub conversion: ConversionConfig,
}

impl ServerConfig {
    /// Load configuration from file, falling back to defaults when it does not exist
    pub fn from_path(config_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            tracing::warn!(
                "Config file {} not found, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, args: &ServeArgs) -> anyhow::Result<Self> {
        let mut config = Self::from_path(config_path)?;

        // Apply CLI overrides
        if let Some(listen) = &args.listen {
            config.listen = listen.clone();
        }

        if let Some(port) = args.port {
            config.port = port;
        }

        if let Some(threshold) = args.threshold {
            match config.models.classifier.as_mut() {
                Some(classifier) => classifier.threshold = threshold,
                None => tracing::warn!("--threshold given but no classifier is configured"),
            }
        }

        if args.no_conversion {
            config.conversion.enabled = false;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Bind the listen address; accepts IPv4, IPv6 and host names
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind((self.listen.as_str(), self.port)).await
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            max_image_bytes: default_max_image_bytes(),
            max_body_bytes: default_max_body_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
            models: ModelsConfig::default(),
            conversion: ConversionConfig::default(),
        }
    }
}

/// External EMF-to-PNG conversion tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Accept EMF uploads at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Executable to run
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments; `{input}` and `{output}` are replaced with file paths
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Kill the tool after this many seconds
    #[serde(default = "default_conversion_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_program(),
            args: default_args(),
            timeout_secs: default_conversion_timeout_secs(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8099
}

// 4 MiB of base64 decodes to 3 MiB
fn default_max_image_bytes() -> usize {
    3 * 1024 * 1024
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_program() -> String {
    "magick".to_string()
}

fn default_args() -> Vec<String> {
    vec!["{input}".to_string(), "{output}".to_string()]
}

fn default_conversion_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}
