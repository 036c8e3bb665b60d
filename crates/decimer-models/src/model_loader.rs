//! Model file resolution and device selection

use candle_core::Device;
use decimer_core::{Error, Result};
use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use std::path::{Path, PathBuf};

/// Source location for model weights
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Load from local file system
    LocalPath(PathBuf),

    /// Download from Hugging Face Hub
    HuggingFace {
        repo_id: String,
        revision: Option<String>,
        filename: String,
    },
}

impl ModelSource {
    /// Create a source from a local path
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::LocalPath(path.into())
    }

    /// Create a source from a Hugging Face repository file
    pub fn hf(repo_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::HuggingFace {
            repo_id: repo_id.into(),
            revision: None,
            filename: filename.into(),
        }
    }

    /// Set Hugging Face revision
    pub fn with_revision(self, revision: impl Into<String>) -> Self {
        match self {
            Self::HuggingFace {
                repo_id, filename, ..
            } => Self::HuggingFace {
                repo_id,
                revision: Some(revision.into()),
                filename,
            },
            local => local,
        }
    }

    /// Human-readable description for logs
    pub fn describe(&self) -> String {
        match self {
            Self::LocalPath(path) => path.display().to_string(),
            Self::HuggingFace {
                repo_id,
                revision,
                filename,
            } => format!(
                "hf://{}@{}/{}",
                repo_id,
                revision.as_deref().unwrap_or("main"),
                filename
            ),
        }
    }
}

/// Device type for Candle inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// CPU inference (always available)
    Cpu,
    /// CUDA GPU inference (if available)
    Cuda(usize), // GPU index
    /// Metal (Apple Silicon)
    Metal(usize),
}

/// Resolve a model source to a file on disk, downloading when needed.
///
/// Blocks on network IO for Hugging Face sources; call it from a blocking context.
pub fn resolve_model_path(source: &ModelSource, cache_dir: Option<&Path>) -> Result<PathBuf> {
    match source {
        ModelSource::LocalPath(path) => {
            if !path.exists() {
                return Err(Error::config(format!("Model file not found: {:?}", path)));
            }
            Ok(path.clone())
        }
        ModelSource::HuggingFace {
            repo_id,
            revision,
            filename,
        } => {
            let mut builder = ApiBuilder::new();
            if let Some(dir) = cache_dir {
                builder = builder.with_cache_dir(dir.to_path_buf());
            }
            let api = builder
                .build()
                .map_err(|e| Error::config(format!("Failed to initialize HF API: {}", e)))?;

            let repo = api.repo(Repo::with_revision(
                repo_id.clone(),
                RepoType::Model,
                revision.clone().unwrap_or_else(|| "main".to_string()),
            ));

            tracing::info!("Fetching {} from Hugging Face repo {}", filename, repo_id);
            repo.get(filename)
                .map_err(|e| Error::config(format!("Failed to download model from HF: {}", e)))
        }
    }
}

/// Create Candle device from device type
pub fn create_device(device_type: DeviceType) -> Result<Device> {
    match device_type {
        DeviceType::Cpu => Ok(Device::Cpu),
        DeviceType::Cuda(idx) => Device::new_cuda(idx)
            .map_err(|e| Error::classifier(format!("Failed to create CUDA device: {}", e))),
        DeviceType::Metal(idx) => Device::new_metal(idx)
            .map_err(|e| Error::classifier(format!("Failed to create Metal device: {}", e))),
    }
}

/// Default cache directory for downloaded models
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("decimer")
        .join("models")
}
