//! Configuration for the predictor and classifier models

use crate::classifier::DEFAULT_THRESHOLD;
use crate::model_loader::{default_cache_dir, DeviceType, ModelSource};
use decimer_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for all models used by a recognition engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// DECIMER predictor graphs and vocabulary
    #[serde(default)]
    pub predictor: PredictorConfig,

    /// Structure classifier; recognition runs ungated when absent
    #[serde(default)]
    pub classifier: Option<ClassifierSpec>,

    /// Model cache directory for Hugging Face downloads
    #[serde(default)]
    pub models_dir: Option<PathBuf>,
}

/// DECIMER predictor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Graph for rendered depictions
    pub default: Option<ModelSourceSpec>,

    /// Graph for hand-drawn structures
    pub hand_drawn: Option<ModelSourceSpec>,

    /// Vocabulary JSON (index_word + rewrite rules)
    pub vocabulary: Option<PathBuf>,

    /// ONNX Runtime intra-op threads, defaults to the CPU count
    pub intra_threads: Option<usize>,
}

/// Structure classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSpec {
    /// EfficientNet-B0 safetensors weights
    #[serde(flatten)]
    pub source: ModelSourceSpec,

    /// Device override
    #[serde(default)]
    pub device: DeviceSpec,

    /// Scores below this value are treated as chemical structures
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

/// Model source specification (for config files)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelSourceSpec {
    /// Local file path
    Local { path: PathBuf },

    /// Hugging Face Hub
    HuggingFace {
        repo_id: String,
        filename: String,
        revision: Option<String>,
    },
}

/// Device specification (for config files)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceSpec {
    #[default]
    Cpu,
    Cuda { index: Option<usize> },
    Metal { index: Option<usize> },
}

impl ModelsConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::config(e.to_string()))
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Directory downloaded models are cached in
    pub fn cache_dir(&self) -> PathBuf {
        self.models_dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Threshold of the configured classifier, or the default
    pub fn threshold(&self) -> f32 {
        self.classifier
            .as_ref()
            .map_or(DEFAULT_THRESHOLD, |c| c.threshold)
    }

    /// Check that everything a predictor needs is present
    pub fn validate(&self) -> Result<()> {
        if self.predictor.default.is_none() {
            return Err(Error::config("predictor.default model is not configured"));
        }
        if self.predictor.vocabulary.is_none() {
            return Err(Error::config("predictor.vocabulary is not configured"));
        }
        if let Some(classifier) = &self.classifier {
            if !(0.0..=1.0).contains(&classifier.threshold) {
                return Err(Error::config(format!(
                    "classifier.threshold must be within [0, 1], got {}",
                    classifier.threshold
                )));
            }
        }
        Ok(())
    }
}

impl ModelSourceSpec {
    /// Convert to the runtime source
    pub fn to_source(&self) -> ModelSource {
        match self {
            Self::Local { path } => ModelSource::LocalPath(path.clone()),
            Self::HuggingFace {
                repo_id,
                filename,
                revision,
            } => ModelSource::HuggingFace {
                repo_id: repo_id.clone(),
                revision: revision.clone(),
                filename: filename.clone(),
            },
        }
    }
}

impl DeviceSpec {
    /// Convert to DeviceType
    pub fn to_device_type(&self) -> DeviceType {
        match self {
            DeviceSpec::Cpu => DeviceType::Cpu,
            DeviceSpec::Cuda { index } => DeviceType::Cuda(index.unwrap_or(0)),
            DeviceSpec::Metal { index } => DeviceType::Metal(index.unwrap_or(0)),
        }
    }
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}
