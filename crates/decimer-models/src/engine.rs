//! Recognition engine: classifier gate followed by SMILES prediction
//!
//! This is also the direct call path; it needs no server and accepts
//! image bytes or a file path.

use crate::classifier::{GateDecision, StructureClassifier, DEFAULT_THRESHOLD};
use crate::config::ModelsConfig;
use crate::efficientnet::EfficientNetClassifier;
use crate::model_loader::resolve_model_path;
use crate::onnx::OnnxSmilesPredictor;
use crate::predictor::SmilesPredictor;
use decimer_core::{Error, RecognitionOptions, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a single recognition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Recognition {
    /// The predictor produced a SMILES string
    Smiles {
        smiles: String,
        /// Classifier score, when the gate ran
        score: Option<f32>,
    },

    /// The classifier rejected the image
    NotAStructure { score: f32 },

    /// The predictor ran but its output could not be decoded
    Undecodable,
}

impl Recognition {
    /// Collapse to the plain "SMILES or nothing" answer
    pub fn into_smiles(self) -> Option<String> {
        match self {
            Self::Smiles { smiles, .. } => Some(smiles),
            Self::NotAStructure { .. } | Self::Undecodable => None,
        }
    }

    /// Short label used for metrics and logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Smiles { .. } => "smiles",
            Self::NotAStructure { .. } => "not_a_structure",
            Self::Undecodable => "undecodable",
        }
    }
}

/// Classifier gate plus predictor
#[derive(Clone)]
pub struct RecognitionEngine {
    predictor: Arc<dyn SmilesPredictor>,
    classifier: Option<Arc<dyn StructureClassifier>>,
    threshold: f32,
}

impl RecognitionEngine {
    /// Create an engine without a classifier
    pub fn new(predictor: Arc<dyn SmilesPredictor>) -> Self {
        Self {
            predictor,
            classifier: None,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Attach a structure classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn StructureClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Set the classifier threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Load every configured model.
    ///
    /// Model files are resolved (and downloaded) on a blocking thread.
    pub async fn from_config(config: ModelsConfig) -> Result<Self> {
        config.validate()?;

        tokio::task::spawn_blocking(move || Self::load_blocking(&config))
            .await
            .map_err(|e| Error::internal(format!("model loading task failed: {}", e)))?
    }

    fn load_blocking(config: &ModelsConfig) -> Result<Self> {
        let cache_dir = config.cache_dir();
        let predictor_config = &config.predictor;

        let default_spec = predictor_config
            .default
            .as_ref()
            .ok_or_else(|| Error::config("predictor.default model is not configured"))?;
        let vocabulary = predictor_config
            .vocabulary
            .as_ref()
            .ok_or_else(|| Error::config("predictor.vocabulary is not configured"))?;

        let default_path = resolve_model_path(&default_spec.to_source(), Some(&cache_dir))?;
        let hand_drawn_path = predictor_config
            .hand_drawn
            .as_ref()
            .map(|spec| resolve_model_path(&spec.to_source(), Some(&cache_dir)))
            .transpose()?;

        let predictor = OnnxSmilesPredictor::load(
            &default_path,
            hand_drawn_path.as_deref(),
            vocabulary,
            predictor_config.intra_threads,
        )?;

        let mut engine = Self::new(Arc::new(predictor)).with_threshold(config.threshold());

        match &config.classifier {
            Some(spec) => {
                let weights = resolve_model_path(&spec.source.to_source(), Some(&cache_dir))?;
                let classifier =
                    EfficientNetClassifier::load(&weights, spec.device.to_device_type())?;
                engine = engine.with_classifier(Arc::new(classifier));
            }
            None => info!("No structure classifier configured, images will not be gated"),
        }

        Ok(engine)
    }

    /// Recognize the structure depicted in encoded image bytes
    pub async fn recognize(&self, image: &[u8], options: RecognitionOptions) -> Result<Recognition> {
        let mut score = None;

        if options.classify_image {
            match &self.classifier {
                Some(classifier) => {
                    let decision = GateDecision::new(classifier.score(image).await?, self.threshold);
                    debug!(
                        classifier = classifier.name(),
                        score = decision.score,
                        threshold = decision.threshold,
                        "classifier gate"
                    );
                    if !decision.is_structure() {
                        return Ok(Recognition::NotAStructure {
                            score: decision.score,
                        });
                    }
                    score = Some(decision.score);
                }
                None => warn!("Classification requested but no classifier is loaded, skipping gate"),
            }
        }

        let recognition = match self.predictor.predict(image, options.hand_drawn).await? {
            Some(smiles) => Recognition::Smiles { smiles, score },
            None => Recognition::Undecodable,
        };
        Ok(recognition)
    }

    /// Recognize the structure in an image file.
    ///
    /// The file is passed through as is: no size limit and no container check.
    pub async fn recognize_path(
        &self,
        path: impl AsRef<Path>,
        options: RecognitionOptions,
    ) -> Result<Recognition> {
        let image = tokio::fs::read(path.as_ref()).await?;
        self.recognize(&image, options).await
    }

    /// Direct-call helper returning only the SMILES string
    pub async fn predict_smiles(
        &self,
        path: impl AsRef<Path>,
        options: RecognitionOptions,
    ) -> Result<Option<String>> {
        Ok(self.recognize_path(path, options).await?.into_smiles())
    }
}
