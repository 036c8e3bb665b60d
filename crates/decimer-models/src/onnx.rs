//! DECIMER predictor backed by ONNX Runtime
//!
//! Each variant is an exported graph that takes the preprocessed NHWC image and
//! runs the encoder and the full greedy decode, returning predicted token ids.

use crate::predictor::{ModelVariant, SmilesPredictor};
use crate::preprocess::decimer_input;
use crate::vocabulary::Vocabulary;
use async_trait::async_trait;
use decimer_core::{Error, Result};
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// One loaded graph with its tensor names
struct GraphSession {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    /// Optional per-token confidence output
    confidence_name: Option<String>,
    model_path: PathBuf,
}

impl std::fmt::Debug for GraphSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphSession")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("confidence_name", &self.confidence_name)
            .field("model_path", &self.model_path)
            .finish()
    }
}

impl GraphSession {
    fn load(model_path: &Path, intra_threads: usize) -> Result<Self> {
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(intra_threads))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| {
                Error::predictor(format!(
                    "failed to create ONNX session for {}: {}",
                    model_path.display(),
                    e
                ))
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| Error::predictor("model has no inputs"))?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| Error::predictor("model has no outputs"))?;
        let confidence_name = session.outputs.get(1).map(|o| o.name.clone());

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            confidence_name,
            model_path: model_path.to_path_buf(),
        })
    }

    /// Run the graph and return the predicted token ids of the first batch entry
    fn run(&self, input: &Array4<f32>) -> Result<Vec<i64>> {
        let tensor = TensorRef::from_array_view(input.view())
            .map_err(|e| Error::predictor(format!("Failed to convert input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::internal("Failed to acquire session lock"))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| {
                Error::predictor(format!(
                    "ONNX Runtime inference failed for {}: {}",
                    self.model_path.display(),
                    e
                ))
            })?;

        if let Some(name) = &self.confidence_name {
            if let Ok((_, confidences)) = outputs[name.as_str()].try_extract_tensor::<f32>() {
                if let Some(mean) = mean_confidence(confidences) {
                    tracing::debug!(mean_confidence = mean, "token confidences");
                }
            }
        }

        let output = &outputs[self.output_name.as_str()];
        if let Ok((_, ids)) = output.try_extract_tensor::<i64>() {
            return Ok(ids.to_vec());
        }
        let (_, ids) = output.try_extract_tensor::<i32>().map_err(|e| {
            Error::predictor(format!(
                "Output '{}' is not an integer token tensor: {}",
                self.output_name, e
            ))
        })?;
        Ok(ids.iter().map(|&id| id as i64).collect())
    }
}

/// Mean of the non-padding confidences; padded positions are reported as 0
fn mean_confidence(confidences: &[f32]) -> Option<f32> {
    let scored: Vec<f32> = confidences.iter().copied().filter(|&c| c > 0.0).collect();
    if scored.is_empty() {
        return None;
    }
    Some(scored.iter().sum::<f32>() / scored.len() as f32)
}

struct Inner {
    default: GraphSession,
    hand_drawn: Option<GraphSession>,
    vocabulary: Vocabulary,
}

impl Inner {
    fn graph(&self, variant: ModelVariant) -> Result<&GraphSession> {
        match variant {
            ModelVariant::Default => Ok(&self.default),
            ModelVariant::HandDrawn => self
                .hand_drawn
                .as_ref()
                .ok_or_else(|| Error::predictor("hand-drawn model is not configured")),
        }
    }

    fn predict(&self, image: &[u8], variant: ModelVariant) -> Result<Option<String>> {
        let graph = self.graph(variant)?;
        let input = decimer_input(image)?;
        let ids = graph.run(&input)?;

        match self.vocabulary.to_smiles(&ids) {
            Ok(smiles) => Ok(Some(smiles)),
            Err(Error::Decode(reason)) => {
                tracing::warn!(variant = variant.as_str(), %reason, "could not decode model output");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// DECIMER image-to-SMILES predictor over one or two ONNX graphs
#[derive(Clone)]
pub struct OnnxSmilesPredictor {
    inner: Arc<Inner>,
}

impl OnnxSmilesPredictor {
    /// Load the graphs and the vocabulary.
    ///
    /// `intra_threads` of `None` uses one thread per CPU.
    pub fn load(
        default: impl AsRef<Path>,
        hand_drawn: Option<&Path>,
        vocabulary: impl AsRef<Path>,
        intra_threads: Option<usize>,
    ) -> Result<Self> {
        let threads = intra_threads.unwrap_or_else(num_cpus::get).max(1);

        let default = GraphSession::load(default.as_ref(), threads)?;
        tracing::info!("Loaded DECIMER graph from {}", default.model_path.display());

        let hand_drawn = match hand_drawn {
            Some(path) => {
                let graph = GraphSession::load(path, threads)?;
                tracing::info!("Loaded hand-drawn DECIMER graph from {}", path.display());
                Some(graph)
            }
            None => {
                tracing::warn!("No hand-drawn model configured, hand-drawn requests will fail");
                None
            }
        };

        let vocabulary = Vocabulary::from_file(vocabulary)?;
        tracing::info!("Loaded vocabulary with {} tokens", vocabulary.len());

        Ok(Self {
            inner: Arc::new(Inner {
                default,
                hand_drawn,
                vocabulary,
            }),
        })
    }

    /// Whether a hand-drawn graph was loaded
    pub fn has_hand_drawn(&self) -> bool {
        self.inner.hand_drawn.is_some()
    }
}

#[async_trait]
impl SmilesPredictor for OnnxSmilesPredictor {
    async fn predict(&self, image: &[u8], hand_drawn: bool) -> Result<Option<String>> {
        let start = Instant::now();
        let variant = ModelVariant::for_request(hand_drawn);
        let inner = Arc::clone(&self.inner);
        let image = image.to_vec();

        let smiles = tokio::task::spawn_blocking(move || inner.predict(&image, variant))
            .await
            .map_err(|e| Error::internal(format!("predictor task failed: {}", e)))??;

        tracing::debug!(
            variant = variant.as_str(),
            decoded = smiles.is_some(),
            latency_ms = start.elapsed().as_millis() as u64,
            "predicted SMILES"
        );
        Ok(smiles)
    }

    fn name(&self) -> &str {
        "decimer-onnx"
    }
}
