//! EfficientNet-B0 structure classifier running on Candle

use crate::classifier::StructureClassifier;
use crate::model_loader::{create_device, DeviceType};
use crate::preprocess::{classifier_input, CLASSIFIER_INPUT_SIZE};
use async_trait::async_trait;
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::efficientnet::{EfficientNet, MBConvConfig};
use decimer_core::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Single sigmoid output: probability that the image is not a structure
const NUM_OUTPUTS: usize = 1;

struct Inner {
    model: EfficientNet,
    device: Device,
}

impl Inner {
    fn forward(&self, image: &[u8]) -> Result<f32> {
        let data = classifier_input(image)?;
        let size = CLASSIFIER_INPUT_SIZE as usize;

        let input = Tensor::from_vec(data, (1, 3, size, size), &self.device)
            .map_err(|e| Error::classifier(format!("Failed to create input tensor: {}", e)))?;

        let logits = self
            .model
            .forward(&input)
            .map_err(|e| Error::classifier(format!("Model forward pass failed: {}", e)))?;

        let scores = candle_nn::ops::sigmoid(&logits)
            .and_then(|t| t.flatten_all())
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(|e| Error::classifier(format!("Failed to read classifier output: {}", e)))?;

        scores
            .first()
            .copied()
            .ok_or_else(|| Error::classifier("classifier returned no output"))
    }
}

/// Candle EfficientNet-B0 with a single-logit head
#[derive(Clone)]
pub struct EfficientNetClassifier {
    name: String,
    inner: Arc<Inner>,
}

impl EfficientNetClassifier {
    /// Load safetensors weights onto the given device
    pub fn load(weights: impl AsRef<Path>, device: DeviceType) -> Result<Self> {
        let weights = weights.as_ref();
        let device = create_device(device)?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device).map_err(|e| {
                Error::classifier(format!("Failed to load weights: {}", e))
            })?
        };

        let model = EfficientNet::new(vb, MBConvConfig::b0(), NUM_OUTPUTS)
            .map_err(|e| Error::classifier(format!("Failed to build EfficientNet-B0: {}", e)))?;

        let name = weights
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("efficientnet-b0")
            .to_string();

        tracing::info!("Loaded structure classifier '{}' from {}", name, weights.display());

        Ok(Self {
            name,
            inner: Arc::new(Inner { model, device }),
        })
    }
}

#[async_trait]
impl StructureClassifier for EfficientNetClassifier {
    async fn score(&self, image: &[u8]) -> Result<f32> {
        let start = Instant::now();
        let inner = Arc::clone(&self.inner);
        let image = image.to_vec();

        let score = tokio::task::spawn_blocking(move || inner.forward(&image))
            .await
            .map_err(|e| Error::internal(format!("classifier task failed: {}", e)))??;

        tracing::debug!(
            classifier = %self.name,
            score,
            latency_us = start.elapsed().as_micros() as u64,
            "classified image"
        );
        Ok(score)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
