//! Application state shared across requests

use crate::config::ServerConfig;
use crate::conversion::EmfConverter;
use anyhow::Result;
use decimer_models::RecognitionEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::info;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Classifier gate plus predictor
    pub engine: Arc<RecognitionEngine>,

    /// EMF rasterizer, absent when conversion is disabled
    pub converter: Option<Arc<EmfConverter>>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Assemble state around an already built engine
    pub fn new(config: ServerConfig, engine: RecognitionEngine) -> Self {
        let converter = EmfConverter::from_config(&config.conversion).map(Arc::new);
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            converter,
            metrics_handle: None,
        }
    }

    /// Load every configured model and build the state
    pub async fn load(config: ServerConfig) -> Result<Self> {
        info!("Loading models");
        let engine = RecognitionEngine::from_config(config.models.clone()).await?;
        info!(
            classifier = engine.has_classifier(),
            threshold = engine.threshold(),
            "Models loaded"
        );

        let state = Self::new(config, engine);
        match &state.converter {
            Some(converter) => info!("EMF conversion via '{}'", converter.program()),
            None => info!("EMF conversion disabled"),
        }
        Ok(state)
    }

    /// Attach the Prometheus handle served on `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}
