//! DECIMER Models
//!
//! Wrappers around the pre-trained models behind the image-to-SMILES service.
//!
//! - The structure classifier (EfficientNet-B0 on Candle) gates out images
//!   that do not depict a chemical structure.
//! - The SMILES predictor runs the exported DECIMER graphs on ONNX Runtime
//!   and decodes their token output.
//! - [`RecognitionEngine`] chains the two and doubles as the no-server call path.
//!
//! Both model types sit behind traits so the service can be exercised without
//! the real weights.

pub mod classifier;
pub mod config;
pub mod efficientnet;
pub mod engine;
pub mod model_loader;
pub mod onnx;
pub mod predictor;
pub mod preprocess;
pub mod vocabulary;

pub use classifier::{GateDecision, StructureClassifier, DEFAULT_THRESHOLD};
pub use config::{ClassifierSpec, DeviceSpec, ModelSourceSpec, ModelsConfig, PredictorConfig};
pub use efficientnet::EfficientNetClassifier;
pub use engine::{Recognition, RecognitionEngine};
pub use model_loader::{DeviceType, ModelSource};
pub use onnx::OnnxSmilesPredictor;
pub use predictor::{ModelVariant, SmilesPredictor};
pub use vocabulary::Vocabulary;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::StructureClassifier;
    pub use crate::engine::{Recognition, RecognitionEngine};
    pub use crate::predictor::SmilesPredictor;
    pub use decimer_core::RecognitionOptions;
}
