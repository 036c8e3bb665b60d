//! Mock models for testing
//!
//! Configurable implementations of the classifier and predictor traits used
//! to drive the recognition engine without real weights.

use async_trait::async_trait;
use decimer_core::{Error, RecognitionOptions, Result};
use decimer_models::{
    Recognition, RecognitionEngine, SmilesPredictor, StructureClassifier, DEFAULT_THRESHOLD,
};
use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// A classifier that returns a fixed score
pub struct MockClassifier {
    score: f32,
    call_count: AtomicU32,
}

impl MockClassifier {
    pub fn new(score: f32) -> Self {
        Self {
            score,
            call_count: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl StructureClassifier for MockClassifier {
    async fn score(&self, _image: &[u8]) -> Result<f32> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.score)
    }

    fn name(&self) -> &str {
        "mock-classifier"
    }
}

/// A predictor that records its calls and returns a configured answer
pub struct MockPredictor {
    smiles: Option<String>,
    fail: bool,
    calls: Mutex<Vec<(usize, bool)>>,
}

impl MockPredictor {
    pub fn returning(smiles: &str) -> Self {
        Self {
            smiles: Some(smiles.to_string()),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn undecodable() -> Self {
        Self {
            smiles: None,
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            smiles: None,
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// (image length, hand_drawn) for every call
    pub fn calls(&self) -> Vec<(usize, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmilesPredictor for MockPredictor {
    async fn predict(&self, image: &[u8], hand_drawn: bool) -> Result<Option<String>> {
        self.calls.lock().unwrap().push((image.len(), hand_drawn));
        if self.fail {
            return Err(Error::predictor("Simulated predictor failure"));
        }
        Ok(self.smiles.clone())
    }

    fn name(&self) -> &str {
        "mock-predictor"
    }
}

/// A classifier that always fails - for testing error paths
pub struct FailingClassifier;

#[async_trait]
impl StructureClassifier for FailingClassifier {
    async fn score(&self, _image: &[u8]) -> Result<f32> {
        Err(Error::classifier("Simulated classifier failure"))
    }

    fn name(&self) -> &str {
        "failing-classifier"
    }
}

const IMAGE: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

#[tokio::test]
async fn test_structure_passes_gate() {
    let predictor = Arc::new(MockPredictor::returning("CCO"));
    let classifier = Arc::new(MockClassifier::new(0.05));
    let engine = RecognitionEngine::new(predictor.clone()).with_classifier(classifier.clone());

    let result = engine.recognize(IMAGE, RecognitionOptions::default()).await.unwrap();

    assert_eq!(
        result,
        Recognition::Smiles {
            smiles: "CCO".to_string(),
            score: Some(0.05)
        }
    );
    assert_eq!(classifier.call_count(), 1);
    assert_eq!(predictor.calls(), vec![(IMAGE.len(), false)]);
}

#[tokio::test]
async fn test_non_structure_skips_predictor() {
    let predictor = Arc::new(MockPredictor::returning("CCO"));
    let engine = RecognitionEngine::new(predictor.clone())
        .with_classifier(Arc::new(MockClassifier::new(0.92)));

    let result = engine.recognize(IMAGE, RecognitionOptions::default()).await.unwrap();

    assert_eq!(result, Recognition::NotAStructure { score: 0.92 });
    assert_eq!(result.into_smiles(), None);
    assert!(predictor.calls().is_empty());
}

#[tokio::test]
async fn test_score_at_threshold_is_rejected() {
    let predictor = Arc::new(MockPredictor::returning("CCO"));
    let engine = RecognitionEngine::new(predictor.clone())
        .with_classifier(Arc::new(MockClassifier::new(DEFAULT_THRESHOLD)));

    let result = engine.recognize(IMAGE, RecognitionOptions::default()).await.unwrap();
    assert!(matches!(result, Recognition::NotAStructure { .. }));
}

#[tokio::test]
async fn test_custom_threshold() {
    let predictor = Arc::new(MockPredictor::returning("c1ccccc1"));
    let engine = RecognitionEngine::new(predictor)
        .with_classifier(Arc::new(MockClassifier::new(0.5)))
        .with_threshold(0.6);

    let result = engine.recognize(IMAGE, RecognitionOptions::default()).await.unwrap();
    assert_eq!(result.label(), "smiles");
}

#[tokio::test]
async fn test_classification_disabled() {
    let predictor = Arc::new(MockPredictor::returning("CCO"));
    let classifier = Arc::new(MockClassifier::new(0.99));
    let engine = RecognitionEngine::new(predictor).with_classifier(classifier.clone());

    let options = RecognitionOptions::default().classify(false).hand_drawn(true);
    let result = engine.recognize(IMAGE, options).await.unwrap();

    assert_eq!(
        result,
        Recognition::Smiles {
            smiles: "CCO".to_string(),
            score: None
        }
    );
    assert_eq!(classifier.call_count(), 0);
}

#[tokio::test]
async fn test_missing_classifier_skips_gate() {
    let engine = RecognitionEngine::new(Arc::new(MockPredictor::returning("CCO")));
    assert!(!engine.has_classifier());

    let result = engine.recognize(IMAGE, RecognitionOptions::default()).await.unwrap();
    assert_eq!(result.into_smiles().as_deref(), Some("CCO"));
}

#[tokio::test]
async fn test_hand_drawn_flag_reaches_predictor() {
    let predictor = Arc::new(MockPredictor::returning("CCO"));
    let engine = RecognitionEngine::new(predictor.clone());

    let options = RecognitionOptions::default().hand_drawn(true);
    engine.recognize(IMAGE, options).await.unwrap();

    assert_eq!(predictor.calls(), vec![(IMAGE.len(), true)]);
}

#[tokio::test]
async fn test_undecodable_output() {
    let engine = RecognitionEngine::new(Arc::new(MockPredictor::undecodable()));
    let result = engine.recognize(IMAGE, RecognitionOptions::default()).await.unwrap();
    assert_eq!(result, Recognition::Undecodable);
}

#[tokio::test]
async fn test_predictor_error_propagates() {
    let engine = RecognitionEngine::new(Arc::new(MockPredictor::failing()));
    let err = engine.recognize(IMAGE, RecognitionOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::Predictor(_)));
}

#[tokio::test]
async fn test_classifier_error_propagates() {
    let predictor = Arc::new(MockPredictor::returning("CCO"));
    let engine = RecognitionEngine::new(predictor.clone()).with_classifier(Arc::new(FailingClassifier));

    let err = engine.recognize(IMAGE, RecognitionOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::Classifier(_)));
    assert!(predictor.calls().is_empty());
}

#[tokio::test]
async fn test_predict_smiles_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(IMAGE).unwrap();

    let engine = RecognitionEngine::new(Arc::new(MockPredictor::returning("CC(=O)O")))
        .with_classifier(Arc::new(MockClassifier::new(0.1)));

    let smiles = engine
        .predict_smiles(file.path(), RecognitionOptions::default())
        .await
        .unwrap();
    assert_eq!(smiles.as_deref(), Some("CC(=O)O"));
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let engine = RecognitionEngine::new(Arc::new(MockPredictor::returning("C")));
    let err = engine
        .recognize_path("/nonexistent/structure.png", RecognitionOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[tokio::test]
async fn test_from_config_requires_predictor() {
    let err = RecognitionEngine::from_config(Default::default()).await.err().unwrap();
    assert!(matches!(err, Error::Config(_)));
}
