//! Structure classifier trait and common types

use async_trait::async_trait;
use decimer_core::Result;

/// Default decision threshold: scores below it are chemical structures
pub const DEFAULT_THRESHOLD: f32 = 0.3;

/// Trait for classifiers that decide whether an image depicts a chemical structure
#[async_trait]
pub trait StructureClassifier: Send + Sync {
    /// Score the encoded image bytes.
    ///
    /// Lower scores mean "more likely a chemical structure"; the score is a
    /// probability in `[0, 1]` that the image is *not* a structure.
    async fn score(&self, image: &[u8]) -> Result<f32>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Outcome of gating a single image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    /// Raw classifier score
    pub score: f32,

    /// Threshold it was compared against
    pub threshold: f32,
}

impl GateDecision {
    pub fn new(score: f32, threshold: f32) -> Self {
        Self { score, threshold }
    }

    /// Whether the image should be passed on to the predictor
    pub fn is_structure(&self) -> bool {
        self.score < self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_is_strictly_below_threshold() {
        assert!(GateDecision::new(0.05, DEFAULT_THRESHOLD).is_structure());
        assert!(!GateDecision::new(0.3, DEFAULT_THRESHOLD).is_structure());
        assert!(!GateDecision::new(0.99, DEFAULT_THRESHOLD).is_structure());
    }
}
