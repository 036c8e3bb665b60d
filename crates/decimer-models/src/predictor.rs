//! SMILES predictor trait

use async_trait::async_trait;
use decimer_core::Result;
use serde::{Deserialize, Serialize};

/// Which pre-trained DECIMER weights to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// Model trained on rendered depictions
    Default,
    /// Model fine-tuned on hand-drawn structures
    HandDrawn,
}

impl ModelVariant {
    pub fn for_request(hand_drawn: bool) -> Self {
        if hand_drawn {
            Self::HandDrawn
        } else {
            Self::Default
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::HandDrawn => "hand_drawn",
        }
    }
}

/// Trait for image-to-SMILES predictors
#[async_trait]
pub trait SmilesPredictor: Send + Sync {
    /// Predict the SMILES string depicted in the encoded image.
    ///
    /// `Ok(None)` means the model ran but its token output could not be
    /// decoded into SMILES. `Err` is reserved for runtime failures such as an
    /// unreadable image or a failed forward pass.
    async fn predict(&self, image: &[u8], hand_drawn: bool) -> Result<Option<String>>;

    /// Get the predictor name
    fn name(&self) -> &str;
}
