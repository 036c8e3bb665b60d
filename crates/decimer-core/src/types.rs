//! Shared request options and wire types

use serde::{Deserialize, Serialize};

/// Greeting returned by the service root
pub const STATUS_MESSAGE: &str = "Image2smiles converter is up and running.";

/// Per-request switches for a recognition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionOptions {
    /// Use the model trained on hand-drawn structures
    #[serde(default)]
    pub hand_drawn: bool,

    /// Gate the image through the structure classifier first
    #[serde(default = "default_true")]
    pub classify_image: bool,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            hand_drawn: false,
            classify_image: true,
        }
    }
}

impl RecognitionOptions {
    pub fn hand_drawn(mut self, hand_drawn: bool) -> Self {
        self.hand_drawn = hand_drawn;
        self
    }

    pub fn classify(mut self, classify_image: bool) -> Self {
        self.classify_image = classify_image;
        self
    }
}

/// Successful recognition reply; `smiles` is null when the classifier
/// decided the image is not a chemical structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmilesResponse {
    pub smiles: Option<String>,
}

/// Body of every non-200 reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of the root status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    #[serde(rename = "Message")]
    pub message: String,
}

impl Default for StatusBody {
    fn default() -> Self {
        Self {
            message: STATUS_MESSAGE.to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}
