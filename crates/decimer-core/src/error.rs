//! Error types for DECIMER

/// Result type alias using DECIMER's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for recognition operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Payload is not valid base64
    #[error("invalid base64 image payload: {0}")]
    InvalidBase64(String),

    /// Decoded payload is not a supported image container
    #[error("unsupported image type: {0}")]
    UnsupportedImage(String),

    /// Image exceeds the configured size limit
    #[error("image is {size} bytes, limit is {limit} bytes")]
    ImageTooLarge { size: usize, limit: usize },

    /// External raster conversion failed
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Structure classifier errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// SMILES predictor errors
    #[error("predictor error: {0}")]
    Predictor(String),

    /// Token output could not be turned into SMILES
    #[error("decode error: {0}")]
    Decode(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new base64 error
    pub fn invalid_base64(msg: impl Into<String>) -> Self {
        Self::InvalidBase64(msg.into())
    }

    /// Create a new unsupported image error
    pub fn unsupported_image(msg: impl Into<String>) -> Self {
        Self::UnsupportedImage(msg.into())
    }

    /// Create a new conversion error
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new predictor error
    pub fn predictor(msg: impl Into<String>) -> Self {
        Self::Predictor(msg.into())
    }

    /// Create a new decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short, stable label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidBase64(_) => "invalid_base64",
            Self::UnsupportedImage(_) => "unsupported_image",
            Self::ImageTooLarge { .. } => "image_too_large",
            Self::Conversion(_) => "conversion",
            Self::Classifier(_) => "classifier",
            Self::Predictor(_) => "predictor",
            Self::Decode(_) => "decode",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}
