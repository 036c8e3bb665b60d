//! Client error types

use thiserror::Error;

/// Errors returned by [`crate::DecimerApi`]
#[derive(Debug, Error)]
pub enum ClientError {
    /// Base64 payload exceeds what the service accepts
    #[error("encoded image is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    /// Not a JPEG, PNG or GIF (or EMF when enabled)
    #[error("invalid image type '{0}'; only JPG, PNG and GIF are supported")]
    InvalidImageType(String),

    /// Non-200 reply from the service
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
