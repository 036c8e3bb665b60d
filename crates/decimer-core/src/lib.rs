//! DECIMER Core
//!
//! Types and utilities shared by the DECIMER service, client, and model crates.
//!
//! This crate provides:
//! - Error types and result handling
//! - Image container sniffing (JPEG, PNG, GIF, EMF)
//! - Base64 transport encoding
//! - Wire types for the image-to-SMILES endpoint

pub mod encoding;
pub mod error;
pub mod image_kind;
pub mod types;

pub use encoding::{decode_image, encode_image, encoded_len};
pub use error::{Error, Result};
pub use image_kind::ImageKind;
pub use types::{ErrorBody, RecognitionOptions, SmilesResponse, StatusBody, STATUS_MESSAGE};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image_kind::ImageKind;
    pub use crate::types::{RecognitionOptions, SmilesResponse};
}
