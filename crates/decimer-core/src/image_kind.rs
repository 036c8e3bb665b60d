//! Image container sniffing
//!
//! Only the leading bytes of a payload are inspected; nothing is decoded here.

use crate::error::{Error, Result};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// EMR_HEADER record type that opens every EMF file
const EMF_HEADER_RECORD: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// " EMF" signature stored in the header record
const EMF_SIGNATURE: &[u8; 4] = b" EMF";

/// Offset of the signature inside the header record
const EMF_SIGNATURE_OFFSET: usize = 40;

/// Image containers the service knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    /// Windows enhanced metafile, must be rasterized before inference
    Emf,
}

impl ImageKind {
    /// Detect the container from the payload's magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if is_emf(bytes) {
            return Some(Self::Emf);
        }

        match image::guess_format(bytes).ok()? {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Gif => Some(Self::Gif),
            _ => None,
        }
    }

    /// Like [`ImageKind::sniff`], but unsupported payloads become an error
    pub fn detect(bytes: &[u8]) -> Result<Self> {
        Self::sniff(bytes).ok_or_else(|| {
            let described = image::guess_format(bytes)
                .map(|f| format!("{:?}", f).to_lowercase())
                .unwrap_or_else(|_| "unknown".to_string());
            Error::unsupported_image(described)
        })
    }

    /// Whether the model runtime can decode this container directly
    pub fn is_raster(&self) -> bool {
        !matches!(self, Self::Emf)
    }

    /// File suffix used when the payload has to touch the filesystem
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Emf => "emf",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Emf => "emf",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_emf(bytes: &[u8]) -> bool {
    bytes.len() >= EMF_SIGNATURE_OFFSET + EMF_SIGNATURE.len()
        && bytes[..4] == EMF_HEADER_RECORD
        && &bytes[EMF_SIGNATURE_OFFSET..EMF_SIGNATURE_OFFSET + 4] == EMF_SIGNATURE
}
