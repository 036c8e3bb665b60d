//! HTTP client for the image2smiles endpoint

use crate::error::{ClientError, Result};
use decimer_core::{encode_image, Error, ErrorBody, ImageKind, SmilesResponse};
use reqwest::StatusCode;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8099;

/// Largest base64 payload the service accepts
pub const MAX_ENCODED_BYTES: usize = 4 * 1024 * 1024;

/// Whether the service answered its status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Running,
    NotRunning,
}

impl ServerStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Client for a running image2smiles service
#[derive(Debug, Clone)]
pub struct DecimerApi {
    base_url: Url,
    http: reqwest::Client,
    allow_emf: bool,
}

impl DecimerApi {
    /// Client for `http://{host}:{port}/`
    pub fn new(host: &str, port: u16) -> Result<Self> {
        Self::from_url(&format!("http://{}:{}/", host, port))
    }

    /// Client for a full base URL such as `https://decimer.example.org/api/`
    pub fn from_url(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            allow_emf: false,
        })
    }

    /// Send EMF drawings as is and let the service rasterize them
    pub fn with_emf(mut self, allow_emf: bool) -> Self {
        self.allow_emf = allow_emf;
        self
    }

    /// Replace the HTTP client with one using a request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Probe the service root
    pub async fn server_status(&self) -> ServerStatus {
        match self.http.get(self.base_url.clone()).send().await {
            Ok(response) if response.status() == StatusCode::OK => ServerStatus::Running,
            Ok(response) => {
                warn!("Server at {} answered {}", self.base_url, response.status());
                ServerStatus::NotRunning
            }
            Err(e) => {
                debug!("Server at {} unreachable: {}", self.base_url, e);
                ServerStatus::NotRunning
            }
        }
    }

    /// Recognize the structure in an image file.
    ///
    /// `Ok(None)` means the service judged the image not to be a chemical structure.
    pub async fn call_image2smiles(
        &self,
        path: impl AsRef<Path>,
        hand_drawn: bool,
        classify_image: bool,
    ) -> Result<Option<String>> {
        let image = tokio::fs::read(path.as_ref()).await.map_err(|e| {
            warn!("Failed to read {}: {}", path.as_ref().display(), e);
            e
        })?;
        self.call_image2smiles_bytes(&image, hand_drawn, classify_image)
            .await
    }

    /// Recognize the structure in an in-memory image
    pub async fn call_image2smiles_bytes(
        &self,
        image: &[u8],
        hand_drawn: bool,
        classify_image: bool,
    ) -> Result<Option<String>> {
        let encoded = encode_image(image);
        if encoded.len() > MAX_ENCODED_BYTES {
            warn!("Encoded image is {} bytes, too large to send", encoded.len());
            return Err(ClientError::TooLarge {
                size: encoded.len(),
                limit: MAX_ENCODED_BYTES,
            });
        }

        self.check_kind(image)?;

        let url = self.base_url.join("image2smiles/")?;
        let form = [
            ("encoded_image", encoded.as_str()),
            ("is_hand_drawn", form_bool(hand_drawn)),
            ("classify_image", form_bool(classify_image)),
        ];

        let response = self.http.post(url).form(&form).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|body| body.message)
                .unwrap_or(body);
            warn!("image2smiles failed with {}: {}", status, message);
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let reply: SmilesResponse = response.json().await?;
        Ok(reply.smiles)
    }

    fn check_kind(&self, image: &[u8]) -> Result<ImageKind> {
        match ImageKind::detect(image) {
            Ok(ImageKind::Emf) if !self.allow_emf => {
                warn!("EMF images are not sent unless enabled");
                Err(ClientError::InvalidImageType(ImageKind::Emf.to_string()))
            }
            Ok(kind) => Ok(kind),
            Err(Error::UnsupportedImage(name)) => {
                warn!("Invalid image type '{}'", name);
                Err(ClientError::InvalidImageType(name))
            }
            Err(e) => Err(ClientError::InvalidImageType(e.to_string())),
        }
    }
}

fn form_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn test_base_url() {
        let api = DecimerApi::new(DEFAULT_HOST, DEFAULT_PORT).unwrap();
        assert_eq!(api.base_url().as_str(), "http://localhost:8099/");
        assert_eq!(
            api.base_url().join("image2smiles/").unwrap().as_str(),
            "http://localhost:8099/image2smiles/"
        );
    }

    #[test]
    fn test_from_url_keeps_prefix() {
        let api = DecimerApi::from_url("https://example.org/decimer").unwrap();
        assert_eq!(
            api.base_url().join("image2smiles/").unwrap().as_str(),
            "https://example.org/decimer/image2smiles/"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            DecimerApi::from_url("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_emf_gated() {
        let mut emf = vec![0u8; 64];
        emf[0] = 1;
        emf[40..44].copy_from_slice(b" EMF");

        let api = DecimerApi::new(DEFAULT_HOST, DEFAULT_PORT).unwrap();
        assert!(matches!(
            api.check_kind(&emf),
            Err(ClientError::InvalidImageType(_))
        ));
        assert_eq!(api.with_emf(true).check_kind(&emf).unwrap(), ImageKind::Emf);
    }

    #[test]
    fn test_kind_check() {
        let api = DecimerApi::new(DEFAULT_HOST, DEFAULT_PORT).unwrap();
        assert_eq!(api.check_kind(PNG_MAGIC).unwrap(), ImageKind::Png);
        assert!(matches!(
            api.check_kind(b"plain text"),
            Err(ClientError::InvalidImageType(_))
        ));
    }

    #[tokio::test]
    async fn test_too_large_rejected_before_sending() {
        let api = DecimerApi::new("127.0.0.1", 9).unwrap();
        let mut image = PNG_MAGIC.to_vec();
        image.resize(MAX_ENCODED_BYTES, 0);
        let err = api.call_image2smiles_bytes(&image, false, true).await.unwrap_err();
        assert!(matches!(err, ClientError::TooLarge { .. }));
    }
}
