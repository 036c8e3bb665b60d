//! Client tests against an in-process service with mock models

use async_trait::async_trait;
use decimer_client::{ClientError, DecimerApi, ServerStatus};
use decimer_core::Result;
use decimer_models::{RecognitionEngine, SmilesPredictor, StructureClassifier};
use decimer_server::{create_router, AppState, ServerConfig};
use std::io::{Cursor, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

struct FixedClassifier(f32);

#[async_trait]
impl StructureClassifier for FixedClassifier {
    async fn score(&self, _image: &[u8]) -> Result<f32> {
        Ok(self.0)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

struct EchoPredictor {
    smiles: Option<String>,
    hand_drawn: Mutex<Vec<bool>>,
}

impl EchoPredictor {
    fn new(smiles: Option<&str>) -> Self {
        Self {
            smiles: smiles.map(str::to_string),
            hand_drawn: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SmilesPredictor for EchoPredictor {
    async fn predict(&self, _image: &[u8], hand_drawn: bool) -> Result<Option<String>> {
        self.hand_drawn.lock().unwrap().push(hand_drawn);
        Ok(self.smiles.clone())
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Bind the service to an ephemeral port and return its address
async fn spawn_server(predictor: Arc<EchoPredictor>, score: f32) -> SocketAddr {
    let mut config = ServerConfig::default();
    config.conversion.enabled = false;

    let engine = RecognitionEngine::new(predictor).with_classifier(Arc::new(FixedClassifier(score)));
    let app = create_router(AppState::new(config, engine));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(16, 16, image::Rgb([255, 255, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn api_for(addr: SocketAddr) -> DecimerApi {
    DecimerApi::new(&addr.ip().to_string(), addr.port()).unwrap()
}

#[tokio::test]
async fn test_server_status() {
    let addr = spawn_server(Arc::new(EchoPredictor::new(Some("C"))), 0.1).await;
    assert_eq!(api_for(addr).server_status().await, ServerStatus::Running);
}

#[tokio::test]
async fn test_server_not_running() {
    // Grab a free port, then release it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let api = DecimerApi::new("127.0.0.1", port).unwrap();
    assert_eq!(api.server_status().await, ServerStatus::NotRunning);
}

#[tokio::test]
async fn test_predict_from_file() {
    let predictor = Arc::new(EchoPredictor::new(Some("c1ccccc1")));
    let addr = spawn_server(predictor.clone(), 0.1).await;

    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(&png_bytes()).unwrap();

    let smiles = api_for(addr)
        .call_image2smiles(file.path(), true, true)
        .await
        .unwrap();
    assert_eq!(smiles.as_deref(), Some("c1ccccc1"));
    assert_eq!(*predictor.hand_drawn.lock().unwrap(), vec![true]);
}

#[tokio::test]
async fn test_not_a_structure() {
    let addr = spawn_server(Arc::new(EchoPredictor::new(Some("CCO"))), 0.8).await;
    let smiles = api_for(addr)
        .call_image2smiles_bytes(&png_bytes(), false, true)
        .await
        .unwrap();
    assert_eq!(smiles, None);
}

#[tokio::test]
async fn test_classifier_skipped() {
    let addr = spawn_server(Arc::new(EchoPredictor::new(Some("CCO"))), 0.8).await;
    let smiles = api_for(addr)
        .call_image2smiles_bytes(&png_bytes(), false, false)
        .await
        .unwrap();
    assert_eq!(smiles.as_deref(), Some("CCO"));
}

#[tokio::test]
async fn test_server_error_message() {
    let addr = spawn_server(Arc::new(EchoPredictor::new(None)), 0.1).await;
    let err = api_for(addr)
        .call_image2smiles_bytes(&png_bytes(), false, true)
        .await
        .unwrap_err();
    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Image conversion error");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_emf_sent_when_enabled() {
    let addr = spawn_server(Arc::new(EchoPredictor::new(Some("C"))), 0.1).await;

    let mut emf = vec![0u8; 88];
    emf[0] = 1;
    emf[40..44].copy_from_slice(b" EMF");

    let err = api_for(addr)
        .call_image2smiles_bytes(&emf, false, true)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidImageType(_)));

    // Conversion is disabled on this server, so the request reaches it and fails there
    let err = api_for(addr)
        .with_emf(true)
        .call_image2smiles_bytes(&emf, false, true)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Server { status: 400, .. }));
}

#[tokio::test]
async fn test_missing_file() {
    let addr = spawn_server(Arc::new(EchoPredictor::new(Some("C"))), 0.1).await;
    let err = api_for(addr)
        .call_image2smiles("/definitely/not/here.png", false, true)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Io(_)));
}
