//! HTTP routes and handlers

use axum::{
    error_handling::HandleErrorLayer,
    extract::{rejection::FormRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use decimer_core::{
    decode_image, Error, ErrorBody, ImageKind, RecognitionOptions, SmilesResponse, StatusBody,
};
use decimer_models::Recognition;
use serde::{Deserialize, Deserializer};
use std::time::Instant;
use tower::{timeout::error::Elapsed, BoxError, ServiceBuilder};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::metrics;
use crate::state::AppState;

pub const INVALID_BASE64_MESSAGE: &str = "Invalid base64 image payload";
pub const INVALID_TYPE_MESSAGE: &str = "Invalid image type. Only JPG, PNG, GIF and EMF are supported.";
pub const UNDECODABLE_IMAGE_MESSAGE: &str = "Image could not be decoded";
pub const CONVERSION_ERROR_MESSAGE: &str = "Image conversion error";
pub const GENERAL_ERROR_MESSAGE: &str = "An unspecified general error in image2smiles API occurred.";
pub const TIMEOUT_MESSAGE: &str = "Request timed out";

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;
    let timeout = state.config.request_timeout();

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/image2smiles/", post(image_to_smiles))
        .route("/image2smiles", post(image_to_smiles))
        .fallback(fallback)
        // Oversized bodies surface as a FormRejection and get the JSON error body
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(timeout),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<StatusBody> {
    Json(StatusBody::default())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics exporter not installed").into_response(),
    }
}

/// Form body of the recognition endpoint
#[derive(Debug, Deserialize)]
pub struct Image2SmilesForm {
    /// Base64 encoded image
    pub encoded_image: String,

    #[serde(default, deserialize_with = "form_bool")]
    pub is_hand_drawn: bool,

    #[serde(default = "default_true", deserialize_with = "form_bool")]
    pub classify_image: bool,
}

impl Image2SmilesForm {
    fn options(&self) -> RecognitionOptions {
        RecognitionOptions {
            hand_drawn: self.is_hand_drawn,
            classify_image: self.classify_image,
        }
    }
}

/// Main recognition handler
async fn image_to_smiles(
    State(state): State<AppState>,
    form: Result<Form<Image2SmilesForm>, FormRejection>,
) -> Result<Json<SmilesResponse>, AppError> {
    let request_id = Uuid::new_v4();
    metrics::record_request();

    let Form(form) = form.map_err(|rejection| {
        warn!(%request_id, "Rejected form body: {}", rejection.body_text());
        AppError::rejected(rejection.status(), rejection.body_text())
    })?;

    let image = decode_image(&form.encoded_image).map_err(|e| {
        debug!(%request_id, "{}", e);
        AppError::from(e)
    })?;

    if image.len() > state.config.max_image_bytes {
        return Err(Error::ImageTooLarge {
            size: image.len(),
            limit: state.config.max_image_bytes,
        }
        .into());
    }

    let kind = ImageKind::detect(&image)?;
    info!(
        %request_id,
        kind = %kind,
        bytes = image.len(),
        hand_drawn = form.is_hand_drawn,
        classify = form.classify_image,
        "Received image2smiles request"
    );

    let image = match kind {
        ImageKind::Emf => rasterize(&state, &image).await?,
        _ => image,
    };

    let start = Instant::now();
    let recognition = state
        .engine
        .recognize(&image, form.options())
        .await
        .map_err(|e| match e {
            // The container sniffed fine but the pixels would not decode
            Error::UnsupportedImage(_) => {
                warn!(%request_id, "{}", e);
                metrics::record_error(e.kind());
                AppError::BadRequest(UNDECODABLE_IMAGE_MESSAGE.to_string())
            }
            e => {
                error!(%request_id, "Recognition failed: {}", e);
                AppError::from(e)
            }
        })?;
    metrics::record_outcome(recognition.label(), start.elapsed());

    info!(
        %request_id,
        outcome = recognition.label(),
        latency_ms = start.elapsed().as_millis() as u64,
        "Recognition complete"
    );

    match recognition {
        Recognition::Smiles { smiles, .. } => Ok(Json(SmilesResponse {
            smiles: Some(smiles),
        })),
        Recognition::NotAStructure { .. } => Ok(Json(SmilesResponse { smiles: None })),
        Recognition::Undecodable => Err(AppError::undecodable_output()),
    }
}

async fn rasterize(state: &AppState, emf: &[u8]) -> Result<Vec<u8>, AppError> {
    let converter = state
        .converter
        .as_ref()
        .ok_or_else(|| Error::conversion("EMF conversion is disabled"))?;
    Ok(converter.convert(emf).await?)
}

async fn fallback() -> AppError {
    AppError::NotFound
}

async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        warn!("Request timed out");
        metrics::record_error("timeout");
        AppError::Timeout
    } else {
        error!("Unhandled middleware error: {}", err);
        metrics::record_error("internal");
        AppError::Internal
    }
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    PayloadTooLarge(String),
    Rejected(StatusCode, String),
    Timeout,
    NotFound,
    Internal,
}

impl AppError {
    /// Form extraction failed (missing field, bad bool, body over the limit)
    pub fn rejected(status: StatusCode, message: String) -> Self {
        metrics::record_error("form_rejected");
        AppError::Rejected(status, message)
    }

    /// The model ran but its tokens did not form a SMILES string
    pub fn undecodable_output() -> Self {
        metrics::record_error("undecodable_output");
        AppError::BadRequest(CONVERSION_ERROR_MESSAGE.to_string())
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        metrics::record_error(err.kind());
        match err {
            Error::InvalidBase64(_) => AppError::BadRequest(INVALID_BASE64_MESSAGE.to_string()),
            Error::UnsupportedImage(_) => AppError::BadRequest(INVALID_TYPE_MESSAGE.to_string()),
            Error::ImageTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            Error::Conversion(msg) => AppError::BadRequest(format!("EMF conversion failed: {}", msg)),
            _ => AppError::Internal,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Rejected(status, msg) => (status, msg),
            AppError::Timeout => (StatusCode::REQUEST_TIMEOUT, TIMEOUT_MESSAGE.to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERAL_ERROR_MESSAGE.to_string(),
            ),
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}

/// Parse HTML-form style booleans
fn parse_form_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn form_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_form_bool(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid boolean '{}'", value)))
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_form_bool() {
        for v in ["true", "True", "1", "yes", "ON"] {
            assert_eq!(parse_form_bool(v), Some(true), "{}", v);
        }
        for v in ["false", "FALSE", "0", "no", "off"] {
            assert_eq!(parse_form_bool(v), Some(false), "{}", v);
        }
        assert_eq!(parse_form_bool("maybe"), None);
    }

    #[test]
    fn test_error_mapping() {
        let err = AppError::from(Error::invalid_base64("bad"));
        assert!(matches!(err, AppError::BadRequest(ref m) if m == INVALID_BASE64_MESSAGE));

        let err = AppError::from(Error::unsupported_image("bmp"));
        assert!(matches!(err, AppError::BadRequest(ref m) if m == INVALID_TYPE_MESSAGE));

        let err = AppError::from(Error::predictor("boom"));
        assert!(matches!(err, AppError::Internal));

        let err = AppError::from(Error::ImageTooLarge { size: 10, limit: 5 });
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    fn errors_recorded(f: impl FnOnce() -> AppError) -> String {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        ::metrics::with_local_recorder(&recorder, || {
            f();
        });
        handle.render()
    }

    #[test]
    fn test_form_rejection_counted() {
        let rendered = errors_recorded(|| {
            AppError::rejected(StatusCode::UNPROCESSABLE_ENTITY, "missing field".to_string())
        });
        assert!(rendered.contains(r#"decimer_errors_total{kind="form_rejected"} 1"#));
    }

    #[test]
    fn test_undecodable_output_counted() {
        let rendered = errors_recorded(AppError::undecodable_output);
        assert!(rendered.contains(r#"decimer_errors_total{kind="undecodable_output"} 1"#));
    }
}
