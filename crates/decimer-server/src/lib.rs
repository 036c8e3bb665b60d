//! DECIMER Server
//!
//! HTTP front end for image-to-SMILES recognition.
//!
//! Clients post a base64 encoded image as a form field; the service checks
//! the payload, rasterizes EMF drawings, gates the image through the structure
//! classifier and answers with the predicted SMILES string.

pub mod cli;
pub mod config;
pub mod conversion;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::{ConversionConfig, ServerConfig};
pub use conversion::EmfConverter;
pub use routes::create_router;
pub use state::AppState;
