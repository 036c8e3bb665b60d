//! DECIMER Client
//!
//! Thin HTTP client for the image-to-SMILES service.
//!
//! ```no_run
//! # async fn run() -> decimer_client::Result<()> {
//! let api = decimer_client::DecimerApi::new("localhost", 8099)?;
//! let smiles = api.call_image2smiles("caffeine.png", false, true).await?;
//! println!("{:?}", smiles);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;

pub use client::{DecimerApi, ServerStatus, DEFAULT_HOST, DEFAULT_PORT, MAX_ENCODED_BYTES};
pub use error::{ClientError, Result};
