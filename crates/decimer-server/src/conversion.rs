//! EMF rasterization through an external tool

use crate::config::ConversionConfig;
use decimer_core::{Error, ImageKind, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Runs a vector-to-raster converter such as ImageMagick on EMF payloads
#[derive(Debug, Clone)]
pub struct EmfConverter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl EmfConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Build from configuration; `None` when conversion is disabled
    pub fn from_config(config: &ConversionConfig) -> Option<Self> {
        config.enabled.then(|| {
            Self::new(
                config.program.clone(),
                config.args.clone(),
                Duration::from_secs(config.timeout_secs),
            )
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_PLACEHOLDER, &output)
                    .into()
            })
            .collect()
    }

    /// Convert an EMF payload to PNG bytes
    pub async fn convert(&self, emf: &[u8]) -> Result<Vec<u8>> {
        let workdir = tempfile::Builder::new()
            .prefix("decimer-emf-")
            .tempdir()
            .map_err(|e| Error::conversion(format!("failed to create temp dir: {}", e)))?;
        let input = workdir.path().join("input.emf");
        let output = workdir.path().join("output.png");

        write_input(&input, emf).await?;

        let mut command = Command::new(&self.program);
        command
            .args(self.command_args(&input, &output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %self.program, "running EMF converter");
        let result = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                Error::conversion(format!(
                    "{} timed out after {}s",
                    self.program,
                    self.timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| Error::conversion(format!("failed to run {}: {}", self.program, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::conversion(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }

        let png = tokio::fs::read(&output).await.map_err(|e| {
            Error::conversion(format!("{} produced no output: {}", self.program, e))
        })?;
        if png.is_empty() {
            return Err(Error::conversion(format!("{} produced an empty file", self.program)));
        }
        if !ImageKind::sniff(&png).is_some_and(|kind| kind.is_raster()) {
            return Err(Error::conversion(format!(
                "{} did not produce a raster image",
                self.program
            )));
        }

        Ok(png)
    }
}

async fn write_input(path: &Path, emf: &[u8]) -> Result<()> {
    tokio::fs::write(path, emf)
        .await
        .map_err(|e| Error::conversion(format!("failed to stage {}: {}", path.display(), e)))
}
