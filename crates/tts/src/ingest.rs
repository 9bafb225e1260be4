use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use vocalis_config::TranscoderConfig;

use crate::{error::TtsError, ledger::TempLedger, types::ReferenceUpload};

/// Extension of the canonical reference container
pub const CANONICAL_EXTENSION: &str = "wav";

/// Extension used when the client sent something unusable as a file extension
const UNKNOWN_EXTENSION: &str = "bin";

/// Persists uploaded reference recordings and converts them to the
/// canonical container
pub struct ReferenceIngestor {
    config: TranscoderConfig,
}

impl ReferenceIngestor {
    pub const fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Write `upload` to disk and return a path in the canonical container
    ///
    /// Every file created is registered in `ledger`. After a successful
    /// conversion the original upload is deleted straight away; on failure
    /// the ledger removes whatever was written.
    ///
    /// # Errors
    ///
    /// [`TtsError::ToolMissing`] when the transcoder cannot be found,
    /// [`TtsError::TranscodeFailed`] when it rejects the input
    pub async fn ingest(&self, upload: &ReferenceUpload, ledger: &mut TempLedger) -> crate::Result<PathBuf> {
        let extension = upload_extension(upload.filename.as_deref());

        let original = ledger.allocate(&extension);
        tokio::fs::write(ledger.path(original), &upload.data)
            .await
            .map_err(|e| TtsError::internal("failed to persist reference audio", e))?;

        if extension == CANONICAL_EXTENSION {
            return Ok(ledger.path(original).to_path_buf());
        }

        let converted = ledger.allocate(CANONICAL_EXTENSION);
        self.transcode(ledger.path(original), ledger.path(converted)).await?;

        ledger.release(original);

        Ok(ledger.path(converted).to_path_buf())
    }

    async fn transcode(&self, input: &Path, output: &Path) -> crate::Result<()> {
        let command = &self.config.command;

        tracing::debug!(input = %input.display(), "converting reference audio");

        let result = Command::new(command)
            .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(input)
            .arg("-ar")
            .arg(self.config.sample_rate.to_string())
            .arg("-ac")
            .arg(self.config.channels.to_string())
            .arg(output)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!(command, "transcoder not found");
                return Err(TtsError::ToolMissing(command.clone()));
            }
            Err(e) => return Err(TtsError::internal("failed to run transcoder", e)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(status = %output.status, "reference audio conversion failed: {stderr}");
            return Err(TtsError::TranscodeFailed(stderr));
        }

        Ok(())
    }
}

/// Lower-cased extension of the client filename, `wav` when there is none
fn upload_extension(filename: Option<&str>) -> String {
    let Some(extension) = filename.and_then(|name| Path::new(name).extension()) else {
        return CANONICAL_EXTENSION.to_string();
    };

    let extension = extension.to_string_lossy().to_ascii_lowercase();

    if extension.is_empty() || extension.len() > 8 || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return UNKNOWN_EXTENSION.to_string();
    }

    extension
}
