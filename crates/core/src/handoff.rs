//! Download handoff: hand a converted file to the caller, then remove it.

use std::path::Path;
use tracing::warn;

use crate::converter::{in_request_dir, ConversionError};

/// A converted file read back for transfer.
#[derive(Debug, Clone)]
pub struct TakenOutput {
    /// Filename to offer the downloader.
    pub file_name: String,
    /// Full file contents.
    pub data: Vec<u8>,
    /// Whether the file was removed from disk.
    pub removed: bool,
}

/// Reads the file at `path` fully into memory and deletes it.
///
/// Deletion is best-effort: a failure is logged and reported through
/// [`TakenOutput::removed`], and the bytes are still returned.
pub async fn take_output(path: &Path) -> Result<TakenOutput, ConversionError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| ConversionError::from_io(e, path))?;

    let removed = discard_output(path).await;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(TakenOutput {
        file_name,
        data,
        removed,
    })
}

/// Deletes a converted file and the per-request directory holding it.
///
/// Best-effort: failures are logged and reported as `false`.
pub async fn discard_output(path: &Path) -> bool {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove converted file");
        return false;
    }

    if in_request_dir(path) {
        if let Some(dir) = path.parent() {
            if let Err(e) = tokio::fs::remove_dir(dir).await {
                warn!(dir = %dir.display(), error = %e, "Failed to remove output directory");
            }
        }
    }
    true
}
