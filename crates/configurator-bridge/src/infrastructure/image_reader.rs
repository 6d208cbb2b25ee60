//! Reads an image file into a `data:` URL for `updateImageValue`.

use std::path::{Path, PathBuf};

use configurator_core::application::data_url::FALLBACK_MIME;
use configurator_core::application::{encode_data_url, mime_for_extension};
use thiserror::Error;
use tracing::debug;

/// Error type for image file reads.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads `path` and encodes it as `data:<mime>;base64,<payload>`, with the
/// MIME type taken from the file extension.
///
/// # Errors
///
/// Returns [`ImageError::Io`] if the file cannot be read.
pub async fn read_data_url(path: &Path) -> Result<String, ImageError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mime = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(mime_for_extension)
        .unwrap_or(FALLBACK_MIME);

    debug!("read {} bytes of {mime} from {}", bytes.len(), path.display());
    Ok(encode_data_url(mime, &bytes))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
