//! `data:` URL encoding for image uploads.
//!
//! `updateImageValue` carries the image inline as
//! `data:<mime>;base64,<payload>`, the same form a browser `FileReader`
//! produces with `readAsDataURL`.

use base64::{engine::general_purpose, Engine as _};

/// MIME type used when the file type cannot be determined.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Encodes `bytes` as a base64 `data:` URL of type `mime`.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", general_purpose::STANDARD.encode(bytes))
}

/// Best-effort MIME type for a file extension (case-insensitive).
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "tif" | "tiff" => "image/tiff",
        _ => FALLBACK_MIME,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
