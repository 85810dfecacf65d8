//! Image formats the watermark pipeline can process.

use serde::Serialize;

/// An image format: MIME type and display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaFormat {
    pub mime_type: &'static str,
    pub label: &'static str,
}

const WEBP: &str = "image/webp";

const FORMATS: [MediaFormat; 4] = [
    MediaFormat {
        mime_type: "image/jpeg",
        label: "JPEG",
    },
    MediaFormat {
        mime_type: "image/png",
        label: "PNG",
    },
    MediaFormat {
        mime_type: "image/gif",
        label: "GIF",
    },
    MediaFormat {
        mime_type: WEBP,
        label: "WebP",
    },
];

/// Supported formats in display order. WebP is dropped unless the backend
/// supports it or `include_unsupported` is set.
pub fn available_formats(include_unsupported: bool, webp_supported: bool) -> Vec<MediaFormat> {
    FORMATS
        .iter()
        .copied()
        .filter(|format| format.mime_type != WEBP || include_unsupported || webp_supported)
        .collect()
}

/// MIME types of [`available_formats`]
pub fn available_mime_types(include_unsupported: bool, webp_supported: bool) -> Vec<String> {
    available_formats(include_unsupported, webp_supported)
        .into_iter()
        .map(|format| format.mime_type.to_string())
        .collect()
}
