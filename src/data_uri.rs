//! Self-describing `data:` URIs for inline image payloads.
//!
//! ```text
//! data:image/png;base64,iVBORw0KGgo...
//! └──┬─┘└───┬───┘└──┬─┘ └────┬─────┘
//!  scheme  mime   encoding  payload
//! ```

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

/// Standard alphabet that accepts payloads with or without `=` padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub data: Vec<u8>,
}

impl DataUri {
    /// Encode bytes as `data:{mime};base64,{payload}`.
    pub fn encode(mime: &str, data: &[u8]) -> String {
        format!("data:{};base64,{}", mime, STANDARD.encode(data))
    }

    /// Parse a base64 data URI. Returns `None` for anything else.
    pub fn parse(uri: &str) -> Option<Self> {
        let (mime, payload) = split_data_uri(uri)?;
        let data = LENIENT.decode(payload.trim()).ok()?;
        Some(Self {
            mime: mime.to_string(),
            data,
        })
    }
}

/// Split `data:<mime>;base64,<payload>` into its MIME type and payload.
fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    Some((mime, payload))
}

/// Decode an inline image payload into raw bytes.
///
/// A `data:<type>;base64,` prefix is stripped when present; otherwise the
/// whole string is taken as bare base64. The declared MIME type is returned
/// alongside the bytes when there was one.
pub fn decode_image_payload(payload: &str) -> Result<(Option<String>, Vec<u8>), String> {
    let (mime, encoded) = match split_data_uri(payload) {
        Some((mime, encoded)) => (Some(mime.to_string()), encoded),
        None => (None, payload),
    };

    let bytes = LENIENT
        .decode(encoded.trim())
        .map_err(|e| format!("payload is not valid base64: {}", e))?;

    if bytes.is_empty() {
        return Err("payload is empty".to_string());
    }

    Ok((mime, bytes))
}

/// File extension (without dot) for a known image MIME type.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let ext = match mime.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/svg+xml" => "svg",
        "image/tiff" => "tiff",
        "image/avif" => "avif",
        _ => return None,
    };
    Some(ext)
}

/// MIME type for a file extension (with or without the leading dot).
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        _ => return None,
    };
    Some(mime)
}

/// Whether a declared content type is in the image category.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}
