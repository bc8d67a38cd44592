//! Decoding of client-supplied frame images.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;

use crate::error::{VisionError, VisionResult};

/// A decoded image ready to be attached to a vision request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// MIME type, taken from a `data:` URL prefix or sniffed from the bytes
    pub mime_type: String,
    /// Raw image bytes
    pub data: Vec<u8>,
}

impl EncodedImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Decode a base64 frame image, accepting an optional `data:` URL prefix.
    pub fn from_base64(text: &str) -> VisionResult<Self> {
        let text = text.trim();
        let (declared_mime, payload) = split_data_url(text);

        let data = STANDARD
            .decode(payload)
            .or_else(|_| STANDARD_NO_PAD.decode(payload))
            .map_err(|e| VisionError::decode(format!("invalid base64: {}", e)))?;

        if data.is_empty() {
            return Err(VisionError::decode("empty image"));
        }

        let mime_type = match declared_mime {
            Some(mime) => mime.to_string(),
            None => sniff_mime_type(&data)
                .ok_or_else(|| VisionError::decode("unrecognized image format"))?
                .to_string(),
        };

        Ok(Self { mime_type, data })
    }

    /// Base64 text of the image bytes.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// `data:` URL form, as accepted by OpenAI image inputs.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// Split `data:image/jpeg;base64,....` into its MIME type and payload.
fn split_data_url(text: &str) -> (Option<&str>, &str) {
    if let Some(rest) = text.strip_prefix("data:") {
        if let Some((header, payload)) = rest.split_once(',') {
            let mime = header.strip_suffix(";base64").unwrap_or(header);
            let mime = if mime.is_empty() { None } else { Some(mime) };
            return (mime, payload);
        }
    }
    (None, text)
}

/// Detect the image format from its magic bytes.
fn sniff_mime_type(data: &[u8]) -> Option<&'static str> {
    match data {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}
