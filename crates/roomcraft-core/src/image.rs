//! Encoded image payloads and the normalization seam.
//!
//! Images travel through the workflow as opaque encoded bytes plus a MIME
//! type. Decoding, resizing and re-encoding are left to an injected
//! [`ImageNormalizer`]; the workflow only relies on the result being a
//! non-empty encoded image.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use std::fmt;

use crate::error::{Result, RoomcraftError};

/// An encoded image (PNG, JPEG, WebP, ...) that is never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    mime_type: String,
    bytes: Vec<u8>,
}

impl EncodedImage {
    /// Wraps encoded bytes. Empty payloads are rejected.
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(RoomcraftError::image_processing("image payload is empty"));
        }
        let mime_type = mime_type.into();
        if mime_type.trim().is_empty() {
            return Err(RoomcraftError::image_processing("image MIME type is empty"));
        }
        Ok(Self { mime_type, bytes })
    }

    /// Decodes a base64 payload as sent by the provider.
    pub fn from_base64(mime_type: impl Into<String>, data: &str) -> Result<Self> {
        let bytes = BASE64_STANDARD
            .decode(data.trim())
            .map_err(|e| RoomcraftError::image_processing(format!("invalid base64 image data: {e}")))?;
        Self::new(mime_type, bytes)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Base64 encoding of the payload, as used by the provider wire format.
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.bytes)
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Turns raw uploaded bytes into the normalized image handed to the provider.
///
/// Implementations are pure and may be CPU heavy; callers run them off the
/// async executor.
pub trait ImageNormalizer: Send + Sync {
    fn normalize(&self, raw: &[u8]) -> Result<EncodedImage>;
}

/// Normalizer that keeps the bytes as-is after identifying the format from
/// its magic number.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatSniffingNormalizer;

impl ImageNormalizer for FormatSniffingNormalizer {
    fn normalize(&self, raw: &[u8]) -> Result<EncodedImage> {
        let mime_type = sniff_mime_type(raw)
            .ok_or_else(|| RoomcraftError::image_processing("unsupported or unrecognized image format"))?;
        EncodedImage::new(mime_type, raw.to_vec())
    }
}

/// Identifies PNG, JPEG and WebP payloads by their leading bytes.
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];

    if bytes.starts_with(PNG) {
        Some("image/png")
    } else if bytes.starts_with(JPEG) {
        Some("image/jpeg")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}
