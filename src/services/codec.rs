// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image preparation before upload.

use crate::error::AppError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

/// Longest side, in pixels, of an uploaded image.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// JPEG quality used for uploads (1-100).
pub const DEFAULT_QUALITY: u8 = 70;

/// Image bytes ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Compresses raw image payloads before they are uploaded.
///
/// Platform shells plug in their native encoder here.
pub trait ImageCodec: Send + Sync {
    fn compress(&self, raw: &[u8]) -> Result<EncodedImage, AppError>;
}

/// Decodes any supported format, caps the dimensions and re-encodes as JPEG.
#[derive(Debug, Clone)]
pub struct JpegCodec {
    max_bytes: usize,
    max_dimension: u32,
    quality: u8,
}

impl JpegCodec {
    /// `max_bytes` bounds the raw payload accepted for compression.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: DEFAULT_QUALITY,
        }
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension.max(1);
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }
}

impl ImageCodec for JpegCodec {
    fn compress(&self, raw: &[u8]) -> Result<EncodedImage, AppError> {
        if raw.is_empty() {
            return Err(AppError::BadRequest("Image payload is empty".to_string()));
        }
        if raw.len() > self.max_bytes {
            return Err(AppError::BadRequest(format!(
                "Image payload too large: {} bytes (max {})",
                raw.len(),
                self.max_bytes
            )));
        }

        let source_type = sniff_content_type(raw)
            .ok_or_else(|| AppError::BadRequest("Unsupported image format".to_string()))?;

        let decoded = image::load_from_memory(raw).map_err(|e| {
            AppError::BadRequest(format!("Failed to decode {}: {}", source_type, e))
        })?;

        let (width, height) = (decoded.width(), decoded.height());
        let scaled = if width > self.max_dimension || height > self.max_dimension {
            decoded.resize(self.max_dimension, self.max_dimension, FilterType::Triangle)
        } else {
            decoded
        };

        // JPEG has no alpha channel.
        let rgb = scaled.to_rgb8();
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality)
            .encode_image(&rgb)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JPEG encoding failed: {}", e)))?;

        tracing::debug!(
            source_type,
            source_bytes = raw.len(),
            width = rgb.width(),
            height = rgb.height(),
            encoded_bytes = bytes.len(),
            "Image compressed"
        );

        Ok(EncodedImage {
            bytes,
            content_type: "image/jpeg",
        })
    }
}

/// Detect the image type from its magic bytes.
pub fn sniff_content_type(bytes: &[u8]) -> Option<&'static str> {
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(PNG) {
        Some("image/png")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}
