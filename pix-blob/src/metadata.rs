//! Image metadata extraction.
//!
//! Only the container header is read: the format is sniffed from the magic
//! bytes and the decoder is asked for dimensions, which every supported
//! decoder answers without touching pixel data.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use thiserror::Error;

/// Structural facts about an image buffer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Length reported by the source, if any. Untrusted.
    pub declared_byte_length: Option<u64>,
    /// Length of the buffer that was actually inspected
    pub byte_length: u64,
    /// MIME type of the detected container
    pub format: Option<String>,
}

/// Failures while inspecting an image buffer
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("unsupported image format ({byte_length} bytes, no known signature)")]
    UnsupportedFormat { byte_length: u64 },

    #[error("corrupt {format} image: {message}")]
    Corrupt { format: String, message: String },

    #[error("failed to read image header: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ImageMetadata {
    /// Inspect `buffer` as a whole and report its dimensions.
    pub fn extract(buffer: &[u8]) -> Result<Self, MetadataError> {
        let byte_length = buffer.len() as u64;
        let reader = ImageReader::new(Cursor::new(buffer)).with_guessed_format()?;

        let format = reader
            .format()
            .ok_or(MetadataError::UnsupportedFormat { byte_length })?;

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| MetadataError::Corrupt {
                format: format_name(format).to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            width: Some(width),
            height: Some(height),
            declared_byte_length: None,
            byte_length,
            format: Some(format.to_mime_type().to_string()),
        })
    }

    /// Attach the length the source declared for this object.
    pub fn with_declared_length(mut self, length: Option<u64>) -> Self {
        self.declared_byte_length = length;
        self
    }

    /// True when the declared length disagrees with what was received.
    pub fn length_mismatch(&self) -> bool {
        self.declared_byte_length
            .is_some_and(|declared| declared != self.byte_length)
    }
}

fn format_name(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("image")
}
