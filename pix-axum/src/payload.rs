//! Request payload decoding.
//!
//! A gateway hands the uploaded file over either as base64 text or as the raw
//! body. Decoding is pure: absent body is `MissingBody`, an empty body is an
//! empty buffer, and base64 either decodes completely or fails.

use std::collections::HashMap;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use bytes::Bytes;
use thiserror::Error;

/// Header carrying the client's file name (logging and echo only).
pub const FILENAME_HEADER: &str = "x-filename";

/// Used when the client sends no file name.
pub const UNKNOWN_FILENAME: &str = "Unknown filename";

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("No file found in the request body.")]
    MissingBody,

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// The inbound artifact as the gateway delivered it.
#[derive(Debug, Clone, Default)]
pub struct RequestPayload {
    pub body: Option<Bytes>,
    pub is_base64_encoded: bool,
    pub file_name: Option<String>,
}

impl RequestPayload {
    pub fn new(body: Option<Bytes>, is_base64_encoded: bool) -> Self {
        Self {
            body,
            is_base64_encoded,
            file_name: None,
        }
    }

    pub fn with_file_name<S: Into<String>>(mut self, file_name: S) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Pick the file name out of lowercase-keyed headers.
    pub fn with_headers(mut self, headers: &HashMap<String, String>) -> Self {
        if let Some(name) = headers.get(FILENAME_HEADER).filter(|n| !n.is_empty()) {
            self.file_name = Some(name.clone());
        }
        self
    }

    pub fn file_name_or_default(&self) -> &str {
        self.file_name.as_deref().unwrap_or(UNKNOWN_FILENAME)
    }

    pub fn decode(&self) -> Result<Bytes, PayloadError> {
        decode_payload(self.body.clone(), self.is_base64_encoded)
    }
}

/// Produce the uploaded bytes from a gateway body.
pub fn decode_payload(body: Option<Bytes>, is_base64_encoded: bool) -> Result<Bytes, PayloadError> {
    let body = body.ok_or(PayloadError::MissingBody)?;

    if !is_base64_encoded {
        return Ok(body);
    }

    let compact: Vec<u8> = body
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    match STANDARD_LENIENT.decode(&compact) {
        Ok(decoded) => Ok(Bytes::from(decoded)),
        Err(err) => URL_SAFE_LENIENT
            .decode(&compact)
            .map(Bytes::from)
            .map_err(|_| PayloadError::InvalidBase64(err)),
    }
}
