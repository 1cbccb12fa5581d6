//! # Errors
//!
//! pix classifies every failure into a small taxonomy. Only two of the
//! kinds ever reach an HTTP caller (`MissingBody` and `UnhandledException`);
//! the rest belong to the diagnostic path and are logged where they occur.
//!
//! A `PixError` can be carried through `anyhow::Error`, so handlers can use
//! `?` freely and the server crate recovers the structured error at the edge.
//!
//! With feature `serde` (on by default) you also get `to_json()`, which
//! produces the response-contract body for the error.

use std::fmt;

use anyhow::Error as AnyError;

/// A convenience result type for pix handler code.
pub type PixResult<T> = std::result::Result<T, AnyError>;

/// Message returned to callers when the request carries no body.
pub const MISSING_BODY_MESSAGE: &str = "No file found in the request body.";

/// Top-level message for 500 responses; the detail goes in `error`.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingBody,               // 400
    UnsupportedOrCorruptImage, // 422
    DependencyProbeFailure,    // 500
    UnhandledException,        // 500
    TransportFailure,          // 502
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::MissingBody => 400,
            ErrorKind::UnsupportedOrCorruptImage => 422,
            ErrorKind::DependencyProbeFailure => 500,
            ErrorKind::UnhandledException => 500,
            ErrorKind::TransportFailure => 502,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::MissingBody => "MissingBody",
            ErrorKind::UnsupportedOrCorruptImage => "UnsupportedOrCorruptImage",
            ErrorKind::DependencyProbeFailure => "DependencyProbeFailure",
            ErrorKind::UnhandledException => "UnhandledException",
            ErrorKind::TransportFailure => "TransportFailure",
        }
    }
}

/// A structured pix error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct PixError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<AnyError>,
}

impl PixError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Convert into `anyhow::Error` so it flows through `?`.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to a `PixError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&PixError> {
        err.chain().find_map(|e| e.downcast_ref::<PixError>())
    }

    /// Turn any error into a PixError:
    /// - if it is already a PixError, keep it
    /// - otherwise wrap as UnhandledException, echoing the message
    pub fn normalize(err: AnyError) -> PixError {
        match err.downcast::<PixError>() {
            Ok(pix) => pix,
            Err(other) => {
                PixError::new(ErrorKind::UnhandledException, other.to_string()).with_source(other)
            }
        }
    }

    // ---- Constructors ----

    pub fn missing_body() -> Self {
        Self::new(ErrorKind::MissingBody, MISSING_BODY_MESSAGE)
    }
    pub fn unhandled(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnhandledException, msg)
    }
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportFailure, msg)
    }
    pub fn unsupported_image(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedOrCorruptImage, msg)
    }
    pub fn dependency_probe(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::DependencyProbeFailure, msg)
    }
}

impl fmt::Display for PixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for PixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(feature = "serde")]
impl PixError {
    /// Response-contract payload.
    ///
    /// Client errors carry only `message`; everything else is reported as an
    /// internal error with the original message under `error`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        match self.kind {
            ErrorKind::MissingBody => json!({ "message": self.message }),
            _ => json!({
                "message": INTERNAL_ERROR_MESSAGE,
                "error": self.message,
            }),
        }
    }
}

/// Convenience helper for "bail with PixError".
#[macro_export]
macro_rules! bail_pix {
    ($ctor:ident) => {
        return Err($crate::errors::PixError::$ctor().into_anyhow());
    };
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::PixError::$ctor($msg).into_anyhow());
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::PixError::$ctor(format!($fmt, $($arg)*)).into_anyhow());
    };
}
