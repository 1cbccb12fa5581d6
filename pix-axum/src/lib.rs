//! pix-axum: Axum adapter for the pix upload handler.
//!
//! Exposes the upload handler, its payload decoding and the storage
//! diagnostics that run ahead of every upload, plus a router wiring them to
//! HTTP routes.

pub mod app;
pub mod diagnostics;
pub mod event;
pub mod handler;
pub mod payload;
pub mod probe;
pub mod state;
mod error;
pub use error::PixAxumError;
pub use state::PixAxumState;

pub use app::{axum, AxumApp};
pub use diagnostics::{Diagnostics, DiagnosticsConfig, DiagnosticsReport};
pub use event::{ProxyEvent, ProxyResponse, UploadReceipt};
pub use handler::UploadHandler;
pub use payload::{decode_payload, PayloadError, RequestPayload};
