use std::time::Duration;

use thiserror::Error;

use crate::metadata::MetadataError;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur while talking to the object store or reading its streams
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Object body is empty: {key}")]
    EmptyBody { key: String },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Object exceeds maximum size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Image metadata error: {source}")]
    Metadata {
        #[from]
        source: MetadataError,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BlobError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<B: Into<String>, K: Into<String>>(bucket: B, key: K) -> Self {
        Self::NotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Create an empty body error
    pub fn empty_body<S: Into<String>>(key: S) -> Self {
        Self::EmptyBody { key: key.into() }
    }

    /// True for failures of the transport itself rather than of the content.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Backend { .. }
                | Self::Io { .. }
                | Self::Timeout(_)
                | Self::Cancelled
        )
    }
}
