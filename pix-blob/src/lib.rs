//! # pix-blob: object retrieval and image metadata
//!
//! `pix-blob` turns object-store downloads into image metadata:
//!
//! ```text
//! ┌──────────────────┐
//! │  ObjectRetrieval │  ← one bucket, deadlines, Found / Empty / TransportFailure
//! ├──────────────────┤
//! │    aggregate     │  ← ByteStream → Bytes, exact and cancellable
//! ├──────────────────┤
//! │  ImageMetadata   │  ← header-only dimensions
//! ├──────────────────┤
//! │   ObjectStore    │  ← S3 or in-memory
//! └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use pix_blob::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let store = MemoryObjectStore::new();
//! store.insert("images", "a.txt", &b"not an image"[..]);
//!
//! let retrieval = ObjectRetrieval::new(Arc::new(store), "images", BlobConfig::default());
//! let keys = retrieval.list_keys(&CancellationToken::new()).await?;
//! assert_eq!(keys, vec!["a.txt".to_string()]);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
mod config;
mod error;
mod memory_store;
pub mod metadata;
pub mod retrieval;
mod s3_store;
pub mod store;
mod types;

// Re-export main types for clean API
pub use aggregate::{aggregate, aggregate_with_limit, aggregate_within};
pub use config::BlobConfig;
pub use error::{BlobError, BlobResult};
pub use memory_store::MemoryObjectStore;
pub use metadata::{ImageMetadata, MetadataError};
pub use retrieval::{ObjectRetrieval, RetrievalResult};
pub use s3_store::{S3Config, S3ObjectStore, UNKNOWN_KEY};
pub use store::ObjectStore;
pub use types::{stream_from_chunks, ByteStream, ObjectBody, ObjectSummary};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobConfig, BlobError, BlobResult, ByteStream, ImageMetadata, MemoryObjectStore,
        ObjectRetrieval, ObjectStore, RetrievalResult,
    };
}
