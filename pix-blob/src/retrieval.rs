use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::aggregate::aggregate_within;
use crate::{
    BlobConfig, BlobError, BlobResult, ByteStream, ImageMetadata, ObjectBody, ObjectStore,
    ObjectSummary,
};

/// Outcome of a single retrieval request
pub enum RetrievalResult {
    /// The store returned a body. `content_length` is the declared length, a hint only.
    Found {
        stream: ByteStream,
        content_length: Option<u64>,
    },
    /// The request succeeded but carried no body
    Empty,
    /// The store call itself failed; the error is passed through unmodified
    TransportFailure(BlobError),
}

impl RetrievalResult {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::TransportFailure(_))
    }
}

impl std::fmt::Debug for RetrievalResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Found { content_length, .. } => f
                .debug_struct("Found")
                .field("content_length", content_length)
                .finish_non_exhaustive(),
            Self::Empty => f.write_str("Empty"),
            Self::TransportFailure(err) => f.debug_tuple("TransportFailure").field(err).finish(),
        }
    }
}

/// Fetches objects from one bucket of a shared store.
///
/// Every store call is attempted exactly once and bounded by
/// `BlobConfig::request_timeout` and the caller's cancellation token.
pub struct ObjectRetrieval {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    config: BlobConfig,
}

impl ObjectRetrieval {
    pub fn new<B: Into<String>>(store: Arc<dyn ObjectStore>, bucket: B, config: BlobConfig) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            config,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// Issue one `get_object` for `key`.
    pub async fn retrieve(&self, key: &str, cancel: &CancellationToken) -> RetrievalResult {
        tracing::debug!(bucket = %self.bucket, key, store = self.store.name(), "retrieving object");

        match self.bounded(cancel, self.store.get_object(&self.bucket, key)).await {
            Ok(ObjectBody {
                body: Some(stream),
                content_length,
                ..
            }) => RetrievalResult::Found {
                stream,
                content_length,
            },
            Ok(ObjectBody { body: None, .. }) => RetrievalResult::Empty,
            Err(err) => RetrievalResult::TransportFailure(err),
        }
    }

    /// List the bucket, preserving the store's order.
    pub async fn list(&self, cancel: &CancellationToken) -> BlobResult<Vec<ObjectSummary>> {
        tracing::debug!(bucket = %self.bucket, store = self.store.name(), "listing bucket");
        self.bounded(cancel, self.store.list_objects(&self.bucket)).await
    }

    /// Keys only, in listing order.
    pub async fn list_keys(&self, cancel: &CancellationToken) -> BlobResult<Vec<String>> {
        let objects = self.list(cancel).await?;
        Ok(objects.into_iter().map(|o| o.key).collect())
    }

    /// Retrieve `key`, aggregate its body and read its image header.
    pub async fn fetch_image_metadata(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> BlobResult<ImageMetadata> {
        match self.retrieve(key, cancel).await {
            RetrievalResult::Found {
                stream,
                content_length,
            } => {
                let buffer = aggregate_within(
                    stream,
                    cancel,
                    self.config.max_blob_bytes,
                    self.config.request_timeout,
                )
                .await?;

                let metadata = ImageMetadata::extract(&buffer)?.with_declared_length(content_length);
                if metadata.length_mismatch() {
                    tracing::warn!(
                        key,
                        declared = ?metadata.declared_byte_length,
                        received = metadata.byte_length,
                        "declared content length differs from received bytes"
                    );
                }
                Ok(metadata)
            }
            RetrievalResult::Empty => Err(BlobError::empty_body(key)),
            RetrievalResult::TransportFailure(err) => Err(err),
        }
    }

    async fn bounded<T, F>(&self, cancel: &CancellationToken, call: F) -> BlobResult<T>
    where
        F: Future<Output = BlobResult<T>>,
    {
        let deadline = self.config.request_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(BlobError::Cancelled),
            res = tokio::time::timeout(deadline, call) => match res {
                Ok(inner) => inner,
                Err(_) => Err(BlobError::Timeout(deadline)),
            },
        }
    }
}
