use async_trait::async_trait;

use crate::{BlobResult, ObjectBody, ObjectSummary};

/// Read-side object storage operations - implemented by every backend
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List the objects of a bucket, in the order the backend returns them
    async fn list_objects(&self, bucket: &str) -> BlobResult<Vec<ObjectSummary>>;

    /// Fetch one object as a stream
    async fn get_object(&self, bucket: &str, key: &str) -> BlobResult<ObjectBody>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}
