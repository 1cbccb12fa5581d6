use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::{stream_from_chunks, BlobError, BlobResult, ObjectBody, ObjectStore, ObjectSummary};

#[derive(Debug, Clone)]
struct StoredObject {
    key: String,
    data: Option<Bytes>,
    content_type: Option<String>,
    declared_length: Option<u64>,
}

#[derive(Debug, Default)]
struct Inner {
    buckets: HashMap<String, Vec<StoredObject>>,
    failing_buckets: HashMap<String, String>,
    failing_keys: HashMap<(String, String), String>,
}

/// In-process object store for local runs and tests.
///
/// Listing preserves insertion order. Bodies are served in `chunk_size`
/// pieces so readers see a real multi-chunk stream.
#[derive(Clone)]
pub struct MemoryObjectStore {
    inner: Arc<RwLock<Inner>>,
    chunk_size: usize,
    list_calls: Arc<AtomicUsize>,
    get_calls: Arc<AtomicUsize>,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            chunk_size: 64 * 1024,
            list_calls: Arc::new(AtomicUsize::new(0)),
            get_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Serve bodies in chunks of at most `size` bytes (minimum 1)
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Make sure a bucket exists, even if it stays empty
    pub fn create_bucket(&self, bucket: &str) {
        self.inner.write().buckets.entry(bucket.to_string()).or_default();
    }

    /// Store an object, replacing any previous object under the same key
    pub fn insert<D: Into<Bytes>>(&self, bucket: &str, key: &str, data: D) {
        let data = data.into();
        let declared = data.len() as u64;
        self.put(bucket, StoredObject {
            key: key.to_string(),
            data: Some(data),
            content_type: None,
            declared_length: Some(declared),
        });
    }

    /// Store an object with an explicit content type and declared length
    pub fn insert_with<D: Into<Bytes>>(
        &self,
        bucket: &str,
        key: &str,
        data: D,
        content_type: Option<&str>,
        declared_length: Option<u64>,
    ) {
        self.put(bucket, StoredObject {
            key: key.to_string(),
            data: Some(data.into()),
            content_type: content_type.map(str::to_string),
            declared_length,
        });
    }

    /// Store a key that answers successfully but without a body
    pub fn insert_without_body(&self, bucket: &str, key: &str) {
        self.put(bucket, StoredObject {
            key: key.to_string(),
            data: None,
            content_type: None,
            declared_length: None,
        });
    }

    /// Make every listing of `bucket` fail with `message`
    pub fn fail_listing(&self, bucket: &str, message: &str) {
        self.inner
            .write()
            .failing_buckets
            .insert(bucket.to_string(), message.to_string());
    }

    /// Make every retrieval of `bucket/key` fail with `message`
    pub fn fail_object(&self, bucket: &str, key: &str, message: &str) {
        self.inner
            .write()
            .failing_keys
            .insert((bucket.to_string(), key.to_string()), message.to_string());
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    fn put(&self, bucket: &str, object: StoredObject) {
        let mut inner = self.inner.write();
        let objects = inner.buckets.entry(bucket.to_string()).or_default();
        match objects.iter_mut().find(|o| o.key == object.key) {
            Some(existing) => *existing = object,
            None => objects.push(object),
        }
    }

    fn backend_error(message: &str) -> BlobError {
        BlobError::backend(std::io::Error::new(
            std::io::ErrorKind::Other,
            message.to_string(),
        ))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list_objects(&self, bucket: &str) -> BlobResult<Vec<ObjectSummary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read();

        if let Some(message) = inner.failing_buckets.get(bucket) {
            return Err(Self::backend_error(message));
        }

        let objects = inner
            .buckets
            .get(bucket)
            .ok_or_else(|| BlobError::not_found(bucket, ""))?;

        Ok(objects
            .iter()
            .map(|o| {
                let summary = ObjectSummary::new(o.key.clone());
                match &o.data {
                    Some(data) => summary.with_size(data.len() as u64),
                    None => summary,
                }
            })
            .collect())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BlobResult<ObjectBody> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read();

        if let Some(message) = inner.failing_keys.get(&(bucket.to_string(), key.to_string())) {
            return Err(Self::backend_error(message));
        }

        let object = inner
            .buckets
            .get(bucket)
            .and_then(|objects| objects.iter().find(|o| o.key == key))
            .ok_or_else(|| BlobError::not_found(bucket, key))?;

        let Some(data) = object.data.clone() else {
            return Ok(ObjectBody::empty());
        };

        let chunks: Vec<Bytes> = (0..data.len())
            .step_by(self.chunk_size)
            .map(|start| data.slice(start..(start + self.chunk_size).min(data.len())))
            .collect();

        let mut body = ObjectBody::new(stream_from_chunks(chunks));
        body.content_length = object.declared_length;
        body.content_type = object.content_type.clone();
        Ok(body)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn bodies_are_served_in_chunks() {
        let store = MemoryObjectStore::new().with_chunk_size(3);
        store.insert("b", "k", Bytes::from_static(b"abcdefgh"));

        let body = store.get_object("b", "k").await.unwrap();
        assert_eq!(body.content_length, Some(8));

        let mut stream = body.body.unwrap();
        let mut sizes = Vec::new();
        while let Some(chunk) = futures_util::StreamExt::next(&mut stream).await {
            sizes.push(chunk.unwrap().len());
        }
        assert_eq!(sizes, vec![3, 3, 2]);
    }

    #[tokio::test]
    async fn reinserting_a_key_keeps_its_position() {
        let store = MemoryObjectStore::new();
        store.insert("b", "first", Bytes::from_static(b"1"));
        store.insert("b", "second", Bytes::from_static(b"2"));
        store.insert("b", "first", Bytes::from_static(b"111"));

        let keys: Vec<String> = store
            .list_objects("b")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, vec!["first", "second"]);

        let body = store.get_object("b", "first").await.unwrap();
        let data = aggregate(body.body.unwrap(), &CancellationToken::new()).await.unwrap();
        assert_eq!(&data[..], b"111");
    }

    #[tokio::test]
    async fn unknown_bucket_is_an_error() {
        let store = MemoryObjectStore::new();
        let err = store.list_objects("nope").await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound { .. }));
    }
}
