use bytes::Bytes;
use futures_core::Stream;
use std::pin::Pin;

/// Stream of bytes for object content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Build a `ByteStream` that yields the given chunks in order.
pub fn stream_from_chunks<I>(chunks: I) -> ByteStream
where
    I: IntoIterator<Item = Bytes>,
    I::IntoIter: Send + 'static,
{
    Box::pin(futures_util::stream::iter(chunks.into_iter().map(Ok)))
}

/// One entry of a bucket listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size_bytes: Option<u64>,
    pub last_modified: Option<i64>,
}

impl ObjectSummary {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self {
            key: key.into(),
            size_bytes: None,
            last_modified: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size_bytes = Some(size);
        self
    }

    pub fn with_last_modified(mut self, secs: i64) -> Self {
        self.last_modified = Some(secs);
        self
    }
}

/// What the store hands back for a single object request.
///
/// `content_length` is whatever the store declared and is not trusted for
/// sizing; `body` is `None` when the store answered without content.
pub struct ObjectBody {
    pub body: Option<ByteStream>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
}

impl ObjectBody {
    pub fn new(body: ByteStream) -> Self {
        Self {
            body: Some(body),
            content_length: None,
            content_type: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            body: None,
            content_length: None,
            content_type: None,
        }
    }

    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl std::fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBody")
            .field("has_body", &self.body.is_some())
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish()
    }
}
