use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::types::Object;
use aws_sdk_s3::Client;
use tokio::sync::OnceCell;

use crate::{BlobError, BlobResult, ByteStream, ObjectBody, ObjectStore, ObjectSummary};

/// Listing placeholder for entries the store returned without a key.
pub const UNKNOWN_KEY: &str = "Unknown Key";

/// Connection settings for an S3-compatible store
#[derive(Debug, Clone)]
pub struct S3Config {
    pub region: String,
    /// Custom endpoint (MinIO, RustFS, LocalStack); `None` uses AWS
    pub endpoint_url: Option<String>,
    /// Static credentials; `None` falls back to the default provider chain
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub force_path_style: bool,
    /// Stop listing after this many keys
    pub max_keys: Option<usize>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: "eu-central-1".to_string(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
            max_keys: None,
        }
    }
}

impl S3Config {
    pub fn new<S: Into<String>>(region: S) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    pub fn with_endpoint<S: Into<String>>(mut self, endpoint_url: S) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub fn with_credentials<A: Into<String>, B: Into<String>>(mut self, access_key_id: A, secret_access_key: B) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn with_path_style(mut self) -> Self {
        self.force_path_style = true;
        self
    }

    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = Some(max_keys);
        self
    }
}

/// S3 store backed by the AWS SDK.
///
/// The client is built on first use and then shared by every call made
/// through this store for the life of the process.
pub struct S3ObjectStore {
    config: S3Config,
    client: OnceCell<Client>,
}

impl S3ObjectStore {
    pub fn new(config: S3Config) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Wrap an already configured client
    pub fn from_client(client: Client, config: S3Config) -> Self {
        Self {
            config,
            client: OnceCell::new_with(Some(client)),
        }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    async fn client(&self) -> &Client {
        self.client
            .get_or_init(|| Self::create_client(&self.config))
            .await
    }

    async fn create_client(config: &S3Config) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            let credentials = Credentials::new(id.clone(), secret.clone(), None, None, "pix-static");
            loader = loader.credentials_provider(credentials);
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let shared = loader.load().await;
        tracing::debug!(region = %config.region, endpoint = ?config.endpoint_url, "s3 client initialised");

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&shared)
                .force_path_style(config.force_path_style)
                .build(),
        )
    }

    fn map_aws_error(err: impl std::error::Error + Send + Sync + 'static) -> BlobError {
        BlobError::backend(err)
    }

    /// Listing entries without a key stay in the listing under [`UNKNOWN_KEY`].
    fn summary_from(object: &Object) -> ObjectSummary {
        let mut summary = ObjectSummary::new(object.key().unwrap_or(UNKNOWN_KEY));
        if let Some(size) = object.size().and_then(|s| u64::try_from(s).ok()) {
            summary = summary.with_size(size);
        }
        if let Some(modified) = object.last_modified() {
            summary = summary.with_last_modified(modified.secs());
        }
        summary
    }

    /// A successful `GetObject` always carries a body stream. The declared
    /// length is passed along as a hint and never decides emptiness; an
    /// empty object aggregates to an empty buffer.
    fn object_body(
        body: aws_sdk_s3::primitives::ByteStream,
        content_length: Option<i64>,
        content_type: Option<String>,
    ) -> ObjectBody {
        let mut object = ObjectBody::new(Self::into_byte_stream(body));
        if let Some(len) = content_length.and_then(|len| u64::try_from(len).ok()) {
            object = object.with_content_length(len);
        }
        if let Some(content_type) = content_type {
            object = object.with_content_type(content_type);
        }
        object
    }

    fn into_byte_stream(mut body: aws_sdk_s3::primitives::ByteStream) -> ByteStream {
        let stream = async_stream::stream! {
            while let Some(chunk) = body.next().await {
                yield chunk.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
            }
        };
        Box::pin(stream)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_objects(&self, bucket: &str) -> BlobResult<Vec<ObjectSummary>> {
        let client = self.client().await;
        let mut pages = client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(Self::map_aws_error)?;

            for object in page.contents() {
                objects.push(Self::summary_from(object));

                if self.config.max_keys.is_some_and(|max| objects.len() >= max) {
                    return Ok(objects);
                }
            }
        }

        Ok(objects)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BlobResult<ObjectBody> {
        let client = self.client().await;
        let output = client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    BlobError::not_found(bucket, key)
                } else {
                    Self::map_aws_error(err)
                }
            })?;

        Ok(Self::object_body(
            output.body,
            output.content_length,
            output.content_type,
        ))
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_sets_fields() {
        let config = S3Config::new("us-east-1")
            .with_endpoint("http://localhost:9000")
            .with_credentials("id", "secret")
            .with_path_style()
            .with_max_keys(10);

        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.access_key_id.as_deref(), Some("id"));
        assert!(config.force_path_style);
        assert_eq!(config.max_keys, Some(10));
    }

    #[test]
    fn keyless_listing_entry_keeps_a_placeholder() {
        let object = Object::builder().size(42).build();
        let summary = S3ObjectStore::summary_from(&object);

        assert_eq!(summary.key, UNKNOWN_KEY);
        assert_eq!(summary.size_bytes, Some(42));

        let named = S3ObjectStore::summary_from(&Object::builder().key("a.png").build());
        assert_eq!(named.key, "a.png");
        assert_eq!(named.size_bytes, None);
    }

    #[tokio::test]
    async fn zero_declared_length_still_yields_a_body() {
        let body = S3ObjectStore::object_body(
            aws_sdk_s3::primitives::ByteStream::from_static(b""),
            Some(0),
            Some("image/png".to_string()),
        );

        assert_eq!(body.content_length, Some(0));
        assert_eq!(body.content_type.as_deref(), Some("image/png"));
        let stream = body.body.expect("stream");
        let data = crate::aggregate(stream, &tokio_util::sync::CancellationToken::new())
            .await
            .unwrap();
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn declared_length_is_only_a_hint() {
        let body = S3ObjectStore::object_body(
            aws_sdk_s3::primitives::ByteStream::from_static(b"abcd"),
            Some(0),
            None,
        );

        let data = crate::aggregate(body.body.expect("stream"), &tokio_util::sync::CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(&data[..], b"abcd");
    }

    #[test]
    fn default_region_matches_image_bucket() {
        assert_eq!(S3Config::default().region, "eu-central-1");
    }
}
