//! pix-server: wires configuration, the object store and the upload handler
//! into an Axum app.

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use pix_axum::app::DEFAULT_MAX_BODY_BYTES;
use pix_axum::{AxumApp, Diagnostics, DiagnosticsConfig, UploadHandler};
use pix_blob::{BlobConfig, MemoryObjectStore, ObjectRetrieval, ObjectStore, S3Config, S3ObjectStore};
use pix_core::PixConfigSnapshot;
use tracing::info;

/// Build the app from a configuration snapshot.
pub fn build(config: &PixConfigSnapshot) -> Result<AxumApp> {
    let store = object_store(config)?;
    let bucket = config.get_string_or("storage.bucket", crate::config::DEFAULT_BUCKET);
    let retrieval = ObjectRetrieval::new(store, bucket, blob_config(config));

    info!(
        backend = retrieval.store_name(),
        bucket = retrieval.bucket(),
        "object storage configured"
    );

    let diagnostics = Diagnostics::new(
        DiagnosticsConfig::from_snapshot(config),
        Some(Arc::new(retrieval)),
    );
    let max_body_bytes = config
        .get_usize("http.max_body_bytes")
        .unwrap_or(DEFAULT_MAX_BODY_BYTES);
    Ok(AxumApp::with_body_limit(UploadHandler::new(diagnostics), max_body_bytes))
}

/// `host:port` the server should bind.
pub fn bind_address(config: &PixConfigSnapshot) -> String {
    let host = config.get_string_or("http.host", "127.0.0.1");
    let port = config.get_string_or("http.port", "3030");
    format!("{host}:{port}")
}

fn blob_config(config: &PixConfigSnapshot) -> BlobConfig {
    let defaults = BlobConfig::default();
    BlobConfig::new()
        .with_max_blob_bytes(config.get_u64_or("blob.max_bytes", defaults.max_blob_bytes))
        .with_request_timeout(
            config
                .get_u64("blob.request_timeout_ms")
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
        )
}

fn object_store(config: &PixConfigSnapshot) -> Result<Arc<dyn ObjectStore>> {
    let backend = config.get_string_or("storage.backend", "s3");
    match backend.as_str() {
        "s3" => Ok(Arc::new(S3ObjectStore::new(s3_config(config)))),
        "memory" => {
            let store = MemoryObjectStore::new();
            store.create_bucket(&config.get_string_or("storage.bucket", crate::config::DEFAULT_BUCKET));
            Ok(Arc::new(store))
        }
        other => bail!("unknown storage backend: {other}"),
    }
}

fn s3_config(config: &PixConfigSnapshot) -> S3Config {
    let mut s3 = S3Config::new(config.get_string_or("storage.region", "eu-central-1"));
    if let Some(endpoint) = config.get_string("storage.endpoint_url") {
        s3 = s3.with_endpoint(endpoint);
    }
    if let (Some(key), Some(secret)) = (
        config.get_string("storage.access_key_id"),
        config.get_string("storage.secret_access_key"),
    ) {
        s3 = s3.with_credentials(key, secret);
    }
    if config.get_bool_or("storage.force_path_style", false) {
        s3 = s3.with_path_style();
    }
    if let Some(max_keys) = config.get_usize("storage.max_keys") {
        s3 = s3.with_max_keys(max_keys);
    }
    s3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_backend_is_rejected() {
        let mut config = config::defaults();
        config.set("storage.backend", "ftp");
        let err = build(&config.snapshot()).err().unwrap();
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn s3_settings_are_carried_over() {
        let mut config = config::defaults();
        config.set("storage.endpoint_url", "http://localhost:9000");
        config.set("storage.force_path_style", "true");
        config.set("storage.max_keys", "50");

        let s3 = s3_config(&config.snapshot());
        assert_eq!(s3.region, "eu-central-1");
        assert_eq!(s3.endpoint_url.as_deref(), Some("http://localhost:9000"));
        assert!(s3.force_path_style);
        assert_eq!(s3.max_keys, Some(50));
        assert!(s3.access_key_id.is_none());
    }

    #[test]
    fn bind_address_uses_defaults() {
        assert_eq!(bind_address(&config::defaults().snapshot()), "127.0.0.1:3030");
    }
}
