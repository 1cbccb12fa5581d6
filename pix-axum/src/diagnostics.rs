//! Storage and environment diagnostics.
//!
//! Three optional checks run one after another before an upload is served:
//! the dependency probe, a bucket listing and a metadata read of one known
//! object. Each check is bounded by its own deadline and catches its own
//! failure. Results are logged and handed back as a [`DiagnosticsReport`];
//! nothing here can change the upload response.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pix_blob::{BlobError, ImageMetadata, ObjectRetrieval};
use pix_core::errors::PixError;
use pix_core::PixConfigSnapshot;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::probe::{probe_dependencies_blocking, ProbeReport, DEFAULT_PROBE_PATH};

/// Key read from the image bucket when nothing else is configured.
pub const DEFAULT_OBJECT_KEY: &str = "1356548.png";

#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    pub probe: bool,
    pub probe_path: PathBuf,
    pub list_bucket: bool,
    pub fetch_object: bool,
    pub object_key: String,
    pub timeout: Duration,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probe: true,
            probe_path: PathBuf::from(DEFAULT_PROBE_PATH),
            list_bucket: true,
            fetch_object: true,
            object_key: DEFAULT_OBJECT_KEY.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl DiagnosticsConfig {
    /// All checks switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Read `diagnostics.*` keys, falling back to defaults.
    pub fn from_snapshot(config: &PixConfigSnapshot) -> Self {
        let defaults = Self::default();
        Self {
            enabled: config.get_bool_or("diagnostics.enabled", defaults.enabled),
            probe: config.get_bool_or("diagnostics.probe", defaults.probe),
            probe_path: config
                .get_string("diagnostics.probe_path")
                .map(PathBuf::from)
                .unwrap_or(defaults.probe_path),
            list_bucket: config.get_bool_or("diagnostics.list_bucket", defaults.list_bucket),
            fetch_object: config.get_bool_or("diagnostics.fetch_object", defaults.fetch_object),
            object_key: config.get_string_or("diagnostics.object_key", &defaults.object_key),
            timeout: config
                .get_u64("diagnostics.timeout_ms")
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
        }
    }

    pub fn with_probe_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.probe_path = path.into();
        self
    }

    pub fn with_object_key<S: Into<String>>(mut self, key: S) -> Self {
        self.object_key = key.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn without_probe(mut self) -> Self {
        self.probe = false;
        self
    }
}

/// Outcome of one diagnostics pass. `None` means the check was skipped.
#[derive(Debug, Default)]
pub struct DiagnosticsReport {
    pub probe: Option<Result<ProbeReport, PixError>>,
    pub listing: Option<Result<Vec<String>, PixError>>,
    pub object: Option<Result<ImageMetadata, PixError>>,
}

impl DiagnosticsReport {
    pub fn failures(&self) -> usize {
        [
            self.probe.as_ref().is_some_and(|r| r.is_err()),
            self.listing.as_ref().is_some_and(|r| r.is_err()),
            self.object.as_ref().is_some_and(|r| r.is_err()),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count()
    }
}

/// Runs the diagnostic checks against an optional object store.
pub struct Diagnostics {
    config: DiagnosticsConfig,
    retrieval: Option<Arc<ObjectRetrieval>>,
}

impl Diagnostics {
    pub fn new(config: DiagnosticsConfig, retrieval: Option<Arc<ObjectRetrieval>>) -> Self {
        Self { config, retrieval }
    }

    pub fn disabled() -> Self {
        Self::new(DiagnosticsConfig::disabled(), None)
    }

    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    /// Run every enabled check in order. Never fails.
    pub async fn run(&self, cancel: &CancellationToken) -> DiagnosticsReport {
        let mut report = DiagnosticsReport::default();
        if !self.config.enabled {
            return report;
        }

        if self.config.probe {
            report.probe = Some(self.probe(cancel).await);
        }

        if let Some(retrieval) = &self.retrieval {
            if self.config.list_bucket {
                report.listing = Some(self.list_bucket(retrieval, cancel).await);
            }
            if self.config.fetch_object {
                report.object = Some(self.fetch_object(retrieval, cancel).await);
            }
        }

        report
    }

    async fn probe(&self, cancel: &CancellationToken) -> Result<ProbeReport, PixError> {
        let path = self.config.probe_path.clone();
        let outcome = self
            .bounded(cancel, async {
                probe_dependencies_blocking(path)
                    .await
                    .map_err(|e| PixError::dependency_probe(e.to_string()))
            })
            .await;

        match &outcome {
            Ok(report) => info!(
                path = %report.path.display(),
                entries = ?report.entries,
                "dependency layer can be accessed"
            ),
            Err(err) => error!(error = %err.message, "failed to access the dependencies from the layer"),
        }
        outcome
    }

    async fn list_bucket(
        &self,
        retrieval: &ObjectRetrieval,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, PixError> {
        let outcome = self
            .bounded(cancel, async {
                retrieval.list_keys(cancel).await.map_err(blob_to_pix)
            })
            .await;

        match &outcome {
            Ok(keys) if keys.is_empty() => {
                info!(bucket = retrieval.bucket(), "bucket is empty or no contents found");
            }
            Ok(keys) => info!(
                bucket = retrieval.bucket(),
                count = keys.len(),
                keys = ?keys,
                "files in the bucket"
            ),
            Err(err) => error!(bucket = retrieval.bucket(), error = %err.message, "error listing bucket files"),
        }
        outcome
    }

    async fn fetch_object(
        &self,
        retrieval: &ObjectRetrieval,
        cancel: &CancellationToken,
    ) -> Result<ImageMetadata, PixError> {
        let key = self.config.object_key.as_str();
        let outcome = self
            .bounded(cancel, async {
                retrieval
                    .fetch_image_metadata(key, cancel)
                    .await
                    .map_err(blob_to_pix)
            })
            .await;

        match &outcome {
            Ok(meta) => info!(
                key,
                file_size = %meta
                    .declared_byte_length
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "Unknown".to_string()),
                width = ?meta.width,
                height = ?meta.height,
                format = ?meta.format,
                "retrieved image metadata"
            ),
            Err(err) => error!(key, error = %err.message, "error retrieving or processing the image"),
        }
        outcome
    }

    /// Apply the diagnostics deadline and cancellation to one check.
    async fn bounded<T, F>(&self, cancel: &CancellationToken, check: F) -> Result<T, PixError>
    where
        F: Future<Output = Result<T, PixError>>,
    {
        let deadline = self.config.timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PixError::transport("diagnostics cancelled")),
            res = tokio::time::timeout(deadline, check) => match res {
                Ok(inner) => inner,
                Err(_) => Err(PixError::transport(format!(
                    "diagnostic check exceeded {}ms",
                    deadline.as_millis()
                ))),
            },
        }
    }
}

/// Transport problems stay transport failures; anything wrong with the
/// content itself is an unsupported or corrupt image.
fn blob_to_pix(err: BlobError) -> PixError {
    if err.is_transport() {
        PixError::transport(err.to_string())
    } else {
        PixError::unsupported_image(err.to_string())
    }
}
