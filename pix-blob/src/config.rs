use std::time::Duration;

/// Configuration for object retrieval
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Absolute max size accepted when aggregating a single object (safety guard)
    pub max_blob_bytes: u64,

    /// Deadline for each individual store call, including draining the body
    pub request_timeout: Duration,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            max_blob_bytes: 25 * 1024 * 1024, // 25MB
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl BlobConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max blob size
    pub fn with_max_blob_bytes(mut self, bytes: u64) -> Self {
        self.max_blob_bytes = bytes;
        self
    }

    /// Set the per-call deadline
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
