use pix_axum::app::DEFAULT_MAX_BODY_BYTES;
use pix_core::{PixConfig, ENV_PREFIX};

pub const DEFAULT_BUCKET: &str = "fiscalismia-image-storage";

/// Defaults for every key the server reads.
pub fn defaults() -> PixConfig {
    let mut config = PixConfig::new();
    config.set_default("http.host", "127.0.0.1");
    config.set_default("http.port", "3030");
    config.set_default("http.max_body_bytes", DEFAULT_MAX_BODY_BYTES.to_string());
    config.set_default("log.format", "text");
    config.set_default("storage.backend", "s3");
    config.set_default("storage.region", "eu-central-1");
    config.set_default("storage.bucket", DEFAULT_BUCKET);
    config.set_default("blob.max_bytes", (25 * 1024 * 1024).to_string());
    config.set_default("blob.request_timeout_ms", "10000");
    config
}

/// Defaults overlaid with `PIX__*` environment variables.
pub fn load() -> PixConfig {
    let mut config = defaults();
    config.load_env(ENV_PREFIX);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_overrides_defaults() {
        let mut config = defaults();
        config.load_vars(
            ENV_PREFIX,
            vec![
                ("PIX__HTTP__PORT".to_string(), "8080".to_string()),
                ("PIX__STORAGE__BACKEND".to_string(), "memory".to_string()),
            ],
        );

        let snapshot = config.snapshot();
        assert_eq!(snapshot.get_u64("http.port"), Some(8080));
        assert_eq!(snapshot.get("storage.backend"), Some("memory"));
        assert_eq!(snapshot.get("storage.bucket"), Some(DEFAULT_BUCKET));
    }
}
