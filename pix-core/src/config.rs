//! # pix Configuration
//!
//! A minimal string key/value store. Keys are dotted (`http.port`,
//! `diagnostics.timeout_ms`) and values are parsed on read through a
//! snapshot, so the store itself never fails.
//!
//! ```rust
//! use pix_core::PixConfig;
//!
//! let mut config = PixConfig::new();
//! config.set("http.port", "3030");
//!
//! let snapshot = config.snapshot();
//! assert_eq!(snapshot.get_u64("http.port"), Some(3030));
//! ```
//!
//! ## Environment overrides
//! `load_env` maps prefixed variables onto dotted keys:
//!
//! ```bash
//! export PIX__DIAGNOSTICS__TIMEOUT_MS=2000   # diagnostics.timeout_ms
//! ```

use std::collections::HashMap;

/// Default environment prefix used by the server binary.
pub const ENV_PREFIX: &str = "PIX__";

#[derive(Debug, Default, Clone)]
pub struct PixConfig {
    values: HashMap<String, String>,
}

impl PixConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Set a key only when it is not already present.
    pub fn set_default<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Check whether a key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Load every variable starting with `prefix`.
    ///
    /// `PIX__STORAGE__BUCKET` becomes `storage.bucket`.
    pub fn load_env(&mut self, prefix: &str) {
        self.load_vars(prefix, std::env::vars());
    }

    /// Same as [`load_env`](Self::load_env) over an explicit iterator.
    pub fn load_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                if stripped.is_empty() {
                    continue;
                }
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
            }
        }
    }

    pub fn snapshot(&self) -> PixConfigSnapshot {
        PixConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PixConfigSnapshot {
    map: HashMap<String, String>,
}

impl PixConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    /// Accepts `true/false`, `1/0`, `yes/no`, `on/off` (case-insensitive).
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        let value = self.get(key)?.trim().to_ascii_lowercase();
        match value.as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        }
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    pub fn get_u64_or(&self, key: &str, default: u64) -> u64 {
        self.get_u64(key).unwrap_or(default)
    }
}
