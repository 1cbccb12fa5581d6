use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default location of the shared dependency layer.
pub const DEFAULT_PROBE_PATH: &str = "/opt/nodejs/node22/node_modules";

/// What the dependency directory contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub path: PathBuf,
    pub entries: Vec<String>,
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to access the dependencies at {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dependency probe was interrupted: {0}")]
    Interrupted(String),
}

/// List the entries of `path`, sorted by name.
pub fn probe_dependencies(path: &Path) -> Result<ProbeReport, ProbeError> {
    let unreadable = |source: std::io::Error| ProbeError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(path).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        entries.push(entry.file_name().to_string_lossy().into_owned());
    }
    entries.sort();

    Ok(ProbeReport {
        path: path.to_path_buf(),
        entries,
    })
}

/// [`probe_dependencies`] on the blocking pool.
pub async fn probe_dependencies_blocking(path: PathBuf) -> Result<ProbeReport, ProbeError> {
    tokio::task::spawn_blocking(move || probe_dependencies(&path))
        .await
        .map_err(|e| ProbeError::Interrupted(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_directory_entries_sorted() {
        let dir = std::env::temp_dir().join(format!("pix-probe-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("sharp")).unwrap();
        std::fs::write(dir.join("aws-sdk"), b"").unwrap();

        let report = probe_dependencies(&dir).unwrap();
        assert_eq!(report.entries, vec!["aws-sdk", "sharp"]);
        assert_eq!(report.path, dir);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = std::env::temp_dir().join(format!("pix-missing-{}", uuid::Uuid::new_v4()));
        let err = probe_dependencies_blocking(dir.clone()).await.unwrap_err();

        match err {
            ProbeError::Unreadable { path, source } => {
                assert_eq!(path, dir);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
