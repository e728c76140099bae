use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use super::traits::LogSource;
use crate::errors::CoreError;

/// Serves logs from a local directory tree, e.g. a copy of the site's
/// `logs/` folder. Fetcher paths are resolved relative to `root`, so both
/// `/logs/x.json` and `logs/x.json` map to `<root>/logs/x.json`.
///
/// A missing file answers like a 404 so the fetcher's fallback logic behaves
/// the same as over HTTP.
pub struct FileLogSource {
    root: PathBuf,
}

impl FileLogSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, CoreError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(CoreError::ValidationError(format!(
                "Log path '{path}' escapes the log root"
            )));
        }
        Ok(self.root.join(relative))
    }
}

fn map_io(path: &str, e: std::io::Error) -> CoreError {
    if e.kind() == ErrorKind::NotFound {
        CoreError::HttpStatus {
            url: path.to_string(),
            status: 404,
        }
    } else {
        CoreError::FileIO(format!("{path}: {e}"))
    }
}

#[async_trait]
impl LogSource for FileLogSource {
    fn name(&self) -> &str {
        "File"
    }

    async fn fetch_json(&self, path: &str, timeout: Duration) -> Result<Value, CoreError> {
        let full = self.resolve(path)?;
        let bytes = tokio::time::timeout(timeout, tokio::fs::read(&full))
            .await
            .map_err(|_| CoreError::Timeout {
                url: path.to_string(),
            })?
            .map_err(|e| map_io(path, e))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::Deserialization(format!("Failed to parse {path}: {e}")))
    }

    async fn probe(&self, path: &str, timeout: Duration) -> Result<(), CoreError> {
        let full = self.resolve(path)?;
        let meta = tokio::time::timeout(timeout, tokio::fs::metadata(&full))
            .await
            .map_err(|_| CoreError::Timeout {
                url: path.to_string(),
            })?
            .map_err(|e| map_io(path, e))?;

        if meta.is_file() {
            Ok(())
        } else {
            Err(CoreError::HttpStatus {
                url: path.to_string(),
                status: 404,
            })
        }
    }
}
