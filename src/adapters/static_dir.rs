use crate::domain::ports::HostingProvider;
use crate::utils::error::{ReaperError, Result};
use crate::utils::validation::validate_artifact_key;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Sub-directory the publisher writes rendered pages into.
pub const ARTIFACT_DIR: &str = "portfolios";

/// Portfolios served as `{root}/portfolios/{key}.html` from a static directory.
#[derive(Debug, Clone)]
pub struct StaticDirHosting {
    base_path: PathBuf,
}

impl StaticDirHosting {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn artifact_path(&self, key: &str) -> PathBuf {
        artifact_path(&self.base_path, key)
    }
}

pub fn artifact_path(base_path: &Path, key: &str) -> PathBuf {
    base_path.join(ARTIFACT_DIR).join(format!("{}.html", key))
}

#[async_trait]
impl HostingProvider for StaticDirHosting {
    fn name(&self) -> &str {
        "static_dir"
    }

    async fn delete_artifact(&self, key: &str) -> Result<()> {
        validate_artifact_key(key).map_err(|e| ReaperError::HostingFailure {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let full_path = self.artifact_path(key);
        match tokio::fs::remove_file(&full_path).await {
            Ok(()) => {
                tracing::debug!(key, path = %full_path.display(), "Removed artifact");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(key, path = %full_path.display(), "Artifact already absent");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                Err(ReaperError::HostingNotAuthorized {
                    key: key.to_string(),
                    message: format!("{}: {}", full_path.display(), e),
                })
            }
            Err(e) => Err(ReaperError::IoError(e)),
        }
    }
}
