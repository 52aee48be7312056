//! Artifact writing.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use stylepress_shared::CompileError;

/// Metadata for a written artifact.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ArtifactMeta {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: usize,
}

impl ArtifactMeta {
    pub fn new(path: impl Into<PathBuf>, content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());

        Self {
            path: path.into(),
            sha256: format!("{:x}", hasher.finalize()),
            size_bytes: content.len(),
        }
    }
}

/// Writes compiled artifacts.
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    /// Write `content` to `path`, creating parent directories as needed.
    async fn write(&self, path: &Path, content: &str) -> Result<(), CompileError>;
}

/// Writes artifacts to the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsArtifactWriter;

#[async_trait]
impl ArtifactWriter for FsArtifactWriter {
    async fn write(&self, path: &Path, content: &str) -> Result<(), CompileError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CompileError::filesystem(parent, e))?;
        }

        tokio::fs::write(path, content)
            .await
            .map_err(|e| CompileError::filesystem(path, e))?;

        debug!(path = %path.display(), size = content.len(), "wrote artifact");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("sp-writer-test-{}", uuid::Uuid::now_v7()))
    }

    #[tokio::test]
    async fn creates_missing_directories() {
        let root = temp_dir();
        let target = root.join("dist").join("ui").join("main.css");

        FsArtifactWriter.write(&target, ".a{}").await.unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), ".a{}");

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn io_failures_become_filesystem_errors() {
        let root = temp_dir();
        std::fs::create_dir_all(&root).unwrap();
        // A directory where the file should go.
        let target = root.join("main.css");
        std::fs::create_dir_all(&target).unwrap();

        let err = FsArtifactWriter.write(&target, ".a{}").await.unwrap_err();
        assert!(matches!(err, CompileError::Filesystem { .. }));

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn artifact_meta_hashes_content() {
        let meta = ArtifactMeta::new("/out/main.css", "hello world");
        assert_eq!(meta.size_bytes, 11);
        assert_eq!(
            meta.sha256,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }
}
