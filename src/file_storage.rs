//! Local file-storage collaborator consumed by the upload flow.
//!
//! The upload flow waits on exactly one read outcome per requested path, so
//! the seam is a single awaited call with a success/failure result rather
//! than a pair of racing events.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{DriveError, Result};

/// Source of local file content for uploads.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Read the text content stored under `path`. The upload flow blocks on
    /// this call; no timeout is imposed here.
    async fn read_file(&self, path: &str) -> Result<String>;
}

/// Directory-rooted file storage.
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn read_file(&self, path: &str) -> Result<String> {
        let full_path = self.root.join(path);
        tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|err| DriveError::FileReadError(format!("{}: {}", path, err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("main.py")).unwrap();
        file.write_all(b"print('hello')").unwrap();

        let storage = LocalFileStorage::new(dir.path());
        let content = storage.read_file("main.py").await.unwrap();
        assert_eq!(content, "print('hello')");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        let err = storage.read_file("missing.py").await.unwrap_err();
        match err {
            DriveError::FileReadError(message) => assert!(message.contains("missing.py")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
