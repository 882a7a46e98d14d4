//! Artifact store
//!
//! Holds the latest screenshot and HTML snapshot at fixed paths, overwritten
//! on each inspection. No history, no versioning. Writes go to a temporary
//! file first and land with an atomic rename, so a concurrent reader never
//! sees a partial artifact.

use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use vigil_core::{SCREENSHOT_FILENAME, SNAPSHOT_FILENAME};

/// Fixed-location store for the latest inspection artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the latest screenshot
    pub fn screenshot_path(&self) -> PathBuf {
        self.dir.join(SCREENSHOT_FILENAME)
    }

    /// Path of the latest HTML snapshot
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILENAME)
    }

    /// Overwrite the stored screenshot.
    pub fn save_screenshot(&self, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.screenshot_path();
        self.write_atomic(&path, bytes)?;
        Ok(path)
    }

    /// Overwrite the stored HTML snapshot, returning its hex sha256 digest.
    pub fn save_snapshot(&self, html: &str) -> io::Result<String> {
        self.write_atomic(&self.snapshot_path(), html.as_bytes())?;

        let mut hasher = Sha256::new();
        hasher.update(html.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let temp = path.with_extension(format!("tmp.{}", Uuid::new_v4()));
        fs::write(&temp, bytes)?;
        fs::rename(&temp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_is_overwritten() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.save_snapshot("<html>first</html>").unwrap();
        store.save_snapshot("<html>second</html>").unwrap();

        let contents = fs::read_to_string(store.snapshot_path()).unwrap();
        assert_eq!(contents, "<html>second</html>");

        // Only the two fixed artifact names may exist, no temp leftovers
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_snapshot_digest_is_stable() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let a = store.save_snapshot("<html>same</html>").unwrap();
        let b = store.save_snapshot("<html>same</html>").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_screenshot_roundtrip() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let path = store.save_screenshot(&[0xFF, 0xD8, 0xFF]).unwrap();
        assert_eq!(fs::read(path).unwrap(), vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_store_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nested/files"));
        assert!(store.save_snapshot("<html></html>").is_ok());
    }
}
