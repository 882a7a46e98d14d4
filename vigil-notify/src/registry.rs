//! Persisted subscriber registry
//!
//! The registry file is the single source of truth: a JSON array of
//! subscriber ids, re-read on every `list` call with no in-process cache.
//! Mutations hold a mutex across the whole read-modify-write and land with a
//! temp-file-then-rename replace, so concurrent `add`/`remove` calls cannot
//! lose updates and a concurrent reader never observes a torn file.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use vigil_core::{SharedTelemetry, SubscriberId};

/// Result of an `add` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// Result of a `remove` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotPresent,
}

/// Errors from registry mutations.
///
/// Reads never error: an absent or unreadable file degrades to the empty set.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to persist registry: {0}")]
    Write(#[from] io::Error),

    #[error("failed to encode registry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisted set of subscriber identities
pub struct SubscriberRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
    telemetry: SharedTelemetry,
}

impl SubscriberRegistry {
    pub fn new(path: impl Into<PathBuf>, telemetry: SharedTelemetry) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            telemetry,
        }
    }

    /// Location of the registry file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current subscriber set, reloaded from disk on every call.
    ///
    /// An absent, unreadable or corrupt file yields the empty set.
    pub fn list(&self) -> BTreeSet<SubscriberId> {
        self.load()
    }

    /// Register a subscriber. Idempotent: a present id performs no write.
    pub async fn add(&self, id: SubscriberId) -> Result<AddOutcome, RegistryError> {
        let _guard = self.write_lock.lock().await;

        let mut ids = self.load();
        if !ids.insert(id) {
            return Ok(AddOutcome::AlreadyPresent);
        }

        self.persist(&ids)?;
        debug!("Subscriber {} added ({} total)", id, ids.len());
        Ok(AddOutcome::Added)
    }

    /// Deregister a subscriber. Idempotent: an absent id performs no write.
    pub async fn remove(&self, id: SubscriberId) -> Result<RemoveOutcome, RegistryError> {
        let _guard = self.write_lock.lock().await;

        let mut ids = self.load();
        if !ids.remove(&id) {
            return Ok(RemoveOutcome::NotPresent);
        }

        self.persist(&ids)?;
        debug!("Subscriber {} removed ({} total)", id, ids.len());
        Ok(RemoveOutcome::Removed)
    }

    fn load(&self) -> BTreeSet<SubscriberId> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return BTreeSet::new(),
            Err(e) => {
                warn!("Registry {} is unreadable: {}", self.path.display(), e);
                self.telemetry
                    .capture_error("registry", &format!("read failed: {}", e));
                return BTreeSet::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Registry {} is corrupt: {}", self.path.display(), e);
                self.telemetry
                    .capture_error("registry", &format!("decode failed: {}", e));
                BTreeSet::new()
            }
        }
    }

    /// Serialize the full set and replace the file atomically.
    fn persist(&self, ids: &BTreeSet<SubscriberId>) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let encoded = serde_json::to_string_pretty(ids)?;
        let temp = self.path.with_extension(format!("tmp.{}", Uuid::new_v4()));
        fs::write(&temp, encoded)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;
    use vigil_core::log_telemetry;

    fn registry(dir: &Path) -> SubscriberRegistry {
        SubscriberRegistry::new(dir.join("ids.json"), log_telemetry())
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let dir = tempdir().unwrap();
        let registry = registry(dir.path());
        let id = SubscriberId(7);

        assert_eq!(registry.add(id).await.unwrap(), AddOutcome::Added);
        assert_eq!(registry.add(id).await.unwrap(), AddOutcome::AlreadyPresent);

        let ids = registry.list();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains(&id));
    }

    #[tokio::test]
    async fn test_remove_of_absent_id() {
        let dir = tempdir().unwrap();
        let registry = registry(dir.path());

        registry.add(SubscriberId(1)).await.unwrap();
        let before = registry.list();

        assert_eq!(
            registry.remove(SubscriberId(99)).await.unwrap(),
            RemoveOutcome::NotPresent
        );
        assert_eq!(registry.list(), before);
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ids.json");

        let first = SubscriberRegistry::new(&path, log_telemetry());
        first.add(SubscriberId(3)).await.unwrap();
        first.add(SubscriberId(1)).await.unwrap();
        first.add(SubscriberId(2)).await.unwrap();
        drop(first);

        let reloaded = SubscriberRegistry::new(&path, log_telemetry());
        let ids: Vec<i64> = reloaded.list().iter().map(|id| id.as_i64()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_missing_file_lists_empty() {
        let dir = tempdir().unwrap();
        assert!(registry(dir.path()).list().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_lists_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ids.json");
        fs::write(&path, "not json at all").unwrap();

        let registry = SubscriberRegistry::new(&path, log_telemetry());
        assert!(registry.list().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_adds_both_persist() {
        let dir = tempdir().unwrap();
        let registry = Arc::new(registry(dir.path()));

        let a = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.add(SubscriberId(10)).await })
        };
        let b = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.add(SubscriberId(20)).await })
        };

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let ids = registry.list();
        assert!(ids.contains(&SubscriberId(10)));
        assert!(ids.contains(&SubscriberId(20)));
    }

    #[tokio::test]
    async fn test_file_is_a_json_array_of_integers() {
        let dir = tempdir().unwrap();
        let registry = registry(dir.path());

        registry.add(SubscriberId(5)).await.unwrap();
        registry.add(SubscriberId(6)).await.unwrap();

        let raw = fs::read_to_string(registry.path()).unwrap();
        let parsed: Vec<i64> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, vec![5, 6]);
    }
}
