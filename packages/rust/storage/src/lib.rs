//! Durable key/value storage for application state.
//!
//! [`KvStore`] is the small surface the state store needs: string values
//! under string keys. [`FileStore`] keeps one JSON file per key in a data
//! directory; [`MemoryStore`] keeps everything in a map and is used in tests.
//!
//! **Write rules:**
//! - [`FileStore::set`] writes a temporary sibling file and renames it over the
//!   target, so a reader never observes a half-written document.
//! - Keys are restricted to `[A-Za-z0-9._-]` so they map to plain file names.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use amzwp_shared::{AmzWpError, Result};
use uuid::Uuid;

/// String key/value storage.
pub trait KvStore: Send + Sync {
    /// Read the value under `key`, or `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<T: KvStore + ?Sized> KvStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` as the data directory. It is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        check_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AmzWpError::io(path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| AmzWpError::io(&self.dir, e))?;

        let tmp = self.dir.join(format!(".{key}.{}.tmp", Uuid::now_v7()));
        std::fs::write(&tmp, value).map_err(|e| AmzWpError::io(&tmp, e))?;

        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(AmzWpError::io(path, e));
        }

        tracing::trace!(?path, bytes = value.len(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(?path, "removed stored value");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AmzWpError::io(path, e)),
        }
    }
}

fn check_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(AmzWpError::Storage(format!("invalid storage key '{key}'")))
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| AmzWpError::Storage("memory store lock poisoned".into()))
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("amzwp-storage-test-{}", Uuid::now_v7()))
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = temp_dir();
        let store = FileStore::new(&dir);

        assert_eq!(store.get("amzwp-store-v1").unwrap(), None);
        store.set("amzwp-store-v1", r#"{"hasEntered":true}"#).unwrap();
        assert_eq!(
            store.get("amzwp-store-v1").unwrap().as_deref(),
            Some(r#"{"hasEntered":true}"#)
        );
        assert!(dir.join("amzwp-store-v1.json").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_overwrites_and_leaves_no_temp_files() {
        let dir = temp_dir();
        let store = FileStore::new(&dir);

        store.set("state", "one").unwrap();
        store.set("state", "two").unwrap();
        assert_eq!(store.get("state").unwrap().as_deref(), Some("two"));

        let leftovers: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_remove_is_idempotent() {
        let dir = temp_dir();
        let store = FileStore::new(&dir);

        store.remove("missing").unwrap();
        store.set("state", "x").unwrap();
        store.remove("state").unwrap();
        assert_eq!(store.get("state").unwrap(), None);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let store = FileStore::new(temp_dir());
        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("a/b").is_err());
        assert!(store.get("").is_err());
        assert!(store.get(".hidden").is_err());
    }

    #[test]
    fn memory_store_through_arc() {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<MemoryStore> = Arc::clone(&store);

        shared.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(shared.get("k").unwrap(), None);
    }
}
