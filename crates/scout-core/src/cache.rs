//! Local durable cache.
//!
//! A key-value store that survives process restarts. It holds the last known
//! snapshot of every remote collection, the pending mutation queues, and a few
//! user preferences. Values are independently keyed JSON documents; there are
//! no transactions and no expiry.
//!
//! Storage is non-failing by contract: an unreadable or missing document reads
//! as "empty", and a failed write is logged and dropped.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::DEFAULT_EVENT_KEY;
use crate::error::Result;
use crate::util::normalize_text_option;

/// Storage keys used by Scout clients.
pub mod keys {
    pub const PENDING_ENTRIES: &str = "pending_entries";
    pub const PENDING_PIT_ENTRIES: &str = "pending_pit_entries";
    pub const ENTRIES_CACHE: &str = "entries_cache";
    pub const PIT_CACHE: &str = "pit_cache";
    pub const PICKLIST_CACHE: &str = "picklist_cache";
    pub const CURRENT_EVENT_KEY: &str = "current_event_key";
    pub const SCOUT_DISPLAY_NAME: &str = "scout_display_name";
}

/// Raw byte storage addressed by key.
pub trait LocalStore: Send + Sync {
    /// Read the document stored under `key`, `None` when absent or unreadable
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Replace the document stored under `key`
    fn set(&self, key: &str, value: &[u8]);
}

/// `LocalStore` keeping one file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }

    fn write_atomically(&self, key: &str, value: &[u8]) -> io::Result<()> {
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(value)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Some(bytes),
            Err(error) if error.kind() == io::ErrorKind::NotFound => None,
            Err(error) => {
                tracing::warn!(key, "Failed to read cached document: {error}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &[u8]) {
        if let Err(error) = self.write_atomically(key, value) {
            tracing::warn!(
                key,
                dir = %self.dir.display(),
                "Failed to persist cached document: {error}"
            );
        }
    }
}

/// In-process `LocalStore`, used for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &[u8]) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_vec());
    }
}

/// Typed JSON view over a `LocalStore`.
#[derive(Clone)]
pub struct DurableCache {
    store: Arc<dyn LocalStore>,
}

impl DurableCache {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Deserialize the document under `key`; a corrupt document reads as `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.store.get(key)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(key, "Ignoring unreadable cached document: {error}");
                None
            }
        }
    }

    /// Serialize `value` and overwrite the document under `key`.
    pub fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.store.set(key, &bytes),
            Err(error) => tracing::warn!(key, "Failed to serialize cached document: {error}"),
        }
    }
}

impl std::fmt::Debug for DurableCache {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("DurableCache").finish_non_exhaustive()
    }
}

/// Small user preferences kept next to the data caches.
#[derive(Debug, Clone)]
pub struct Preferences {
    cache: DurableCache,
}

impl Preferences {
    pub const fn new(cache: DurableCache) -> Self {
        Self { cache }
    }

    /// Active competition key, falling back to the built-in default
    pub fn event_key(&self) -> String {
        self.cache
            .load::<String>(keys::CURRENT_EVENT_KEY)
            .and_then(|key| normalize_text_option(Some(key)))
            .unwrap_or_else(|| DEFAULT_EVENT_KEY.to_string())
    }

    pub fn set_event_key(&self, key: &str) {
        self.cache.store(keys::CURRENT_EVENT_KEY, key.trim());
    }

    /// Display name attached to new entries
    pub fn scout_name(&self) -> Option<String> {
        self.cache
            .load::<String>(keys::SCOUT_DISPLAY_NAME)
            .and_then(|name| normalize_text_option(Some(name)))
    }

    pub fn set_scout_name(&self, name: &str) {
        self.cache.store(keys::SCOUT_DISPLAY_NAME, name.trim());
    }
}
