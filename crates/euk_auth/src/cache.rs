use euk_constants::{PERMISSION_CACHE_PREFIX, PERMISSION_CACHE_TTL_MS};
use euk_error::CacheError;
use euk_settings::config::{CacheBackend, CacheSettings};
use euk_types::PermissionSet;
use euk_utils::utils::get_utc_timestamp_millis;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// String key-value storage that outlives a single guard evaluation
pub trait PermissionStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), CacheError>;
    fn remove_item(&self, key: &str) -> Result<(), CacheError>;
    fn keys(&self) -> Result<Vec<String>, CacheError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // entries are replaced whole, a poisoned map is still consistent
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PermissionStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.items().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), CacheError> {
        self.items().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.items().keys().cloned().collect())
    }
}

/// Directory backed store, one `<key>.json` file per entry
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

const LOCAL_STORE_SUFFIX: &str = ".json";

impl LocalStore {
    pub fn new(root: &Path) -> Result<Self, CacheError> {
        if !root.exists() {
            fs::create_dir_all(root)?;
        }

        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn item_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(CacheError::Error(format!("Invalid cache key: {}", key)));
        }
        Ok(self.root.join(format!("{}{}", key, LOCAL_STORE_SUFFIX)))
    }
}

impl PermissionStore for LocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.item_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let path = self.item_path(key)?;

        // each write gets its own temp file, the last rename wins
        let mut tmp_file = NamedTempFile::new_in(&self.root)?;
        tmp_file.write_all(value.as_bytes())?;
        tmp_file
            .persist(&path)
            .map_err(|e| CacheError::Io(e.error))?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), CacheError> {
        let path = self.item_path(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(key) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.strip_suffix(LOCAL_STORE_SUFFIX))
            {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }
}

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        get_utc_timestamp_millis()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Persisted cache record, `{ "data": ..., "timestamp": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: PermissionSet,
    pub timestamp: i64,
}

/// Per user permission cache with a fixed five minute lifetime
#[derive(Clone)]
pub struct PermissionCache {
    store: Arc<dyn PermissionStore>,
    clock: Arc<dyn Clock>,
}

impl PermissionCache {
    pub fn new(store: Arc<dyn PermissionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock))
    }

    pub fn from_settings(settings: &CacheSettings) -> Result<Self, CacheError> {
        let store: Arc<dyn PermissionStore> = match settings.backend {
            CacheBackend::Memory => Arc::new(MemoryStore::new()),
            CacheBackend::Local => Arc::new(LocalStore::new(&settings.cache_dir)?),
        };

        Ok(Self::new(store, Arc::new(SystemClock)))
    }

    pub fn cache_key(user_id: i64) -> String {
        format!("{}{}", PERMISSION_CACHE_PREFIX, user_id)
    }

    /// Stored timestamps are untrusted, an age that overflows or is negative is stale
    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.clock
            .now_millis()
            .checked_sub(entry.timestamp)
            .is_some_and(|age| (0..PERMISSION_CACHE_TTL_MS).contains(&age))
    }

    /// Fresh entry for `user_id`, if any.
    /// Expired, unreadable and corrupt entries all count as a miss and are left in place.
    pub fn get_entry(&self, user_id: i64) -> Option<CacheEntry> {
        let key = Self::cache_key(user_id);

        let raw = match self.store.get_item(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read cached permissions for {}: {}", key, e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error parsing cached permissions for {}: {}", key, e);
                return None;
            }
        };

        if !self.is_fresh(&entry) {
            debug!("Cached permissions for {} expired", key);
            return None;
        }

        Some(entry)
    }

    pub fn get(&self, user_id: i64) -> Option<PermissionSet> {
        self.get_entry(user_id).map(|entry| entry.data)
    }

    /// Store `permissions` under `user_id`, replacing any earlier entry
    pub fn put(&self, user_id: i64, permissions: &PermissionSet) -> Result<(), CacheError> {
        let entry = CacheEntry {
            data: permissions.clone(),
            timestamp: self.clock.now_millis(),
        };

        let raw =
            serde_json::to_string(&entry).map_err(|e| CacheError::Serialization(e.to_string()))?;

        self.store.set_item(&Self::cache_key(user_id), &raw)
    }

    /// Remove one user's entry, or every permission entry when `user_id` is `None`.
    /// Keys outside the `permissions_` namespace are never touched.
    pub fn clear(&self, user_id: Option<i64>) -> Result<(), CacheError> {
        match user_id {
            Some(id) => self.store.remove_item(&Self::cache_key(id)),
            None => {
                for key in self.store.keys()? {
                    if key.starts_with(PERMISSION_CACHE_PREFIX) {
                        self.store.remove_item(&key)?;
                    }
                }
                Ok(())
            }
        }
    }
}
