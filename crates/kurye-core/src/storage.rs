//! Device-local key-value storage.
//!
//! Values are stored as plain strings; structured values are JSON-encoded by
//! [`get_json`] and [`set_json`]. There is no schema versioning: a value that
//! no longer decodes is reported as [`StorageError::Decode`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt storage file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not decode stored value for '{key}': {source}")]
    Decode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode value for '{key}': {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage lock poisoned")]
    Poisoned,
}

/// The keys the client persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Token,
    User,
    DefaultDepot,
    NotificationSettings,
}

impl StorageKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::Token => "token",
            StorageKey::User => "user",
            StorageKey::DefaultDepot => "defaultDepot",
            StorageKey::NotificationSettings => "notificationSettings",
        }
    }
}

/// String key-value persistence, shared across tasks.
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store cannot be read.
    fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store cannot be written.
    fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store cannot be written.
    fn remove(&self, key: StorageKey) -> Result<(), StorageError>;
}

/// Reads and JSON-decodes a stored value.
///
/// # Errors
///
/// Returns [`StorageError::Decode`] if the stored string is not valid JSON
/// for `T`, or any error from the store itself.
pub fn get_json<T, S>(store: &S, key: StorageKey) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Decode {
                key: key.as_str(),
                source,
            }),
    }
}

/// JSON-encodes and stores a value.
///
/// # Errors
///
/// Returns [`StorageError::Encode`] if `value` cannot be serialized, or any
/// error from the store itself.
pub fn set_json<T, S>(store: &S, key: StorageKey, value: &T) -> Result<(), StorageError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.as_str(),
        source,
    })?;
    store.set(key, &raw)
}

/// In-process store, used in tests and as a fallback when no path is set.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<&'static str, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key.as_str()).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.as_str(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key.as_str());
        Ok(())
    }
}

/// Store backed by a single JSON object file.
///
/// Every write rewrites the whole file through a sibling temp file and a
/// rename, so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_vec_pretty(entries).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }

    fn update<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.read_all()?;
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.read_all()?.remove(key.as_str()))
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.as_str().to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key.as_str());
        })
    }
}

/// Warehouse the courier starts routes from, chosen in the profile screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultDepot {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Notification toggles, stored under `notificationSettings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub push_notifications: bool,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub order_updates: bool,
    pub route_updates: bool,
    pub promotions: bool,
    pub sounds: bool,
    pub vibration: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            push_notifications: true,
            email_notifications: true,
            sms_notifications: false,
            order_updates: true,
            route_updates: true,
            promotions: false,
            sounds: true,
            vibration: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "kurye-storage-{name}-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        path.push("storage.json");
        path
    }

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get(StorageKey::Token).unwrap(), None);
        store.set(StorageKey::Token, "abc").unwrap();
        assert_eq!(store.get(StorageKey::Token).unwrap().as_deref(), Some("abc"));
        store.remove(StorageKey::Token).unwrap();
        store.remove(StorageKey::Token).unwrap();
        assert_eq!(store.get(StorageKey::Token).unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let path = temp_path("persist");
        let depot = DefaultDepot {
            name: "Istanbul Merkez Depo".to_owned(),
            latitude: 41.0082,
            longitude: 28.9784,
        };
        {
            let store = JsonFileStore::new(&path);
            store.set(StorageKey::Token, "tok-1").unwrap();
            set_json(&store, StorageKey::DefaultDepot, &depot).unwrap();
        }
        let reopened = JsonFileStore::new(&path);
        assert_eq!(
            reopened.get(StorageKey::Token).unwrap().as_deref(),
            Some("tok-1")
        );
        let loaded: Option<DefaultDepot> = get_json(&reopened, StorageKey::DefaultDepot).unwrap();
        assert_eq!(loaded, Some(depot));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"defaultDepot\""), "keys are stored by name: {raw}");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let store = JsonFileStore::new(temp_path("missing"));
        assert_eq!(store.get(StorageKey::User).unwrap(), None);
    }

    #[test]
    fn undecodable_value_reports_key() {
        let store = MemoryStore::new();
        store.set(StorageKey::NotificationSettings, "{not json").unwrap();
        let err = get_json::<NotificationSettings, _>(&store, StorageKey::NotificationSettings)
            .unwrap_err();
        assert!(matches!(err, StorageError::Decode { key: "notificationSettings", .. }));
    }

    #[test]
    fn notification_settings_use_camel_case_and_fill_defaults() {
        let parsed: NotificationSettings =
            serde_json::from_str(r#"{"pushNotifications": false, "promotions": true}"#).unwrap();
        assert!(!parsed.push_notifications);
        assert!(parsed.promotions);
        assert!(parsed.route_updates);
        assert!(!parsed.sms_notifications);
    }
}
