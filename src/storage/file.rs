//! JSON-file key-value storage
//!
//! All keys live in one JSON object (`{"key": "value", ...}`). Every read goes
//! to disk so writes from other processes are always visible, and writes are
//! atomic (temp file + rename).
//!
//! Changes made by other processes are detected by polling: [`FileStorage::watch`]
//! spawns a task that diffs the file against the last known contents and
//! publishes an event per changed key with [`ContextId::external`] as origin.
//! Concurrent writers in different processes are last-writer-wins.

use super::{KeyValueStore, StorageSubscription};
use crate::core::error::StorageError;
use crate::core::events::{ContextId, EventBus, StorageEvent};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

const BACKEND: &str = "file";

struct Inner {
    path: PathBuf,
    bus: EventBus,
    /// Last contents written or observed; also serializes writers in this process
    snapshot: Mutex<HashMap<String, String>>,
}

/// File-backed storage handle
#[derive(Clone)]
pub struct FileStorage {
    inner: Arc<Inner>,
    context: ContextId,
}

impl FileStorage {
    /// Open (or prepare to create) the storage file at `path`
    ///
    /// Parent directories are created. A missing file is an empty storage and
    /// is only written on the first `set`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let snapshot = match read_map(&path) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "storage file unreadable, starting empty");
                HashMap::new()
            }
        };

        tracing::debug!(path = %path.display(), keys = snapshot.len(), "file storage opened");

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                bus: EventBus::default(),
                snapshot: Mutex::new(snapshot),
            }),
            context: ContextId::new(),
        })
    }

    /// Another context on the same file within this process
    pub fn open_context(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            context: ContextId::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Start polling the file for changes made by other processes
    ///
    /// Must be called inside a tokio runtime. The task ends when the returned
    /// handle is aborted or every handle on this file has been dropped.
    pub fn watch(&self, interval: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let path = self.inner.path.clone();
        tokio::spawn(async move {
            tracing::info!(path = %path.display(), "watching storage file");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.poll_external();
            }
            tracing::debug!(path = %path.display(), "storage file watch stopped");
        })
    }

    /// Diff the file against the last known contents once
    ///
    /// Returns the number of external changes published.
    pub fn poll_external(&self) -> usize {
        self.inner.poll_external()
    }
}

impl Inner {
    fn lock_snapshot(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn poll_external(&self) -> usize {
        let mut snapshot = self.lock_snapshot();
        let current = match read_map(&self.path) {
            Ok(map) => map,
            Err(e) => {
                tracing::debug!(error = %e, "skipping storage poll");
                return 0;
            }
        };

        let published = self.publish_external(&snapshot, &current);
        if published > 0 {
            *snapshot = current;
        }
        published
    }

    /// Publish an external event for every key that differs between `known`
    /// and `current`
    fn publish_external(
        &self,
        known: &HashMap<String, String>,
        current: &HashMap<String, String>,
    ) -> usize {
        let keys: BTreeSet<&String> = known.keys().chain(current.keys()).collect();
        let mut published = 0;
        for key in keys {
            let old = known.get(key);
            let new = current.get(key);
            if old != new {
                self.bus.publish(StorageEvent::changed(
                    key.as_str(),
                    old.cloned(),
                    new.cloned(),
                    ContextId::external(),
                ));
                published += 1;
            }
        }

        if published > 0 {
            tracing::debug!(path = %self.path.display(), changes = published, "external storage change detected");
        }
        published
    }

    /// Read-modify-write under the snapshot lock
    ///
    /// Changes other processes made since the last poll are published before
    /// the local write replaces the snapshot.
    fn update(
        &self,
        key: &str,
        value: Option<&str>,
        origin: ContextId,
    ) -> Result<(), StorageError> {
        let mut snapshot = self.lock_snapshot();
        let mut map = match read_map(&self.path) {
            Ok(map) => {
                self.publish_external(&snapshot, &map);
                map
            }
            Err(StorageError::Corrupted { message, .. }) => {
                tracing::warn!(path = %self.path.display(), %message, "overwriting corrupted storage file");
                HashMap::new()
            }
            Err(e) => return Err(e),
        };

        let old = match value {
            Some(v) => map.insert(key.to_string(), v.to_string()),
            None => map.remove(key),
        };
        if old.as_deref() == value {
            *snapshot = map;
            return Ok(());
        }

        write_map(&self.path, &map)?;
        *snapshot = map;
        drop(snapshot);

        self.bus.publish(StorageEvent::changed(
            key,
            old,
            value.map(str::to_string),
            origin,
        ));
        Ok(())
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(read_map(&self.inner.path)?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.update(key, Some(value), self.context)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.update(key, None, self.context)
    }

    fn subscribe(&self) -> StorageSubscription {
        StorageSubscription::new(self.inner.bus.subscribe(), self.context)
    }

    fn context_id(&self) -> ContextId {
        self.context
    }
}

fn read_map(path: &Path) -> Result<HashMap<String, String>, StorageError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(io_error(e)),
    };
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str(&raw).map_err(|e| StorageError::Corrupted {
        backend: BACKEND.to_string(),
        message: e.to_string(),
    })
}

fn write_map(path: &Path, map: &HashMap<String, String>) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(map).map_err(|e| StorageError::Io {
        backend: BACKEND.to_string(),
        message: e.to_string(),
    })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, json).map_err(io_error)?;
    fs::rename(&tmp, path).map_err(io_error)?;
    Ok(())
}

fn io_error(err: std::io::Error) -> StorageError {
    StorageError::Io {
        backend: BACKEND.to_string(),
        message: err.to_string(),
    }
}
