//! In-memory key-value storage for tests, demos and single-process use
//!
//! Models browser local storage: one map per origin shared by every tab.
//! [`InMemoryStorage::open_context`] hands out another tab on the same map;
//! writes made through one handle are delivered as events to the others.

use super::{KeyValueStore, StorageSubscription};
use crate::core::error::StorageError;
use crate::core::events::{ContextId, EventBus, StorageEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

const BACKEND: &str = "memory";

struct Shared {
    entries: RwLock<HashMap<String, String>>,
    bus: EventBus,
    quota: RwLock<Option<usize>>,
    disabled: AtomicBool,
}

/// In-memory storage handle
///
/// Cloning keeps the same context; use [`open_context`](Self::open_context)
/// to simulate another tab. Uses RwLock for thread-safe access.
#[derive(Clone)]
pub struct InMemoryStorage {
    shared: Arc<Shared>,
    context: ContextId,
}

impl InMemoryStorage {
    /// Create an empty storage with its first context
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: RwLock::new(HashMap::new()),
                bus: EventBus::default(),
                quota: RwLock::new(None),
                disabled: AtomicBool::new(false),
            }),
            context: ContextId::new(),
        }
    }

    /// Another context on the same data
    pub fn open_context(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            context: ContextId::new(),
        }
    }

    /// Limit the total size (bytes of keys plus values); `None` removes the limit
    pub fn set_quota(&self, quota: Option<usize>) {
        *self
            .shared
            .quota
            .write()
            .unwrap_or_else(PoisonError::into_inner) = quota;
    }

    /// Make every operation fail with [`StorageError::Unavailable`]
    pub fn set_disabled(&self, disabled: bool) {
        self.shared.disabled.store(disabled, Ordering::SeqCst);
    }

    /// Remove every key, notifying the other contexts
    pub fn clear_all(&self) -> Result<(), StorageError> {
        self.check_enabled()?;
        let mut entries = self.write_entries();
        if entries.is_empty() {
            return Ok(());
        }
        entries.clear();
        drop(entries);

        self.shared.bus.publish(StorageEvent::cleared(self.context));
        Ok(())
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_enabled(&self) -> Result<(), StorageError> {
        if self.shared.disabled.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                backend: BACKEND.to_string(),
            });
        }
        Ok(())
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, String>> {
        self.shared
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, String>> {
        self.shared
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_enabled()?;
        Ok(self.read_entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_enabled()?;
        let mut entries = self.write_entries();

        let quota = *self
            .shared
            .quota
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(limit) = quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let requested = others + key.len() + value.len();
            if requested > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    requested,
                    limit,
                });
            }
        }

        let old = entries.insert(key.to_string(), value.to_string());
        drop(entries);

        if old.as_deref() != Some(value) {
            self.shared.bus.publish(StorageEvent::changed(
                key,
                old,
                Some(value.to_string()),
                self.context,
            ));
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_enabled()?;
        let old = self.write_entries().remove(key);

        if old.is_some() {
            self.shared
                .bus
                .publish(StorageEvent::changed(key, old, None, self.context));
        }
        Ok(())
    }

    fn subscribe(&self) -> StorageSubscription {
        StorageSubscription::new(self.shared.bus.subscribe(), self.context)
    }

    fn context_id(&self) -> ContextId {
        self.context
    }
}
