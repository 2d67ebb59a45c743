//! Favorites store
//!
//! A durable set of character ids shared by every context of a storage
//! backend. The set is persisted as a JSON array of integers under a single
//! key (`favorites:characters` by default).
//!
//! # Failure semantics
//!
//! The store never returns errors. A missing or unparsable persisted value
//! loads as the empty set, and a failed write (quota, disabled storage) is
//! logged and absorbed while the in-memory set still changes.
//!
//! # External changes
//!
//! When another context writes the key, the in-memory set is replaced
//! wholesale by what is now persisted (last writer wins, no merging). The
//! change arrives either through [`FavoritesStore::apply_external_change`],
//! for callers that already own an event loop, or through the task started by
//! [`FavoritesStore::spawn_sync`].
//!
//! # Example
//! ```rust,ignore
//! let storage = InMemoryStorage::new();
//! let favorites = Arc::new(FavoritesStore::new(storage, DEFAULT_STORAGE_KEY));
//!
//! favorites.toggle(1);
//! assert!(favorites.is_member(1));
//!
//! let sync = favorites.clone().spawn_sync(|set| println!("{} favorites", set.len()));
//! ```

use super::character::CharacterId;
use super::events::StorageEvent;
use crate::storage::{KeyValueStore, SubscriptionEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::JoinHandle;

/// Storage key used by the character explorer
pub const DEFAULT_STORAGE_KEY: &str = "favorites:characters";

/// Set of favorited character ids
///
/// Serializes as a plain JSON array in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteSet(BTreeSet<CharacterId>);

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.0.contains(&id)
    }

    /// Copy of this set with `id` added if absent, removed if present
    pub fn toggled(&self, id: CharacterId) -> Self {
        let mut next = self.0.clone();
        if !next.remove(&id) {
            next.insert(id);
        }
        Self(next)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = CharacterId> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<CharacterId> {
        self.iter().collect()
    }

    /// Parse a persisted blob; anything unusable is the empty set
    pub fn from_persisted(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
            return Self::new();
        };
        match serde_json::from_str(raw) {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed favorites blob");
                Self::new()
            }
        }
    }

    pub fn to_persisted(&self) -> String {
        // A set of integers always serializes.
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }
}

impl FromIterator<CharacterId> for FavoriteSet {
    fn from_iter<I: IntoIterator<Item = CharacterId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Pure membership test
pub fn is_member(set: &FavoriteSet, id: CharacterId) -> bool {
    set.contains(id)
}

/// Favorites backed by an injected persistence port
pub struct FavoritesStore<K: KeyValueStore> {
    storage: K,
    key: String,
    current: RwLock<FavoriteSet>,
}

impl<K: KeyValueStore> FavoritesStore<K> {
    /// Create the store and load the persisted set once
    pub fn new(storage: K, key: impl Into<String>) -> Self {
        let key = key.into();
        let initial = read(&storage, &key);
        tracing::debug!(key = %key, count = initial.len(), "favorites loaded");

        Self {
            storage,
            key,
            current: RwLock::new(initial),
        }
    }

    /// Store under [`DEFAULT_STORAGE_KEY`]
    pub fn with_default_key(storage: K) -> Self {
        Self::new(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &K {
        &self.storage
    }

    /// Read the persisted set without touching the in-memory copy
    pub fn load(&self) -> FavoriteSet {
        read(&self.storage, &self.key)
    }

    /// Replace the in-memory set with the persisted one
    pub fn reload(&self) -> FavoriteSet {
        let mut current = self.write_current();
        let loaded = read(&self.storage, &self.key);
        *current = loaded.clone();
        loaded
    }

    /// Snapshot of the in-memory set
    pub fn current(&self) -> FavoriteSet {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_member(&self, id: CharacterId) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Favorited ids in ascending order
    pub fn list(&self) -> Vec<CharacterId> {
        self.current().to_vec()
    }

    /// Flip membership of `id`, persist, and return the new set
    pub fn toggle(&self, id: CharacterId) -> FavoriteSet {
        let mut current = self.write_current();
        let next = current.toggled(id);
        self.persist(&next);
        *current = next.clone();

        tracing::debug!(id, favorite = next.contains(id), "favorite toggled");
        next
    }

    /// Empty the set and persist it
    pub fn clear(&self) -> FavoriteSet {
        let mut current = self.write_current();
        let empty = FavoriteSet::new();
        self.persist(&empty);
        *current = empty.clone();

        tracing::debug!(key = %self.key, "favorites cleared");
        empty
    }

    /// Apply a change reported by another context
    ///
    /// Reloads when the event concerns this store's key (or the whole storage
    /// was cleared). Returns whether a reload happened.
    pub fn apply_external_change(&self, event: &StorageEvent) -> bool {
        if !event.affects(&self.key) {
            return false;
        }
        let reloaded = self.reload();
        tracing::debug!(
            origin = %event.origin,
            count = reloaded.len(),
            "favorites changed externally"
        );
        true
    }

    fn persist(&self, set: &FavoriteSet) {
        if let Err(e) = self.storage.set(&self.key, &set.to_persisted()) {
            tracing::warn!(
                key = %self.key,
                error = %e,
                "failed to persist favorites, keeping in-memory state only"
            );
        }
    }

    fn write_current(&self) -> std::sync::RwLockWriteGuard<'_, FavoriteSet> {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: KeyValueStore + 'static> FavoritesStore<K> {
    /// Keep the in-memory set in sync with writes from other contexts
    ///
    /// Spawns a tokio task draining the storage subscription. `on_change` runs
    /// after every reload with the new set. A lagged subscription forces a
    /// reload since individual events were lost. The task ends when the
    /// storage backend goes away or the handle is aborted.
    pub fn spawn_sync<F>(self: Arc<Self>, on_change: F) -> JoinHandle<()>
    where
        F: Fn(&FavoriteSet) + Send + Sync + 'static,
    {
        let mut subscription = self.storage.subscribe();
        tokio::spawn(async move {
            tracing::debug!(key = %self.key, "favorites sync started");
            while let Some(event) = subscription.recv().await {
                let changed = match event {
                    SubscriptionEvent::Changed(event) => self.apply_external_change(&event),
                    SubscriptionEvent::Lagged { skipped } => {
                        tracing::warn!(skipped, "favorites sync lagged, reloading");
                        self.reload();
                        true
                    }
                };
                if changed {
                    on_change(&self.current());
                }
            }
            tracing::debug!(key = %self.key, "favorites sync stopped");
        })
    }
}

fn read<K: KeyValueStore>(storage: &K, key: &str) -> FavoriteSet {
    match storage.get(key) {
        Ok(raw) => FavoriteSet::from_persisted(raw.as_deref()),
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read favorites, using empty set");
            FavoriteSet::new()
        }
    }
}
