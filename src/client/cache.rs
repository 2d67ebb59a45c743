//! Stale-time cache in front of a [`CharacterSource`]

use super::{CharacterQuery, CharacterSource};
use crate::core::character::{Character, CharacterId, CharactersPage};
use crate::core::error::RemoteError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry<T> {
    value: T,
    fetched_at: Instant,
}

struct Slot<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash, V: Clone> Slot<K, V> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn fresh(&self, key: &K, stale_time: Duration) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.fetched_at.elapsed() < stale_time)
            .map(|e| e.value.clone())
    }

    /// Insert `value`, dropping entries older than `stale_time`
    async fn store(&self, key: K, value: V, stale_time: Duration) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.fetched_at.elapsed() < stale_time);
        entries.insert(
            key,
            Entry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// Caches successful responses for `stale_time`
///
/// Errors are never cached. A zero stale time disables caching.
pub struct CachedSource<S> {
    inner: S,
    stale_time: Duration,
    pages: Slot<CharacterQuery, CharactersPage>,
    characters: Slot<CharacterId, Character>,
}

impl<S: CharacterSource> CachedSource<S> {
    pub fn new(inner: S, stale_time: Duration) -> Self {
        Self {
            inner,
            stale_time,
            pages: Slot::new(),
            characters: Slot::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop every cached response
    pub async fn invalidate(&self) {
        self.pages.clear().await;
        self.characters.clear().await;
    }
}

#[async_trait]
impl<S: CharacterSource> CharacterSource for CachedSource<S> {
    async fn list(&self, query: &CharacterQuery) -> Result<CharactersPage, RemoteError> {
        if let Some(page) = self.pages.fresh(query, self.stale_time).await {
            tracing::trace!(page = query.page, "character page served from cache");
            return Ok(page);
        }

        let page = self.inner.list(query).await?;
        self.pages
            .store(query.clone(), page.clone(), self.stale_time)
            .await;
        Ok(page)
    }

    async fn get(&self, id: CharacterId) -> Result<Character, RemoteError> {
        if let Some(character) = self.characters.fresh(&id, self.stale_time).await {
            tracing::trace!(id, "character served from cache");
            return Ok(character);
        }

        let character = self.inner.get(id).await?;
        self.characters
            .store(id, character.clone(), self.stale_time)
            .await;
        Ok(character)
    }
}
