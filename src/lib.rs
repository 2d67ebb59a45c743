//! # Resource Explorer
//!
//! Client-side state for browsing the Rick and Morty character catalog.
//!
//! ## Features
//!
//! - **Favorites Store**: Durable set of character ids, shared across contexts of a storage backend
//! - **Change Notification**: Writes from one context reach every other context of the same storage
//! - **URL Query-State Codec**: Total decoding and minimal encoding of search, filters, sort and page
//! - **Pluggable Storage**: In-memory and JSON-file backends behind one `KeyValueStore` trait
//! - **Remote Client**: REST client with retries and a stale-time cache
//! - **Configuration-Based**: API, storage and favorites settings from YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use explorer::prelude::*;
//!
//! let config = ExplorerConfig::default_config();
//! let source = HttpCharacterSource::new(&config.api)?;
//! let favorites = Arc::new(FavoritesStore::new(InMemoryStorage::new(), &config.favorites.storage_key));
//! let explorer = Explorer::new(source, favorites);
//!
//! let params = QueryParams::parse("?q=rick&status=alive");
//! let view = explorer.list(&params).await?;
//!
//! // Filter changes go back to page 1
//! let next = change_filters(&params, QueryUpdate::new().gender(GenderFilter::Female));
//! assert_eq!(next.to_query_string(), "q=rick&status=alive&gender=female");
//! ```

pub mod client;
pub mod config;
pub mod core;
pub mod explorer;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        character::{Character, CharacterId, CharactersPage, LocationRef, PageInfo},
        error::{ConfigError, ExplorerError, ExplorerResult, RemoteError, StorageError},
        events::{ContextId, EventBus, StorageEvent},
        favorites::{DEFAULT_STORAGE_KEY, FavoriteSet, FavoritesStore, is_member},
        params::QueryParams,
        query::{
            GenderFilter, Pagination, QueryState, QueryUpdate, SortKey, StatusFilter, decode,
            encode, encode_full,
        },
    };

    // === Storage ===
    pub use crate::storage::{
        FileStorage, InMemoryStorage, KeyValueStore, StorageSubscription, SubscriptionEvent,
    };

    // === Client ===
    pub use crate::client::{CachedSource, CharacterQuery, CharacterSource, HttpCharacterSource};

    // === Explorer ===
    pub use crate::explorer::{
        DetailView, Explorer, ListItem, ListView, change_filters, go_to_page, next_page,
        prev_page, toggle_favorites_only,
    };

    // === Config ===
    pub use crate::config::{
        ApiConfig, ExplorerConfig, FavoritesConfig, StorageBackend, StorageConfig,
    };

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
