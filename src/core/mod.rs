//! Core types: characters, favorites, the query-state codec and errors

pub mod character;
pub mod error;
pub mod events;
pub mod favorites;
pub mod listing;
pub mod params;
pub mod query;

pub use character::{Character, CharacterId, CharactersPage};
pub use error::{ExplorerError, ExplorerResult};
pub use events::{ContextId, EventBus, StorageEvent};
pub use favorites::{FavoriteSet, FavoritesStore};
pub use params::QueryParams;
pub use query::{QueryState, QueryUpdate, decode, encode};
