//! Character explorer
//!
//! Ties the query codec, a [`CharacterSource`] and a [`FavoritesStore`]
//! together into the two views of the application: the filtered, paged list
//! and the character detail.

pub mod navigation;

pub use navigation::{change_filters, go_to_page, next_page, prev_page, toggle_favorites_only};

use crate::client::{CharacterQuery, CharacterSource};
use crate::core::character::{Character, CharacterId};
use crate::core::error::RemoteError;
use crate::core::favorites::FavoritesStore;
use crate::core::listing::arrange;
use crate::core::params::QueryParams;
use crate::core::query::{Pagination, QueryState, decode};
use crate::storage::KeyValueStore;
use serde::Serialize;
use std::sync::Arc;

/// A character as shown in the list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub character: Character,
    pub is_favorite: bool,
}

/// Rendered state of the list view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListView {
    /// State decoded from the URL
    pub state: QueryState,
    pub items: Vec<ListItem>,
    pub pagination: Pagination,
}

impl ListView {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub character: Character,
    pub is_favorite: bool,
}

pub struct Explorer<S, K: KeyValueStore> {
    source: S,
    favorites: Arc<FavoritesStore<K>>,
}

impl<S: CharacterSource, K: KeyValueStore> Explorer<S, K> {
    pub fn new(source: S, favorites: Arc<FavoritesStore<K>>) -> Self {
        Self { source, favorites }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn favorites(&self) -> &Arc<FavoritesStore<K>> {
        &self.favorites
    }

    /// Build the list view for the given URL parameters
    ///
    /// Name, status and gender go to the remote source; the favorites-only
    /// flag and the sort order apply to the returned page. `pagination`
    /// reflects the remote page count even when the favorites filter hides
    /// every item.
    pub async fn list(&self, params: &QueryParams) -> Result<ListView, RemoteError> {
        let state = decode(params);
        let page = self.source.list(&CharacterQuery::from(&state)).await?;
        let favorites = self.favorites.current();

        let items = arrange(page.results, &state, &favorites)
            .into_iter()
            .map(|character| ListItem {
                is_favorite: favorites.contains(character.id),
                character,
            })
            .collect();

        let pagination = Pagination::new(state.page, page.info.pages);
        tracing::debug!(page = pagination.page, total = pagination.total_pages, "list view built");

        Ok(ListView {
            state,
            items,
            pagination,
        })
    }

    pub async fn detail(&self, id: CharacterId) -> Result<DetailView, RemoteError> {
        let character = self.source.get(id).await?;
        Ok(DetailView {
            is_favorite: self.favorites.is_member(character.id),
            character,
        })
    }

    /// Toggle membership; returns whether `id` is now a favorite
    pub fn toggle_favorite(&self, id: CharacterId) -> bool {
        self.favorites.toggle(id).contains(id)
    }

    pub fn clear_favorites(&self) {
        self.favorites.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::character::fixtures::character;
    use crate::core::character::{CharactersPage, PageInfo};
    use crate::storage::InMemoryStorage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeSource {
        characters: Vec<Character>,
        pages: u32,
        seen: Mutex<Vec<CharacterQuery>>,
    }

    impl FakeSource {
        fn new(pages: u32) -> Self {
            Self {
                characters: vec![
                    character(1, "Rick Sanchez", 2017),
                    character(2, "Morty Smith", 2017),
                    character(3, "Summer Smith", 2016),
                ],
                pages,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CharacterSource for FakeSource {
        async fn list(&self, query: &CharacterQuery) -> Result<CharactersPage, RemoteError> {
            self.seen.lock().unwrap().push(query.clone());
            Ok(CharactersPage {
                info: PageInfo {
                    count: self.characters.len() as u32,
                    pages: self.pages,
                    next: None,
                    prev: None,
                },
                results: self.characters.clone(),
            })
        }

        async fn get(&self, id: CharacterId) -> Result<Character, RemoteError> {
            self.characters
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or(RemoteError::NotFound { id })
        }
    }

    fn explorer(pages: u32) -> Explorer<FakeSource, InMemoryStorage> {
        let favorites = Arc::new(FavoritesStore::with_default_key(InMemoryStorage::new()));
        Explorer::new(FakeSource::new(pages), favorites)
    }

    fn names(view: &ListView) -> Vec<&str> {
        view.items.iter().map(|i| i.character.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_list_sorts_by_name_by_default() {
        let explorer = explorer(1);
        let view = explorer.list(&QueryParams::new()).await.unwrap();
        assert_eq!(names(&view), ["Morty Smith", "Rick Sanchez", "Summer Smith"]);
        assert_eq!(view.pagination, Pagination::new(1, 1));
    }

    #[tokio::test]
    async fn test_list_forwards_server_filters() {
        let explorer = explorer(1);
        explorer
            .list(&QueryParams::parse("q=smith&status=alive&page=2&sort=created_desc"))
            .await
            .unwrap();

        let seen = explorer.source().seen.lock().unwrap();
        assert_eq!(seen[0].name, "smith");
        assert_eq!(seen[0].page, 2);
    }

    #[tokio::test]
    async fn test_favorites_only_and_flags() {
        let explorer = explorer(4);
        assert!(explorer.toggle_favorite(3));

        let all = explorer.list(&QueryParams::new()).await.unwrap();
        let flags: Vec<bool> = all.items.iter().map(|i| i.is_favorite).collect();
        assert_eq!(flags, [false, false, true]);

        let only = explorer.list(&QueryParams::parse("fav=1")).await.unwrap();
        assert_eq!(names(&only), ["Summer Smith"]);
        assert_eq!(only.pagination.total_pages, 4);
    }

    #[tokio::test]
    async fn test_favorites_only_with_no_favorites_is_empty() {
        let explorer = explorer(1);
        let view = explorer.list(&QueryParams::parse("fav=1")).await.unwrap();
        assert!(view.is_empty());
    }

    #[tokio::test]
    async fn test_detail() {
        let explorer = explorer(1);
        explorer.toggle_favorite(1);

        let detail = explorer.detail(1).await.unwrap();
        assert_eq!(detail.character.name, "Rick Sanchez");
        assert!(detail.is_favorite);

        assert!(matches!(
            explorer.detail(99).await,
            Err(RemoteError::NotFound { id: 99 })
        ));
    }

    #[tokio::test]
    async fn test_toggle_and_clear() {
        let explorer = explorer(1);
        assert!(explorer.toggle_favorite(2));
        assert!(!explorer.toggle_favorite(2));

        explorer.toggle_favorite(1);
        explorer.clear_favorites();
        assert!(explorer.favorites().list().is_empty());
    }
}
