//! Remote character data source
//!
//! The list and detail views read characters through [`CharacterSource`].
//! [`HttpCharacterSource`] talks to the public REST API; [`CachedSource`]
//! wraps any source with a stale-time cache so paging back and forth does
//! not refetch.
//!
//! Requests are cancelled by dropping their future, which is what happens
//! when a view navigates away before the response arrives.

pub mod cache;
pub mod http;

pub use cache::CachedSource;
pub use http::HttpCharacterSource;

use crate::core::character::{Character, CharacterId, CharactersPage};
use crate::core::error::RemoteError;
use crate::core::query::{GenderFilter, QueryState, StatusFilter};
use async_trait::async_trait;
use std::sync::Arc;

/// Server-side filters of the character listing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharacterQuery {
    /// Page number (starts at 1)
    pub page: u32,
    /// Name search
    pub name: String,
    pub status: StatusFilter,
    pub gender: GenderFilter,
}

impl CharacterQuery {
    /// Request parameters; empty filters are omitted
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.max(1).to_string())];
        if !self.name.is_empty() {
            pairs.push(("name", self.name.clone()));
        }
        if !self.status.is_default() {
            pairs.push(("status", self.status.as_str().to_string()));
        }
        if !self.gender.is_default() {
            pairs.push(("gender", self.gender.as_str().to_string()));
        }
        pairs
    }
}

impl Default for CharacterQuery {
    fn default() -> Self {
        Self {
            page: 1,
            name: String::new(),
            status: StatusFilter::Any,
            gender: GenderFilter::Any,
        }
    }
}

impl From<&QueryState> for CharacterQuery {
    fn from(state: &QueryState) -> Self {
        Self {
            page: state.page,
            name: state.query.clone(),
            status: state.status,
            gender: state.gender,
        }
    }
}

/// Source of character data
#[async_trait]
pub trait CharacterSource: Send + Sync {
    /// Fetch one page of characters matching `query`
    ///
    /// A query with no matches yields [`CharactersPage::empty`], not an error.
    async fn list(&self, query: &CharacterQuery) -> Result<CharactersPage, RemoteError>;

    /// Fetch a single character
    async fn get(&self, id: CharacterId) -> Result<Character, RemoteError>;
}

#[async_trait]
impl<S: CharacterSource + ?Sized> CharacterSource for Arc<S> {
    async fn list(&self, query: &CharacterQuery) -> Result<CharactersPage, RemoteError> {
        (**self).list(query).await
    }

    async fn get(&self, id: CharacterId) -> Result<Character, RemoteError> {
        (**self).get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_only_sends_page() {
        assert_eq!(
            CharacterQuery::default().to_pairs(),
            vec![("page", "1".to_string())]
        );
    }

    #[test]
    fn test_query_from_state() {
        let state = QueryState {
            query: "rick".to_string(),
            status: StatusFilter::Dead,
            gender: GenderFilter::Male,
            page: 3,
            favorites_only: true,
            ..QueryState::default()
        };
        let query = CharacterQuery::from(&state);
        assert_eq!(
            query.to_pairs(),
            vec![
                ("page", "3".to_string()),
                ("name", "rick".to_string()),
                ("status", "dead".to_string()),
                ("gender", "male".to_string()),
            ]
        );
    }

    #[test]
    fn test_sort_and_favorites_do_not_change_query() {
        let a = QueryState::default();
        let b = QueryState {
            sort: crate::core::query::SortKey::CreatedDesc,
            favorites_only: true,
            ..QueryState::default()
        };
        assert_eq!(CharacterQuery::from(&a), CharacterQuery::from(&b));
    }
}
