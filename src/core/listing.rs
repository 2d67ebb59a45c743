//! Client-side arrangement of a fetched result page
//!
//! The remote API filters by name, status and gender; the favorites-only
//! flag and the sort order are applied locally to the page it returns.

use super::character::Character;
use super::favorites::FavoriteSet;
use super::query::{QueryState, SortKey};
use std::cmp::Ordering;

/// Filter and sort one result page for display
pub fn arrange(
    results: Vec<Character>,
    state: &QueryState,
    favorites: &FavoriteSet,
) -> Vec<Character> {
    let mut items = if state.favorites_only {
        apply_favorites_filter(results, favorites)
    } else {
        results
    };
    apply_sort(&mut items, state.sort);
    items
}

/// Keep only characters present in `favorites`
pub fn apply_favorites_filter(
    results: Vec<Character>,
    favorites: &FavoriteSet,
) -> Vec<Character> {
    results
        .into_iter()
        .filter(|c| favorites.contains(c.id))
        .collect()
}

/// Sort in place; ties keep their API order
pub fn apply_sort(items: &mut [Character], sort: SortKey) {
    match sort {
        SortKey::NameAsc => items.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortKey::NameDesc => items.sort_by(|a, b| compare_names(&b.name, &a.name)),
        SortKey::CreatedAsc => items.sort_by(|a, b| a.created.cmp(&b.created)),
        SortKey::CreatedDesc => items.sort_by(|a, b| b.created.cmp(&a.created)),
    }
}

// Case-insensitive first so "morty" and "Morty" sit together, byte order breaks ties.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
