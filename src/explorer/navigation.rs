//! URL transitions of the list view
//!
//! Each function takes the current parameter set and returns the next one.
//! Unrecognized keys always survive.

use crate::core::params::QueryParams;
use crate::core::query::{Pagination, QueryUpdate, decode, encode};

/// Apply a search/filter/sort change, returning to page 1
///
/// Any `page` carried by `update` is ignored when it also changes a filter.
pub fn change_filters(params: &QueryParams, update: QueryUpdate) -> QueryParams {
    let update = if update.is_filter_change() {
        update.page(1)
    } else {
        update
    };
    encode(&update, params)
}

/// Flip the favorites-only flag, returning to page 1
pub fn toggle_favorites_only(params: &QueryParams) -> QueryParams {
    let current = decode(params);
    change_filters(
        params,
        QueryUpdate::new().favorites_only(!current.favorites_only),
    )
}

/// Jump to `page`, clamped to `1..=total_pages`
pub fn go_to_page(params: &QueryParams, page: u32, total_pages: u32) -> QueryParams {
    let page = page.clamp(1, total_pages.max(1));
    encode(&QueryUpdate::new().page(page), params)
}

pub fn next_page(params: &QueryParams, pagination: &Pagination) -> QueryParams {
    go_to_page(params, pagination.next_page(), pagination.total_pages)
}

pub fn prev_page(params: &QueryParams, pagination: &Pagination) -> QueryParams {
    go_to_page(params, pagination.prev_page(), pagination.total_pages)
}
