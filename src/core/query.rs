//! URL query-state codec and pagination utilities
//!
//! Maps the list view's adjustable parameters to and from a flat
//! [`QueryParams`] set suitable for a shareable URL.
//!
//! # Wire format
//!
//! | field            | key      | default    | omitted when      |
//! |------------------|----------|------------|-------------------|
//! | free-text query  | `q`      | `""`       | empty             |
//! | status filter    | `status` | `""` (any) | any               |
//! | gender filter    | `gender` | `""` (any) | any               |
//! | sort key         | `sort`   | `name_asc` | `name_asc`        |
//! | page             | `page`   | `1`        | `1`               |
//! | favorites only   | `fav`    | false      | false (`"1"` = true) |
//!
//! Decoding is total: every input, including an empty set, has exactly one
//! [`QueryState`]. Encoding keeps URLs minimal by removing a key whenever its
//! value equals the default.
//!
//! # Caller contract
//!
//! Any update that changes the search text, a filter, the sort order or the
//! favorites-only flag must also reset `page` to 1 in the same update. [`encode`]
//! does not enforce this; see [`QueryUpdate::is_filter_change`] and
//! [`change_filters`](crate::explorer::change_filters), which does.
//!
//! # Example
//! ```rust,ignore
//! let params = QueryParams::parse("?q=rick&status=dead&page=3");
//! let state = decode(&params);
//! assert_eq!(state.page, 3);
//!
//! let next = encode(&QueryUpdate::new().status(StatusFilter::Any).page(1), &params);
//! assert_eq!(next.to_query_string(), "q=rick");
//! ```

use super::params::QueryParams;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PARAM_QUERY: &str = "q";
pub const PARAM_STATUS: &str = "status";
pub const PARAM_GENDER: &str = "gender";
pub const PARAM_SORT: &str = "sort";
pub const PARAM_PAGE: &str = "page";
pub const PARAM_FAVORITES: &str = "fav";

/// Character status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    #[serde(rename = "")]
    Any,
    Alive,
    Dead,
    Unknown,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [Self::Any, Self::Alive, Self::Dead, Self::Unknown];

    /// Wire value (`""` for no filter)
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::Any => "",
            StatusFilter::Alive => "alive",
            StatusFilter::Dead => "dead",
            StatusFilter::Unknown => "unknown",
        }
    }

    /// Parse a wire value, falling back to [`StatusFilter::Any`]
    pub fn parse_or_default(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .unwrap_or_default()
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Character gender filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderFilter {
    #[default]
    #[serde(rename = "")]
    Any,
    Female,
    Male,
    Genderless,
    Unknown,
}

impl GenderFilter {
    pub const ALL: [GenderFilter; 5] = [
        Self::Any,
        Self::Female,
        Self::Male,
        Self::Genderless,
        Self::Unknown,
    ];

    /// Wire value (`""` for no filter)
    pub fn as_str(&self) -> &'static str {
        match self {
            GenderFilter::Any => "",
            GenderFilter::Female => "female",
            GenderFilter::Male => "male",
            GenderFilter::Genderless => "genderless",
            GenderFilter::Unknown => "unknown",
        }
    }

    /// Parse a wire value, falling back to [`GenderFilter::Any`]
    pub fn parse_or_default(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == value)
            .unwrap_or_default()
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Client-side sort order of a result page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    NameAsc,
    NameDesc,
    CreatedAsc,
    CreatedDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        Self::NameAsc,
        Self::NameDesc,
        Self::CreatedAsc,
        Self::CreatedDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::NameAsc => "name_asc",
            SortKey::NameDesc => "name_desc",
            SortKey::CreatedAsc => "created_asc",
            SortKey::CreatedDesc => "created_desc",
        }
    }

    /// Parse a wire value, falling back to [`SortKey::NameAsc`]
    pub fn parse_or_default(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .unwrap_or_default()
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded, typed state of the list view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    /// Free-text name search
    pub query: String,
    pub status: StatusFilter,
    pub gender: GenderFilter,
    pub sort: SortKey,
    /// Page number (starts at 1)
    pub page: u32,
    /// Show only favorited characters
    pub favorites_only: bool,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            query: String::new(),
            status: StatusFilter::Any,
            gender: GenderFilter::Any,
            sort: SortKey::NameAsc,
            page: 1,
            favorites_only: false,
        }
    }
}

/// Partial update of a [`QueryState`]
///
/// Fields left as `None` are not touched by [`encode`]. Remember the caller
/// contract: a change to the search text, a filter, the sort order or the
/// favorites-only flag should come with `page(1)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryUpdate {
    pub query: Option<String>,
    pub status: Option<StatusFilter>,
    pub gender: Option<GenderFilter>,
    pub sort: Option<SortKey>,
    pub page: Option<u32>,
    pub favorites_only: Option<bool>,
}

impl QueryUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = Some(status);
        self
    }

    pub fn gender(mut self, gender: GenderFilter) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn favorites_only(mut self, favorites_only: bool) -> Self {
        self.favorites_only = Some(favorites_only);
        self
    }

    /// Whether the update touches a field that invalidates the current page
    pub fn is_filter_change(&self) -> bool {
        self.query.is_some()
            || self.status.is_some()
            || self.gender.is_some()
            || self.sort.is_some()
            || self.favorites_only.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_filter_change() && self.page.is_none()
    }
}

impl From<&QueryState> for QueryUpdate {
    fn from(state: &QueryState) -> Self {
        Self {
            query: Some(state.query.clone()),
            status: Some(state.status),
            gender: Some(state.gender),
            sort: Some(state.sort),
            page: Some(state.page),
            favorites_only: Some(state.favorites_only),
        }
    }
}

/// Decode a parameter set into a [`QueryState`]
///
/// Never fails: missing keys and unrecognized values yield the field default.
pub fn decode(params: &QueryParams) -> QueryState {
    let query = params.get(PARAM_QUERY).unwrap_or_default().to_string();

    let status = params
        .get(PARAM_STATUS)
        .map(StatusFilter::parse_or_default)
        .unwrap_or_default();

    let gender = params
        .get(PARAM_GENDER)
        .map(GenderFilter::parse_or_default)
        .unwrap_or_default();

    let sort = params
        .get(PARAM_SORT)
        .map(SortKey::parse_or_default)
        .unwrap_or_default();

    let page = params.get(PARAM_PAGE).map(parse_page).unwrap_or(1);

    let favorites_only = params.get(PARAM_FAVORITES) == Some("1");

    QueryState {
        query,
        status,
        gender,
        sort,
        page,
        favorites_only,
    }
}

/// Apply a partial update on top of `current`, returning a new parameter set
///
/// For each field present in `update`, the key is removed when the new value
/// equals the field default and set otherwise. Keys for fields absent from the
/// update, and keys outside the recognized set, are left as they were.
///
/// This function does not reset `page` on filter changes; that is the
/// caller's responsibility (see the module docs).
pub fn encode(update: &QueryUpdate, current: &QueryParams) -> QueryParams {
    let mut next = current.clone();

    if let Some(query) = &update.query {
        put(&mut next, PARAM_QUERY, query, query.is_empty());
    }
    if let Some(status) = update.status {
        put(&mut next, PARAM_STATUS, status.as_str(), status.is_default());
    }
    if let Some(gender) = update.gender {
        put(&mut next, PARAM_GENDER, gender.as_str(), gender.is_default());
    }
    if let Some(sort) = update.sort {
        put(&mut next, PARAM_SORT, sort.as_str(), sort.is_default());
    }
    if let Some(page) = update.page {
        let page = page.max(1);
        put(&mut next, PARAM_PAGE, &page.to_string(), page == 1);
    }
    if let Some(favorites_only) = update.favorites_only {
        put(&mut next, PARAM_FAVORITES, "1", !favorites_only);
    }

    next
}

/// Encode every field of `state` onto an empty parameter set
pub fn encode_full(state: &QueryState) -> QueryParams {
    encode(&QueryUpdate::from(state), &QueryParams::new())
}

fn put(params: &mut QueryParams, key: &str, value: &str, is_default: bool) {
    if is_default {
        params.remove(key);
    } else {
        params.set(key, value);
    }
}

/// Parse a page number the way a browser's `parseInt` reads it
///
/// Leading whitespace and an optional sign are skipped, then the leading run
/// of decimal digits is taken (`"2abc"` is page 2). Anything that does not
/// produce a positive number is page 1; huge values saturate.
fn parse_page(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() || negative {
        return 1;
    }

    let value = digits
        .bytes()
        .fold(0u64, |acc, d| {
            acc.saturating_mul(10).saturating_add(u64::from(d - b'0'))
        })
        .min(u64::from(u32::MAX)) as u32;

    value.max(1)
}

/// Pagination state of the list view
///
/// `total_pages` comes from the remote API and is at least 1, even for an
/// empty result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Current page number (starts at 1)
    pub page: u32,

    /// Total number of pages
    pub total_pages: u32,

    /// Whether there is a previous page
    pub has_prev: bool,

    /// Whether there is a next page
    pub has_next: bool,
}

impl Pagination {
    pub fn new(page: u32, total_pages: u32) -> Self {
        let page = page.max(1);
        let total_pages = total_pages.max(1);

        Self {
            page,
            total_pages,
            has_prev: page > 1,
            has_next: page < total_pages,
        }
    }

    /// Page to show when moving back, never below 1
    pub fn prev_page(&self) -> u32 {
        self.page.saturating_sub(1).max(1)
    }

    /// Page to show when moving forward, never past the last page
    pub fn next_page(&self) -> u32 {
        self.page.saturating_add(1).min(self.total_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_empty_uses_defaults() {
        let state = decode(&QueryParams::new());
        assert_eq!(state, QueryState::default());
        assert_eq!(state.sort, SortKey::NameAsc);
        assert_eq!(state.page, 1);
        assert!(!state.favorites_only);
    }

    #[test]
    fn test_decode_all_fields() {
        let params =
            QueryParams::parse("q=rick&status=alive&gender=male&sort=created_desc&page=4&fav=1");
        let state = decode(&params);
        assert_eq!(state.query, "rick");
        assert_eq!(state.status, StatusFilter::Alive);
        assert_eq!(state.gender, GenderFilter::Male);
        assert_eq!(state.sort, SortKey::CreatedDesc);
        assert_eq!(state.page, 4);
        assert!(state.favorites_only);
    }

    #[test]
    fn test_decode_invalid_values_fall_back() {
        let params = QueryParams::parse("status=zombie&gender=robot&sort=random&fav=true");
        let state = decode(&params);
        assert_eq!(state.status, StatusFilter::Any);
        assert_eq!(state.gender, GenderFilter::Any);
        assert_eq!(state.sort, SortKey::NameAsc);
        assert!(!state.favorites_only);
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page("0"), 1);
        assert_eq!(parse_page("abc"), 1);
        assert_eq!(parse_page(""), 1);
        assert_eq!(parse_page("-3"), 1);
        assert_eq!(parse_page("7"), 7);
        assert_eq!(parse_page("  12"), 12);
        assert_eq!(parse_page("+5"), 5);
        assert_eq!(parse_page("2abc"), 2);
        assert_eq!(parse_page("99999999999999999999"), u32::MAX);
    }

    #[test]
    fn test_encode_removes_defaults() {
        let current = QueryParams::parse("q=rick&status=dead&sort=name_desc&page=3&fav=1");
        let update = QueryUpdate::new()
            .query("")
            .status(StatusFilter::Any)
            .sort(SortKey::NameAsc)
            .page(1)
            .favorites_only(false);
        assert!(encode(&update, &current).is_empty());
    }

    #[test]
    fn test_encode_leaves_unrelated_keys() {
        let current = QueryParams::parse("utm_source=mail&q=rick");
        let next = encode(&QueryUpdate::new().gender(GenderFilter::Female), &current);
        assert_eq!(next.to_query_string(), "utm_source=mail&q=rick&gender=female");
    }

    #[test]
    fn test_encode_empty_update_is_identity() {
        let current = QueryParams::parse("q=morty&page=2&x=y");
        assert_eq!(encode(&QueryUpdate::new(), &current), current);
    }

    #[test]
    fn test_encode_page_zero_is_page_one() {
        let current = QueryParams::parse("page=5");
        assert!(encode(&QueryUpdate::new().page(0), &current).is_empty());
    }

    #[test]
    fn test_update_filter_change_detection() {
        assert!(!QueryUpdate::new().page(2).is_filter_change());
        assert!(QueryUpdate::new().sort(SortKey::NameDesc).is_filter_change());
        assert!(QueryUpdate::new().is_empty());
    }

    #[test]
    fn test_enum_serde_matches_wire_values() {
        assert_eq!(serde_json::to_string(&StatusFilter::Any).unwrap(), "\"\"");
        assert_eq!(serde_json::to_string(&GenderFilter::Genderless).unwrap(), "\"genderless\"");
        assert_eq!(serde_json::to_string(&SortKey::CreatedAsc).unwrap(), "\"created_asc\"");
    }

    #[test]
    fn test_pagination() {
        let first = Pagination::new(1, 42);
        assert!(!first.has_prev);
        assert!(first.has_next);
        assert_eq!(first.prev_page(), 1);
        assert_eq!(first.next_page(), 2);

        let last = Pagination::new(42, 42);
        assert!(last.has_prev);
        assert!(!last.has_next);
        assert_eq!(last.next_page(), 42);
    }

    #[test]
    fn test_pagination_empty_result_has_one_page() {
        let meta = Pagination::new(1, 0);
        assert_eq!(meta.total_pages, 1);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }
}
