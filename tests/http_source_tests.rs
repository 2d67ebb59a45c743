//! HTTP character source tests against an in-process fake API
//!
//! The fake serves `/api/character` and `/api/character/{id}` in the shape of
//! the public API, including its 404 for listings without matches.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use explorer::prelude::*;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const PAGE_SIZE: usize = 2;

#[derive(Default)]
struct FakeApi {
    hits: AtomicUsize,
    /// Number of upcoming requests answered with a 500
    failures: AtomicUsize,
    seen: Mutex<Vec<HashMap<String, String>>>,
}

impl FakeApi {
    fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn character_json(id: i64, name: &str, status: &str, created: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "status": status,
        "species": "Human",
        "type": "",
        "gender": "Male",
        "origin": { "name": "Earth (C-137)", "url": "https://rickandmortyapi.com/api/location/1" },
        "location": { "name": "Citadel of Ricks", "url": "https://rickandmortyapi.com/api/location/3" },
        "image": format!("https://rickandmortyapi.com/api/character/avatar/{}.jpeg", id),
        "episode": ["https://rickandmortyapi.com/api/episode/1"],
        "url": format!("https://rickandmortyapi.com/api/character/{}", id),
        "created": created,
    })
}

fn catalog() -> Vec<Value> {
    vec![
        character_json(1, "Rick Sanchez", "Alive", "2017-11-04T18:48:46.250Z"),
        character_json(2, "Morty Smith", "Alive", "2017-11-04T18:50:21.651Z"),
        character_json(8, "Adjudicator Rick", "Dead", "2017-11-04T20:03:34.737Z"),
    ]
}

async fn list_characters(
    State(api): State<Arc<FakeApi>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    api.hits.fetch_add(1, Ordering::SeqCst);
    api.seen.lock().unwrap().push(params.clone());
    if api.take_failure() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }

    let name = params.get("name").map(|n| n.to_lowercase()).unwrap_or_default();
    let status = params.get("status").cloned().unwrap_or_default();
    let matches: Vec<Value> = catalog()
        .into_iter()
        .filter(|c| c["name"].as_str().unwrap().to_lowercase().contains(&name))
        .filter(|c| {
            status.is_empty() || c["status"].as_str().unwrap().eq_ignore_ascii_case(&status)
        })
        .collect();

    let pages = matches.len().div_ceil(PAGE_SIZE);
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    if matches.is_empty() || page > pages {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "There is nothing here" })),
        )
            .into_response();
    }

    let results: Vec<Value> = matches
        .iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect();

    Json(json!({
        "info": {
            "count": matches.len(),
            "pages": pages,
            "next": if page < pages { json!(format!("?page={}", page + 1)) } else { Value::Null },
            "prev": if page > 1 { json!(format!("?page={}", page - 1)) } else { Value::Null },
        },
        "results": results,
    }))
    .into_response()
}

async fn get_character(
    State(api): State<Arc<FakeApi>>,
    Path(id): Path<i64>,
) -> Response {
    api.hits.fetch_add(1, Ordering::SeqCst);
    if api.take_failure() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "").into_response();
    }
    if id == 999 {
        return (StatusCode::OK, "not json").into_response();
    }

    match catalog().into_iter().find(|c| c["id"] == id) {
        Some(character) => Json(character).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Character not found" })),
        )
            .into_response(),
    }
}

async fn spawn_api() -> (Arc<FakeApi>, String) {
    let api = Arc::new(FakeApi::default());
    let app = Router::new()
        .route("/api/character", get(list_characters))
        .route("/api/character/{id}", get(get_character))
        .with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (api, format!("http://{}/api", addr))
}

fn source(base_url: &str, retry: u32) -> HttpCharacterSource {
    HttpCharacterSource::with_client(reqwest::Client::new(), base_url)
        .unwrap()
        .retry(retry)
        .retry_delay(Duration::ZERO)
}

// =============================================================================
// Listing Tests
// =============================================================================

#[tokio::test]
async fn test_list_first_page() {
    let (_api, base) = spawn_api().await;
    let page = assert_ok!(source(&base, 0).list(&CharacterQuery::default()).await);

    assert_eq!(page.info.count, 3);
    assert_eq!(page.info.pages, 2);
    assert_eq!(page.results.len(), 2);
    assert_eq!(page.results[0].name, "Rick Sanchez");
    assert_eq!(page.results[0].location.name, "Citadel of Ricks");
}

#[tokio::test]
async fn test_list_sends_only_set_filters() {
    let (api, base) = spawn_api().await;
    let query = CharacterQuery {
        page: 1,
        name: "rick".to_string(),
        status: StatusFilter::Dead,
        gender: GenderFilter::Any,
    };
    let page = source(&base, 0).list(&query).await.unwrap();
    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].id, 8);

    let seen = api.seen.lock().unwrap();
    assert_eq!(seen[0].get("name").map(String::as_str), Some("rick"));
    assert_eq!(seen[0].get("status").map(String::as_str), Some("dead"));
    assert!(!seen[0].contains_key("gender"));
}

#[tokio::test]
async fn test_no_matches_is_an_empty_page() {
    let (_api, base) = spawn_api().await;
    let query = CharacterQuery {
        name: "nobody".to_string(),
        ..CharacterQuery::default()
    };
    let page = source(&base, 0).list(&query).await.unwrap();

    assert!(page.is_empty());
    assert_eq!(page.info.pages, 1);
    assert_eq!(page.info.count, 0);
}

// =============================================================================
// Retry Tests
// =============================================================================

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let (api, base) = spawn_api().await;
    api.fail_next(1);

    let page = source(&base, 1).list(&CharacterQuery::default()).await.unwrap();
    assert_eq!(page.results.len(), 2);
    assert_eq!(api.hits(), 2);
}

#[tokio::test]
async fn test_persistent_failure_reports_body() {
    let (api, base) = spawn_api().await;
    api.fail_next(10);

    let err = assert_err!(source(&base, 1).list(&CharacterQuery::default()).await);
    assert!(matches!(err, RemoteError::Status { status: 500, .. }));
    assert_eq!(err.to_string(), "boom");
    assert_eq!(api.hits(), 2);
}

#[tokio::test]
async fn test_no_retry_when_disabled() {
    let (api, base) = spawn_api().await;
    api.fail_next(1);

    assert!(source(&base, 0).list(&CharacterQuery::default()).await.is_err());
    assert_eq!(api.hits(), 1);
}

#[tokio::test]
async fn test_empty_error_body_uses_status_message() {
    let (api, base) = spawn_api().await;
    api.fail_next(10);

    let err = source(&base, 0).get(1).await.unwrap_err();
    assert_eq!(err.to_string(), "Request failed 500");
}

#[tokio::test]
async fn test_unreachable_api_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = source(&format!("http://{}/api", addr), 0)
        .list(&CharacterQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Transport { .. }));
    assert!(err.is_transient());
}

// =============================================================================
// Detail Tests
// =============================================================================

#[tokio::test]
async fn test_get_character() {
    let (_api, base) = spawn_api().await;
    let character = source(&base, 0).get(2).await.unwrap();

    assert_eq!(character.name, "Morty Smith");
    assert_eq!(character.episode_count(), 1);
}

#[tokio::test]
async fn test_get_missing_character() {
    let (api, base) = spawn_api().await;
    let err = assert_err!(source(&base, 1).get(4242).await);

    assert!(matches!(err, RemoteError::NotFound { id: 4242 }));
    assert_eq!(api.hits(), 1);
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let (_api, base) = spawn_api().await;
    let err = source(&base, 0).get(999).await.unwrap_err();
    assert!(matches!(err, RemoteError::Decode { .. }));
}

// =============================================================================
// End-To-End Tests
// =============================================================================

#[tokio::test]
async fn test_explorer_over_cached_http_source() {
    let (api, base) = spawn_api().await;
    let cached = CachedSource::new(source(&base, 0), Duration::from_secs(30));
    let favorites = Arc::new(FavoritesStore::with_default_key(InMemoryStorage::new()));
    let explorer = Explorer::new(cached, favorites);

    let params = QueryParams::parse("?sort=name_desc");
    let view = explorer.list(&params).await.unwrap();
    let names: Vec<&str> = view.items.iter().map(|i| i.character.name.as_str()).collect();
    assert_eq!(names, ["Rick Sanchez", "Morty Smith"]);
    assert!(view.pagination.has_next);

    // Same server query, different local sort: served from cache.
    explorer.list(&QueryParams::new()).await.unwrap();
    assert_eq!(api.hits(), 1);

    let next = next_page(&params, &view.pagination);
    let second = explorer.list(&next).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(!second.pagination.has_next);
    assert_eq!(api.hits(), 2);

    assert!(explorer.toggle_favorite(8));
    let detail = explorer.detail(8).await.unwrap();
    assert!(detail.is_favorite);
    assert_eq!(detail.character.name, "Adjudicator Rick");
}
