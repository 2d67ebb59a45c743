//! Command-line walk through the character explorer
//!
//! This example demonstrates:
//! - Decoding list state from a query string
//! - Fetching a page from the character API (with cache and retries)
//! - Toggling favorites and watching another context see the change
//! - Building the next URL after a filter change or page move
//!
//! Usage:
//!   cargo run --example browse -- "?q=rick&status=alive&sort=created_desc" [config.yaml]

use explorer::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "explorer=info".into()),
        )
        .init();

    println!("🔎 Character Explorer");
    println!("=====================\n");

    let mut args = std::env::args().skip(1);
    let query = args.next().unwrap_or_default();
    let config = match args.next() {
        Some(path) => ExplorerConfig::from_yaml_file(&path)?,
        None => ExplorerConfig::default_config(),
    };

    println!("✅ API: {}", config.api.base_url);
    println!("✅ Storage: {:?}\n", config.storage.backend);

    match (config.storage.backend, &config.storage.path) {
        (StorageBackend::File, Some(path)) => {
            let storage = FileStorage::open(path)?;
            let watcher = storage.watch(Duration::from_millis(config.storage.poll_interval_ms));
            let other = storage.open_context();
            run(&config, storage, other, &query).await?;
            watcher.abort();
        }
        _ => {
            let storage = InMemoryStorage::new();
            let other = storage.open_context();
            run(&config, storage, other, &query).await?;
        }
    }

    Ok(())
}

/// `other` is a second context on the same storage, standing in for another tab
async fn run<K>(config: &ExplorerConfig, storage: K, other: K, query: &str) -> Result<()>
where
    K: KeyValueStore + 'static,
{
    let source = CachedSource::new(
        HttpCharacterSource::new(&config.api)?,
        Duration::from_secs(config.api.stale_time_secs),
    );
    let favorites = Arc::new(FavoritesStore::new(
        storage,
        config.favorites.storage_key.as_str(),
    ));
    let sync = favorites.clone().spawn_sync(|set| {
        println!("🔄 Favorites changed elsewhere: {:?}", set.to_vec());
    });
    let explorer = Explorer::new(source, favorites);

    let params = QueryParams::parse(query);
    let view = explorer.list(&params).await?;

    println!("📋 State: {:?}", view.state);
    println!(
        "📄 Page {} of {}\n",
        view.pagination.page, view.pagination.total_pages
    );
    for item in &view.items {
        let star = if item.is_favorite { "★" } else { " " };
        println!(
            "  {} #{:<4} {:<28} {}",
            star,
            item.character.id,
            item.character.name,
            item.character.summary()
        );
    }
    if view.is_empty() {
        println!("  (no characters)");
    }

    if let Some(first) = view.items.first() {
        let id = first.character.id;
        let now = explorer.toggle_favorite(id);
        println!("\n⭐ Toggled #{} → favorite: {}", id, now);

        let detail = explorer.detail(id).await?;
        println!(
            "   {} appears in {} episodes",
            detail.character.name,
            detail.character.episode_count()
        );
    }

    println!("\n🔗 Next URLs:");
    println!("   next page:      ?{}", next_page(&params, &view.pagination));
    println!("   previous page:  ?{}", prev_page(&params, &view.pagination));
    println!("   favorites only: ?{}", toggle_favorites_only(&params));
    println!(
        "   sort by newest: ?{}",
        change_filters(&params, QueryUpdate::new().sort(SortKey::CreatedDesc))
    );

    // The other context removes every favorite.
    other.remove(&config.favorites.storage_key)?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    sync.abort();
    Ok(())
}
