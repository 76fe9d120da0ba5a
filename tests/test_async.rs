//! Async catalog wrapper tests.

#![cfg(feature = "async")]

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use catalog_storefront::{
    AsyncCatalog, CatalogFeed, CatalogSettings, CatalogStore, DuckDbStore, Favorites,
    FetchOutcome, MemoryStorage, SettingsCache, Storefront, VisibilityRules,
};
use common::FakeStore;

fn catalog_over<S: CatalogStore + Send + Sync + 'static>(store: S, page_size: usize) -> AsyncCatalog<S> {
    let feed = CatalogFeed::new(
        Arc::new(store),
        SettingsCache::new(Duration::from_secs(60), None),
        Favorites::open(MemoryStorage::new()),
        page_size,
    )
    .unwrap();
    AsyncCatalog::new(feed)
}

#[tokio::test]
async fn search_then_load_more() {
    let catalog = catalog_over(common::setup_sample_store(), 2);

    let outcome = catalog.search("iphone").await.unwrap();
    assert_eq!(outcome, FetchOutcome::Applied { received: 2 });
    assert!(catalog.with_feed(|f| f.has_more()).unwrap());

    assert_eq!(
        catalog.load_more().await.unwrap(),
        FetchOutcome::Applied { received: 1 }
    );
    assert_eq!(catalog.load_more().await.unwrap(), FetchOutcome::Skipped);

    let ids: Vec<String> = catalog.products().unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec!["p1", "p3", "p2"]);
}

#[tokio::test]
async fn clones_share_the_feed() {
    let catalog = catalog_over(common::setup_sample_store(), 10);
    let other = catalog.clone();

    catalog.refresh().await.unwrap();
    assert_eq!(other.products().unwrap().len(), 6);
}

#[tokio::test]
async fn stale_result_is_superseded() {
    let catalog = catalog_over(common::setup_sample_store(), 10);

    let ticket = catalog
        .with_feed(|f| f.begin_refresh(Arc::new(CatalogSettings::default())))
        .unwrap();
    let stale = catalog.with_feed(|f| ticket.execute(f.store())).unwrap();

    catalog.search("galaxy").await.unwrap();
    let outcome = catalog
        .with_feed(|f| f.complete_fetch(ticket, stale))
        .unwrap()
        .unwrap();

    assert_eq!(outcome, FetchOutcome::Superseded);
    let ids: Vec<String> = catalog.products().unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec!["p4"]);
}

#[tokio::test]
async fn fetch_errors_surface_and_are_recorded() {
    let store = FakeStore::with_products(common::sample_products());
    store.fail_products.store(true, Ordering::SeqCst);
    let catalog = catalog_over(store, 10);

    let err = catalog.refresh().await.unwrap_err();
    assert!(err.is_retryable());
    assert!(catalog.with_feed(|f| f.error().is_some()).unwrap());
}

#[tokio::test]
async fn concurrent_stock_checks_keep_category_order() {
    let store = common::setup_sample_store();
    store
        .save_settings(
            None,
            &CatalogSettings {
                visibility: VisibilityRules {
                    hide_categories_no_stock: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .unwrap();
    let catalog = catalog_over(store, 10);

    let categories = catalog.categories_with_counts().await.unwrap();
    let ids: Vec<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["phones", "tablets"]);
}

#[tokio::test]
async fn failed_stock_check_keeps_category() {
    let mut store = FakeStore::with_products(common::sample_products())
        .with_settings(CatalogSettings {
            visibility: VisibilityRules {
                hide_categories_no_stock: true,
                ..Default::default()
            },
            ..Default::default()
        });
    store.categories = common::sample_categories();
    store
        .failing_stock
        .lock()
        .unwrap()
        .insert("accessories".to_string());
    let catalog = catalog_over(store, 10);

    let categories = catalog.categories_with_counts().await.unwrap();
    let ids: Vec<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["phones", "tablets", "accessories"]);
}

#[tokio::test]
async fn storefront_feed_runs_async() {
    let sf = Storefront::builder()
        .store(Arc::new(common::setup_sample_store()))
        .storage(Arc::new(MemoryStorage::new()))
        .build()
        .unwrap();
    let catalog = AsyncCatalog::new(sf.into_feed());

    catalog.search("samsung").await.unwrap();
    assert_eq!(catalog.products().unwrap().len(), 1);
}

#[test]
fn async_catalog_accepts_concrete_store() {
    let feed = CatalogFeed::new(
        Arc::new(DuckDbStore::open_in_memory().unwrap()),
        SettingsCache::new(Duration::from_secs(60), None),
        Favorites::open(MemoryStorage::new()),
        5,
    )
    .unwrap();
    let catalog = AsyncCatalog::new(feed);
    assert!(catalog.products().unwrap().is_empty());
}
