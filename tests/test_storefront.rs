//! Storefront builder and session-level tests.

mod common;

use std::sync::Arc;
use std::time::Duration;

use catalog_storefront::{
    CatalogSettings, CatalogStore, DynStore, FetchOutcome, MemoryStorage, NewCartItem,
    Storefront, StorefrontError,
};

fn seeded() -> Arc<DynStore> {
    Arc::new(common::setup_sample_store())
}

#[test]
fn in_memory_storefront_starts_empty() {
    let mut sf = Storefront::builder().in_memory().build().unwrap();
    assert!(sf.cart().is_empty());
    assert_eq!(sf.feed_mut().refresh().unwrap(), FetchOutcome::Applied { received: 0 });
    assert!(sf.feed().products().is_empty());
}

#[test]
fn injected_store_is_queried() {
    let mut sf = Storefront::builder()
        .store(seeded())
        .storage(Arc::new(MemoryStorage::new()))
        .page_size(4)
        .build()
        .unwrap();

    sf.feed_mut().refresh().unwrap();
    assert_eq!(sf.feed().products().len(), 4);
    assert!(sf.feed().has_more());
    assert_eq!(sf.feed().page_size(), 4);
}

#[test]
fn zero_page_size_fails_to_build() {
    let result = Storefront::builder().in_memory().page_size(0).build();
    assert!(matches!(result, Err(StorefrontError::InvalidArgument(_))));
}

#[test]
fn settings_are_read_for_configured_user() {
    let store = common::setup_sample_store();
    let mut mine = CatalogSettings::default();
    mine.visibility.hide_out_of_stock = true;
    store.save_settings(Some("user-7"), &mine).unwrap();

    let mut sf = Storefront::builder()
        .store(Arc::new(store))
        .storage(Arc::new(MemoryStorage::new()))
        .user_id("user-7")
        .settings_ttl(Duration::from_secs(5))
        .build()
        .unwrap();

    sf.feed_mut().refresh().unwrap();
    assert!(sf.feed().products().iter().all(|p| p.stock_quantity > 0));
    assert_eq!(sf.feed().products().len(), 4);
}

#[test]
fn storage_dir_persists_cart_between_sessions() {
    let tmp = tempfile::tempdir().unwrap();
    let product = common::sample_products().remove(0);

    {
        let mut sf = Storefront::builder()
            .store(seeded())
            .storage_dir(tmp.path())
            .build()
            .unwrap();
        sf.cart_mut().add_item(NewCartItem::from_product(product));
        sf.feed_mut().toggle_favorite("p1");
    }

    let sf = Storefront::builder()
        .store(seeded())
        .storage_dir(tmp.path())
        .build()
        .unwrap();
    assert_eq!(sf.cart().len(), 1);
    assert!(sf.feed().is_favorite("p1"));
}

#[test]
fn database_path_is_created() {
    let tmp = tempfile::tempdir().unwrap();
    let db = tmp.path().join("db").join("catalog.duckdb");
    let sf = Storefront::builder()
        .database(&db)
        .storage(Arc::new(MemoryStorage::new()))
        .build()
        .unwrap();
    assert!(db.exists());
    assert!(sf.to_string().contains("backend=duckdb:"));
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

#[test]
fn compose_quote_uses_store_settings() {
    let store = common::setup_sample_store();
    let mut settings = CatalogSettings::default();
    settings.contact.store_name = Some("Loja Centro".into());
    settings.contact.whatsapp_number = Some("(11) 98765-4321".into());
    store.save_settings(None, &settings).unwrap();

    let mut sf = Storefront::builder()
        .store(Arc::new(store))
        .storage(Arc::new(MemoryStorage::new()))
        .build()
        .unwrap();
    assert_eq!(sf.compose_quote(), "");

    let product = common::sample_products().remove(3);
    sf.cart_mut().add_item(NewCartItem::from_product(product));

    let quote = sf.compose_quote();
    assert!(quote.starts_with("*Orçamento - Loja Centro*"));
    assert!(quote.contains("*1. Galaxy S24*"));

    let link = sf.quote_link(None).unwrap();
    assert_eq!(link.path(), "/5511987654321");
}

#[test]
fn quote_link_needs_a_number() {
    let mut sf = Storefront::builder().in_memory().build().unwrap();
    let product = common::sample_products().remove(0);
    sf.cart_mut().add_item(NewCartItem::from_product(product));

    assert!(matches!(sf.quote_link(None), Err(StorefrontError::Validation(_))));
    let link = sf.quote_link(Some("11987654321")).unwrap();
    assert_eq!(link.path(), "/5511987654321");
}

#[test]
fn quote_link_for_empty_cart_is_rejected() {
    let sf = Storefront::builder().in_memory().build().unwrap();
    assert!(matches!(
        sf.quote_link(Some("11987654321")),
        Err(StorefrontError::Validation(_))
    ));
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

#[test]
fn display_summarizes_session() {
    let mut sf = Storefront::builder()
        .store(seeded())
        .storage(Arc::new(MemoryStorage::new()))
        .user_id("user-7")
        .build()
        .unwrap();
    sf.feed_mut().refresh().unwrap();

    assert_eq!(
        sf.to_string(),
        "Storefront(backend=custom, products=6, cart_items=0, user=user-7)"
    );
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

fn error_kind(err: &StorefrontError) -> &'static str {
    match err {
        StorefrontError::DuckDb(_) => "duckdb",
        StorefrontError::Http(_) => "http",
        StorefrontError::Io(_) => "io",
        StorefrontError::Json(_) => "json",
        StorefrontError::InvalidArgument(_) => "invalid_argument",
        StorefrontError::TransientFetch(_) => "transient_fetch",
        StorefrontError::Validation(_) => "validation",
    }
}

#[test]
fn only_transient_fetches_are_retryable() {
    let io: StorefrontError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    let cases = [
        (io, "io", false),
        (StorefrontError::InvalidArgument("page".into()), "invalid_argument", false),
        (StorefrontError::Validation("phone".into()), "validation", false),
        (StorefrontError::TransientFetch("timeout".into()), "transient_fetch", true),
    ];
    for (err, kind, retryable) in cases {
        assert_eq!(error_kind(&err), kind);
        assert_eq!(err.is_retryable(), retryable, "{err}");
    }
}
