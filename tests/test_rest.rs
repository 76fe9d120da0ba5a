//! REST store tests: query encoding, Content-Range parsing, transport errors.

use std::time::Duration;

use catalog_storefront::store::rest::{parse_content_range, product_query_pairs, ContentRange};
use catalog_storefront::{CatalogFilters, CatalogStore, RestStore, StorefrontError};

fn value_of<'a>(pairs: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .collect()
}

// ---------------------------------------------------------------------------
// product_query_pairs
// ---------------------------------------------------------------------------

#[test]
fn default_filters_page_and_order_only() {
    let pairs = product_query_pairs(&CatalogFilters::default(), 1, 20);
    assert_eq!(value_of(&pairs, "select"), vec!["*"]);
    assert_eq!(value_of(&pairs, "order"), vec!["name.asc,id.asc"]);
    assert_eq!(value_of(&pairs, "offset"), vec!["0"]);
    assert_eq!(value_of(&pairs, "limit"), vec!["20"]);
    assert_eq!(pairs.len(), 4);
}

#[test]
fn later_pages_offset_by_page_size() {
    let pairs = product_query_pairs(&CatalogFilters::default(), 3, 20);
    assert_eq!(value_of(&pairs, "offset"), vec!["40"]);
}

#[test]
fn search_covers_name_and_brand() {
    let filters = CatalogFilters {
        search: Some("galaxy".into()),
        ..Default::default()
    };
    let pairs = product_query_pairs(&filters, 1, 20);
    assert_eq!(
        value_of(&pairs, "or"),
        vec![r#"(name.ilike."*galaxy*",brand.ilike."*galaxy*")"#]
    );
}

#[test]
fn list_and_range_filters() {
    let filters = CatalogFilters {
        categories: vec!["phones".into(), "tablets".into()],
        brands: vec!["Apple".into()],
        price_range: Some((1_000, 5_000)),
        in_stock_only: true,
        featured_only: true,
        new_only: true,
        ..Default::default()
    };
    let pairs = product_query_pairs(&filters, 1, 20);

    assert_eq!(value_of(&pairs, "category_id"), vec![r#"in.("phones","tablets")"#]);
    assert_eq!(value_of(&pairs, "brand"), vec![r#"in.("Apple")"#]);
    assert_eq!(value_of(&pairs, "price_retail"), vec!["gte.1000", "lte.5000"]);
    assert_eq!(value_of(&pairs, "stock_quantity"), vec!["gt.0"]);
    assert_eq!(value_of(&pairs, "featured"), vec!["is.true"]);
    assert_eq!(value_of(&pairs, "is_new"), vec!["is.true"]);
}

#[test]
fn quotes_in_values_are_escaped() {
    let filters = CatalogFilters {
        brands: vec![r#"Acme "Pro""#.into()],
        ..Default::default()
    };
    let pairs = product_query_pairs(&filters, 1, 20);
    assert_eq!(value_of(&pairs, "brand"), vec![r#"in.("Acme \"Pro\"")"#]);
}

// ---------------------------------------------------------------------------
// Content-Range
// ---------------------------------------------------------------------------

#[test]
fn content_range_with_more_rows() {
    let range = parse_content_range("0-19/45").unwrap();
    assert_eq!(
        range,
        ContentRange {
            span: Some((0, 19)),
            total: Some(45)
        }
    );
    assert!(range.has_more(20));
}

#[test]
fn content_range_at_end() {
    assert!(!parse_content_range("40-44/45").unwrap().has_more(20));
}

#[test]
fn empty_content_range_has_no_more() {
    let empty = parse_content_range("*/0").unwrap();
    assert_eq!(empty.span, None);
    assert!(!empty.has_more(20));
    assert!(!parse_content_range("*/*").unwrap().has_more(20));
}

#[test]
fn uncounted_range_guesses_from_page_fill() {
    let full = parse_content_range("0-19/*").unwrap();
    assert_eq!(full.total, None);
    assert!(full.has_more(20));

    let partial = parse_content_range("20-31/*").unwrap();
    assert!(!partial.has_more(20));
}

#[test]
fn malformed_content_range_is_none() {
    assert!(parse_content_range("bytes").is_none());
    assert!(parse_content_range("a-b/10").is_none());
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[test]
fn invalid_endpoint_is_rejected() {
    let result = RestStore::new("not a url", "key", Duration::from_secs(1));
    assert!(matches!(result, Err(StorefrontError::InvalidArgument(_))));
}

#[test]
fn unreachable_store_is_a_transient_error() {
    // Port 9 (discard) is not listening on loopback in test environments
    let store = RestStore::new("http://127.0.0.1:9/rest/v1", "key", Duration::from_secs(2)).unwrap();
    let err = store
        .query_products(&CatalogFilters::default(), 1, 20)
        .unwrap_err();
    assert!(matches!(err, StorefrontError::TransientFetch(_)));
    assert!(err.is_retryable());
}
