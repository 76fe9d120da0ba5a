//! Data store boundary.
//!
//! The catalog core never talks to a database directly; it goes through
//! [`CatalogStore`]. Two backends ship with the crate: [`duckdb::DuckDbStore`]
//! (in-process) and [`rest::RestStore`] (hosted PostgREST-style endpoint).

pub mod duckdb;
pub mod rest;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{CatalogSettings, CategoryRecord, Product};

pub use self::duckdb::DuckDbStore;
pub use self::rest::RestStore;

// ---------------------------------------------------------------------------
// CatalogFilters
// ---------------------------------------------------------------------------

/// UI-level filter state translated into a single store query.
///
/// Empty `categories` / `brands` mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFilters {
    pub search: Option<String>,
    pub categories: Vec<String>,
    pub brands: Vec<String>,
    /// Inclusive `(min, max)` bounds on `price_retail`, in cents.
    pub price_range: Option<(u64, u64)>,
    pub in_stock_only: bool,
    pub featured_only: bool,
    pub new_only: bool,
}

impl CatalogFilters {
    /// Trimmed search text, or `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// One page of products plus the store's own "more rows exist" flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPage {
    pub rows: Vec<Product>,
    pub has_more: bool,
}

// ---------------------------------------------------------------------------
// CatalogStore
// ---------------------------------------------------------------------------

/// Query/command interface to the backing data store.
pub trait CatalogStore {
    /// Fetch page `page` (1-based) of products matching `filters`.
    fn query_products(
        &self,
        filters: &CatalogFilters,
        page: usize,
        page_size: usize,
    ) -> Result<ProductPage>;

    fn query_categories(&self) -> Result<Vec<CategoryRecord>>;

    /// Product count per category id, before any visibility filtering.
    fn count_products_per_category(&self) -> Result<HashMap<String, i64>>;

    /// Settings for `user_id`, or the global record when `None`.
    fn get_settings(&self, user_id: Option<&str>) -> Result<Option<CatalogSettings>>;

    fn save_settings(&self, user_id: Option<&str>, settings: &CatalogSettings) -> Result<()>;

    /// Whether any product in the category has `stock_quantity > 0`.
    fn category_has_stock(&self, category_id: &str) -> Result<bool>;

    /// Stock check for several categories; result `i` answers `category_ids[i]`.
    ///
    /// Backends that can answer in one round trip should override this.
    fn categories_with_stock(&self, category_ids: &[&str]) -> Vec<Result<bool>> {
        category_ids
            .iter()
            .map(|id| self.category_has_stock(id))
            .collect()
    }
}

impl<S: CatalogStore + ?Sized> CatalogStore for std::sync::Arc<S> {
    fn query_products(
        &self,
        filters: &CatalogFilters,
        page: usize,
        page_size: usize,
    ) -> Result<ProductPage> {
        (**self).query_products(filters, page, page_size)
    }

    fn query_categories(&self) -> Result<Vec<CategoryRecord>> {
        (**self).query_categories()
    }

    fn count_products_per_category(&self) -> Result<HashMap<String, i64>> {
        (**self).count_products_per_category()
    }

    fn get_settings(&self, user_id: Option<&str>) -> Result<Option<CatalogSettings>> {
        (**self).get_settings(user_id)
    }

    fn save_settings(&self, user_id: Option<&str>, settings: &CatalogSettings) -> Result<()> {
        (**self).save_settings(user_id, settings)
    }

    fn category_has_stock(&self, category_id: &str) -> Result<bool> {
        (**self).category_has_stock(category_id)
    }

    fn categories_with_stock(&self, category_ids: &[&str]) -> Vec<Result<bool>> {
        (**self).categories_with_stock(category_ids)
    }
}

/// Zero-based row offset for a 1-based page.
pub(crate) fn page_offset(page: usize, page_size: usize) -> usize {
    page.saturating_sub(1) * page_size
}
