//! Visibility rules: which products and categories the catalog shows.
//!
//! Rules are independent conjunctions, so evaluation order never changes
//! the outcome. Filtering keeps input order.

use tracing::warn;

use crate::error::Result;
use crate::models::{CatalogSettings, Category, Product, VisibilityRules};
use crate::store::CatalogStore;

/// Whether a single product passes every enabled rule.
///
/// `min_stock_to_show` is a floor that applies even when every toggle is off.
pub fn is_product_visible(product: &Product, rules: &VisibilityRules) -> bool {
    if rules.hide_inactive && !product.is_active() {
        return false;
    }
    if rules.hide_out_of_stock && product.stock_quantity <= 0 {
        return false;
    }
    if rules.hide_zero_price && product.price_retail == 0 {
        return false;
    }
    product.stock_quantity >= rules.min_stock_to_show
}

pub fn apply_visibility_rules(products: Vec<Product>, settings: &CatalogSettings) -> Vec<Product> {
    products
        .into_iter()
        .filter(|p| is_product_visible(p, &settings.visibility))
        .collect()
}

/// Filter categories by emptiness and, when enabled, by a live stock check.
///
/// The stock check goes through [`CatalogStore::categories_with_stock`]; a
/// failed check keeps the category visible.
pub fn apply_category_visibility_rules<S: CatalogStore + ?Sized>(
    categories: Vec<Category>,
    settings: &CatalogSettings,
    store: &S,
) -> Vec<Category> {
    let categories = drop_empty_categories(categories, &settings.visibility);
    if !settings.visibility.hide_categories_no_stock || categories.is_empty() {
        return categories;
    }

    let ids: Vec<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    let checks = store.categories_with_stock(&ids);
    retain_stocked(categories, checks)
}

/// Apply `hide_empty_categories`.
pub fn drop_empty_categories(categories: Vec<Category>, rules: &VisibilityRules) -> Vec<Category> {
    if !rules.hide_empty_categories {
        return categories;
    }
    categories.into_iter().filter(|c| c.count != 0).collect()
}

/// Keep categories whose stock check (same index) succeeded with `true`
/// or failed outright.
pub fn retain_stocked(categories: Vec<Category>, checks: Vec<Result<bool>>) -> Vec<Category> {
    let mut checks = checks.into_iter();
    categories
        .into_iter()
        .filter(|category| match checks.next() {
            Some(Ok(has_stock)) => has_stock,
            Some(Err(e)) => {
                warn!(category = %category.id, error = %e, "category stock check failed; keeping category");
                true
            }
            None => {
                warn!(category = %category.id, "no stock check result; keeping category");
                true
            }
        })
        .collect()
}
