//! Model grouping and variant extraction.
//!
//! Products that share a `model_id` are variants of one model, differing by
//! RAM, storage and color. These helpers are pure and allocate fresh results
//! on every call.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::Product;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Products sharing one model key, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGroup {
    pub key: String,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorOption {
    pub name: String,
    pub hex: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u64,
    pub max: u64,
}

/// Selectable options derived from one model group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariants {
    pub rams: Vec<String>,
    pub storages: Vec<String>,
    pub colors: Vec<ColorOption>,
    pub price_range: PriceRange,
}

/// Requested variant attributes. `None` matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecQuery {
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub color: Option<String>,
}

/// One listing entry per model: its first product plus derived variants.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub key: String,
    pub representative: Product,
    pub variants: ProductVariants,
    pub variant_count: usize,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Partition products into model groups.
///
/// Groups appear in the order their key is first seen, and products keep
/// their input order inside each group.
pub fn group_products_by_model(products: &[Product]) -> Vec<ModelGroup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<ModelGroup> = Vec::new();

    for product in products {
        let key = product.model_key();
        match index.get(key) {
            Some(&i) => groups[i].products.push(product.clone()),
            None => {
                index.insert(key, groups.len());
                groups.push(ModelGroup {
                    key: key.to_string(),
                    products: vec![product.clone()],
                });
            }
        }
    }

    groups
}

/// Derive the distinct RAM, storage and color options and the price range.
pub fn extract_variants(products: &[Product]) -> ProductVariants {
    let mut rams: BTreeSet<String> = BTreeSet::new();
    let mut storages: BTreeSet<String> = BTreeSet::new();
    let mut seen_colors: HashSet<&str> = HashSet::new();
    let mut colors: Vec<ColorOption> = Vec::new();
    let mut min = u64::MAX;
    let mut max = 0u64;

    for product in products {
        let specs = &product.specs;
        if let Some(ram) = specs.ram() {
            rams.insert(ram.to_string());
        }
        if let Some(storage) = specs.storage() {
            storages.insert(storage.to_string());
        }
        if let Some(color) = specs.color() {
            if seen_colors.insert(color) {
                colors.push(ColorOption {
                    name: color.to_string(),
                    hex: specs.color_hex().map(str::to_string),
                });
            }
        }
        if product.price_retail > 0 {
            min = min.min(product.price_retail);
            max = max.max(product.price_retail);
        }
    }

    let price_range = if min == u64::MAX {
        PriceRange::default()
    } else {
        PriceRange { min, max }
    };

    ProductVariants {
        rams: rams.into_iter().collect(),
        storages: storages.into_iter().collect(),
        colors,
        price_range,
    }
}

/// First product (in list order) matching every requested attribute.
pub fn find_product_by_specs<'a>(products: &'a [Product], query: &SpecQuery) -> Option<&'a Product> {
    fn matches(wanted: &Option<String>, actual: Option<&str>) -> bool {
        match wanted {
            None => true,
            Some(w) => actual == Some(w.as_str()),
        }
    }

    products.iter().find(|p| {
        matches(&query.ram, p.specs.ram())
            && matches(&query.storage, p.specs.storage())
            && matches(&query.color, p.specs.color())
    })
}

/// Collapse a product list into one summary per model group.
pub fn model_summaries(products: &[Product]) -> Vec<ModelSummary> {
    group_products_by_model(products)
        .into_iter()
        .filter_map(|group| {
            let variants = extract_variants(&group.products);
            let variant_count = group.products.len();
            let representative = group.products.into_iter().next()?;
            Some(ModelSummary {
                key: group.key,
                representative,
                variants,
                variant_count,
            })
        })
        .collect()
}
