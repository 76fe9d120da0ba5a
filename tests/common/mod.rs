//! Shared test fixtures for the catalog storefront integration tests.
//!
//! Provides `setup_sample_store()` which creates an in-memory DuckDB store
//! populated with a small catalog (products loaded via an NDJSON temp file,
//! categories via upsert), plus `FakeStore` and `FailingStorage` doubles for
//! exercising failure paths.

#![allow(dead_code)]

use catalog_storefront::{
    CatalogFilters, CatalogSettings, CatalogStore, CategoryRecord, DuckDbStore, Product,
    ProductPage, ProductSpecs, Result, Storage, StorefrontError,
};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::NamedTempFile;

// ---------------------------------------------------------------------------
// Sample data
// ---------------------------------------------------------------------------

/// Build an active product with no specs, stock, or price.
pub fn product(id: &str, name: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        brand: String::new(),
        model_id: None,
        category_id: None,
        specs: ProductSpecs::default(),
        price_retail: 0,
        stock_quantity: 0,
        status: "active".to_string(),
        featured: false,
        is_new: false,
        has_discount: false,
        image_url: None,
    }
}

/// Product variant of a model with the usual phone specs filled in.
pub fn variant(
    id: &str,
    model: &str,
    ram: &str,
    storage: &str,
    color: &str,
    hex: &str,
    price: u64,
) -> Product {
    Product {
        model_id: Some(model.to_string()),
        specs: ProductSpecs::default()
            .with("ram", ram)
            .with("storage", storage)
            .with("color", color)
            .with("color_hex", hex),
        price_retail: price,
        ..product(id, &format!("{} {}/{}", model, ram, storage))
    }
}

/// Six products across three categories.
///
/// Sorted by name they come out as p6, p4, p5, p1, p3, p2.
pub fn sample_products() -> Vec<Product> {
    vec![
        Product {
            name: "iPhone 15 8GB/128GB".into(),
            brand: "Apple".into(),
            model_id: Some("iphone-15".into()),
            category_id: Some("phones".into()),
            specs: ProductSpecs::default()
                .with("ram", "8GB")
                .with("storage", "128GB")
                .with("color", "Preto")
                .with("color_hex", "#000000"),
            price_retail: 499_900,
            stock_quantity: 5,
            featured: true,
            ..product("p1", "")
        },
        Product {
            name: "iPhone 15 8GB/256GB".into(),
            brand: "Apple".into(),
            model_id: Some("iphone-15".into()),
            category_id: Some("phones".into()),
            specs: ProductSpecs::default()
                .with("ram", "8GB")
                .with("storage", "256GB")
                .with("color", "Azul")
                .with("color_hex", "#1e3a8a"),
            price_retail: 579_900,
            stock_quantity: 0,
            ..product("p2", "")
        },
        Product {
            name: "iPhone 15 8GB/128GB Azul".into(),
            brand: "Apple".into(),
            model_id: Some("iphone-15".into()),
            category_id: Some("phones".into()),
            specs: ProductSpecs::default()
                .with("ram", "8GB")
                .with("storage", "128GB")
                .with("color", "Azul")
                .with("color_hex", "#1e3a8a"),
            price_retail: 499_900,
            stock_quantity: 2,
            is_new: true,
            ..product("p3", "")
        },
        Product {
            name: "Galaxy S24 8GB/256GB".into(),
            brand: "Samsung".into(),
            model_id: Some("galaxy-s24".into()),
            category_id: Some("phones".into()),
            specs: ProductSpecs::default()
                .with("ram", "8GB")
                .with("storage", "256GB")
                .with("color", "Cinza"),
            price_retail: 459_900,
            stock_quantity: 3,
            ..product("p4", "")
        },
        Product {
            name: "iPad Air".into(),
            brand: "Apple".into(),
            category_id: Some("tablets".into()),
            price_retail: 0,
            stock_quantity: 4,
            ..product("p5", "")
        },
        Product {
            name: "Capinha".into(),
            brand: "Generic".into(),
            category_id: Some("accessories".into()),
            price_retail: 4_990,
            stock_quantity: 0,
            status: "inactive".into(),
            ..product("p6", "")
        },
    ]
}

pub fn sample_categories() -> Vec<CategoryRecord> {
    [
        ("phones", "Celulares"),
        ("tablets", "Tablets"),
        ("accessories", "Acessórios"),
        ("wearables", "Relógios"),
    ]
    .into_iter()
    .map(|(id, name)| CategoryRecord {
        id: id.to_string(),
        name: name.to_string(),
    })
    .collect()
}

// ---------------------------------------------------------------------------
// DuckDB fixture
// ---------------------------------------------------------------------------

/// In-memory DuckDB store loaded with `sample_products()` and
/// `sample_categories()`.
pub fn setup_sample_store() -> DuckDbStore {
    let store = DuckDbStore::open_in_memory().unwrap();
    import_products(&store, &sample_products());
    store.upsert_categories(&sample_categories()).unwrap();
    store
}

/// Write products to an NDJSON temp file and import it.
pub fn import_products(store: &DuckDbStore, products: &[Product]) {
    let mut file = NamedTempFile::new().unwrap();
    for p in products {
        writeln!(file, "{}", serde_json::to_string(p).unwrap()).unwrap();
    }
    file.flush().unwrap();

    let path = file.path().to_str().unwrap();
    store.connection().import_products_ndjson(path).unwrap();
    // NamedTempFile is dropped here, but DuckDB has already read the data
}

// ---------------------------------------------------------------------------
// FakeStore
// ---------------------------------------------------------------------------

/// Scriptable in-memory `CatalogStore`.
///
/// Products are returned in list order; search matches names
/// case-insensitively. Flags switch individual calls to failing.
#[derive(Default)]
pub struct FakeStore {
    pub products: Vec<Product>,
    pub categories: Vec<CategoryRecord>,
    pub settings: Mutex<Option<CatalogSettings>>,
    pub fail_products: AtomicBool,
    pub fail_settings: AtomicBool,
    pub failing_stock: Mutex<HashSet<String>>,
    pub product_queries: AtomicUsize,
    pub settings_reads: AtomicUsize,
}

impl FakeStore {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Default::default()
        }
    }

    pub fn with_settings(self, settings: CatalogSettings) -> Self {
        *self.settings.lock().unwrap() = Some(settings);
        self
    }

    pub fn settings_reads(&self) -> usize {
        self.settings_reads.load(Ordering::SeqCst)
    }
}

impl CatalogStore for FakeStore {
    fn query_products(
        &self,
        filters: &CatalogFilters,
        page: usize,
        page_size: usize,
    ) -> Result<ProductPage> {
        self.product_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_products.load(Ordering::SeqCst) {
            return Err(StorefrontError::TransientFetch("store offline".into()));
        }

        let term = filters.search_term().map(str::to_lowercase);
        let matching: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| match &term {
                Some(t) => p.name.to_lowercase().contains(t),
                None => true,
            })
            .collect();

        let start = (page - 1) * page_size;
        let end = (start + page_size).min(matching.len());
        let rows = if start < matching.len() {
            matching[start..end].iter().map(|p| (*p).clone()).collect()
        } else {
            Vec::new()
        };
        Ok(ProductPage {
            rows,
            has_more: end < matching.len(),
        })
    }

    fn query_categories(&self) -> Result<Vec<CategoryRecord>> {
        Ok(self.categories.clone())
    }

    fn count_products_per_category(&self) -> Result<HashMap<String, i64>> {
        let mut counts = HashMap::new();
        for id in self.products.iter().filter_map(|p| p.category_id.clone()) {
            *counts.entry(id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn get_settings(&self, _user_id: Option<&str>) -> Result<Option<CatalogSettings>> {
        self.settings_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_settings.load(Ordering::SeqCst) {
            return Err(StorefrontError::TransientFetch("settings offline".into()));
        }
        Ok(self.settings.lock().unwrap().clone())
    }

    fn save_settings(&self, _user_id: Option<&str>, settings: &CatalogSettings) -> Result<()> {
        *self.settings.lock().unwrap() = Some(settings.clone());
        Ok(())
    }

    fn category_has_stock(&self, category_id: &str) -> Result<bool> {
        if self.failing_stock.lock().unwrap().contains(category_id) {
            return Err(StorefrontError::TransientFetch(format!(
                "stock check for {} failed",
                category_id
            )));
        }
        Ok(self
            .products
            .iter()
            .any(|p| p.category_id.as_deref() == Some(category_id) && p.stock_quantity > 0))
    }
}

// ---------------------------------------------------------------------------
// FailingStorage
// ---------------------------------------------------------------------------

/// Storage whose every call fails.
pub struct FailingStorage;

impl Storage for FailingStorage {
    fn read(&self, _key: &str) -> Result<Option<String>> {
        Err(StorefrontError::Io(std::io::Error::other("disk unavailable")))
    }

    fn write(&self, _key: &str, _value: &str) -> Result<()> {
        Err(StorefrontError::Io(std::io::Error::other("disk unavailable")))
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Err(StorefrontError::Io(std::io::Error::other("disk unavailable")))
    }
}
