//! Catalog storefront core.
//!
//! Browsing, visibility filtering, variant selection, and quote building for
//! a product catalog. Products, categories, and per-store settings live
//! behind a [`CatalogStore`] (in-process DuckDB or a hosted REST endpoint);
//! the quote cart and favorites persist through a [`Storage`] on the client.
//!
//! # Quick start
//!
//! ```no_run
//! use catalog_storefront::{NewCartItem, Storefront};
//!
//! let mut sf = Storefront::builder().in_memory().build().unwrap();
//!
//! // Browse
//! sf.feed_mut().set_search_query("iphone");
//! sf.feed_mut().refresh().unwrap();
//!
//! // Quote the first hit
//! if let Some(product) = sf.feed().products().first().cloned() {
//!     sf.cart_mut().add_item(NewCartItem::from_product(product));
//! }
//! println!("{}", sf.compose_quote());
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod favorites;
pub mod models;
pub mod quote;
pub mod share;
pub mod sql_builder;
pub mod storage;
pub mod store;
pub mod variants;
pub mod visibility;

#[cfg(feature = "async")]
pub use async_client::AsyncCatalog;
pub use cache::{SettingsCache, SettingsSource};
pub use cart::{CartPhase, QuoteCart};
pub use catalog::{CatalogFeed, FetchOutcome, FetchTicket};
pub use connection::Connection;
pub use error::{Result, StorefrontError};
pub use favorites::Favorites;
pub use models::*;
pub use quote::{compose_multi_item_quote, compose_multi_item_quote_on, QuoteStyle};
pub use sql_builder::{SqlBuilder, SqlValue};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{CatalogFilters, CatalogStore, DuckDbStore, ProductPage, RestStore};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

/// Type-erased store shared by the feed and any async wrapper.
pub type DynStore = dyn CatalogStore + Send + Sync;

// ---------------------------------------------------------------------------
// StorefrontBuilder
// ---------------------------------------------------------------------------

enum Backend {
    DuckDbFile(PathBuf),
    DuckDbMemory,
    Rest { endpoint: String, api_key: String },
    Custom(Arc<DynStore>),
}

impl Backend {
    fn describe(&self) -> String {
        match self {
            Backend::DuckDbFile(path) => format!("duckdb:{}", path.display()),
            Backend::DuckDbMemory => "duckdb:memory".to_string(),
            Backend::Rest { endpoint, .. } => format!("rest:{}", endpoint),
            Backend::Custom(_) => "custom".to_string(),
        }
    }
}

/// Builder for configuring and constructing a [`Storefront`].
///
/// Use [`Storefront::builder()`] to obtain one. Without further
/// configuration the catalog lives in `catalog.duckdb` under the default
/// storage directory and the cart is persisted next to it.
pub struct StorefrontBuilder {
    storage_dir: Option<PathBuf>,
    backend: Option<Backend>,
    storage: Option<Arc<dyn Storage>>,
    settings_ttl: Duration,
    page_size: usize,
    timeout: Duration,
    user_id: Option<String>,
}

impl Default for StorefrontBuilder {
    fn default() -> Self {
        Self {
            storage_dir: None,
            backend: None,
            storage: None,
            settings_ttl: config::SETTINGS_TTL,
            page_size: config::DEFAULT_PAGE_SIZE,
            timeout: config::DEFAULT_TIMEOUT,
            user_id: None,
        }
    }
}

impl StorefrontBuilder {
    /// Directory for the cart, favorites, and the default DuckDB file.
    ///
    /// Defaults to the platform data directory
    /// (e.g. `~/.local/share/catalog-storefront` on Linux).
    pub fn storage_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.storage_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep everything in process: in-memory DuckDB and in-memory storage.
    pub fn in_memory(mut self) -> Self {
        self.backend = Some(Backend::DuckDbMemory);
        self.storage = Some(Arc::new(MemoryStorage::new()));
        self
    }

    /// Use a DuckDB database file as the catalog store.
    pub fn database<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.backend = Some(Backend::DuckDbFile(path.as_ref().to_path_buf()));
        self
    }

    /// Use a hosted PostgREST endpoint as the catalog store.
    pub fn rest(mut self, endpoint: &str, api_key: &str) -> Self {
        self.backend = Some(Backend::Rest {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        });
        self
    }

    /// Use an already constructed store.
    pub fn store(mut self, store: Arc<DynStore>) -> Self {
        self.backend = Some(Backend::Custom(store));
        self
    }

    /// Persist the cart and favorites through `storage` instead of files.
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// How long loaded settings are served from memory. Defaults to 15 minutes.
    pub fn settings_ttl(mut self, ttl: Duration) -> Self {
        self.settings_ttl = ttl;
        self
    }

    /// Products per catalog page. Defaults to 20.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// HTTP timeout for the REST backend. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load and save settings for this user instead of the global record.
    pub fn user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    /// Open the store and storage, then hydrate the cart and favorites.
    pub fn build(self) -> Result<Storefront> {
        let storage_dir = self.storage_dir.unwrap_or_else(config::default_storage_dir);
        let backend = self
            .backend
            .unwrap_or_else(|| Backend::DuckDbFile(storage_dir.join("catalog.duckdb")));
        let backend_label = backend.describe();

        let store: Arc<DynStore> = match backend {
            Backend::DuckDbFile(path) => Arc::new(DuckDbStore::open(&path)?),
            Backend::DuckDbMemory => Arc::new(DuckDbStore::open_in_memory()?),
            Backend::Rest { endpoint, api_key } => {
                Arc::new(RestStore::new(&endpoint, &api_key, self.timeout)?)
            }
            Backend::Custom(store) => store,
        };

        let storage: Arc<dyn Storage> = match self.storage {
            Some(storage) => storage,
            None => Arc::new(FileStorage::new(&storage_dir)?),
        };

        let settings = SettingsCache::new(self.settings_ttl, self.user_id);
        let favorites = Favorites::open(storage.clone());
        let feed = CatalogFeed::new(store, settings, favorites, self.page_size)?;
        let cart = QuoteCart::open(storage);

        tracing::debug!(backend = %backend_label, items = cart.len(), "storefront ready");
        Ok(Storefront {
            feed,
            cart,
            backend: backend_label,
        })
    }
}

// ---------------------------------------------------------------------------
// Storefront
// ---------------------------------------------------------------------------

/// One shopper session: the catalog feed plus the quote cart.
///
/// Created via [`Storefront::builder()`].
pub struct Storefront {
    feed: CatalogFeed<Arc<DynStore>>,
    cart: QuoteCart,
    backend: String,
}

impl Storefront {
    pub fn builder() -> StorefrontBuilder {
        StorefrontBuilder::default()
    }

    // -- Accessors ---------------------------------------------------------

    pub fn feed(&self) -> &CatalogFeed<Arc<DynStore>> {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut CatalogFeed<Arc<DynStore>> {
        &mut self.feed
    }

    pub fn cart(&self) -> &QuoteCart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut QuoteCart {
        &mut self.cart
    }

    pub fn store(&self) -> &Arc<DynStore> {
        self.feed.store()
    }

    /// Give up the cart and keep only the feed, e.g. to hand it to
    /// [`AsyncCatalog`](crate::async_client::AsyncCatalog).
    pub fn into_feed(self) -> CatalogFeed<Arc<DynStore>> {
        self.feed
    }

    pub fn into_parts(self) -> (CatalogFeed<Arc<DynStore>>, QuoteCart) {
        (self.feed, self.cart)
    }

    // -- Quotes ------------------------------------------------------------

    /// Quote message for the whole cart, styled by the current settings.
    pub fn compose_quote(&self) -> String {
        let (settings, _) = self.feed.load_settings();
        compose_multi_item_quote_on(
            self.cart.items(),
            chrono::Local::now().date_naive(),
            &QuoteStyle::from_settings(&settings),
        )
    }

    /// WhatsApp link carrying the cart quote.
    ///
    /// `phone` overrides the store's configured contact number.
    pub fn quote_link(&self, phone: Option<&str>) -> Result<Url> {
        let (settings, _) = self.feed.load_settings();
        let number = match phone {
            Some(p) => p.to_string(),
            None => settings.contact.whatsapp_number.clone().ok_or_else(|| {
                StorefrontError::Validation("no WhatsApp number configured".into())
            })?,
        };
        share::whatsapp_link(&number, &self.compose_quote())
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Storefront {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Storefront(backend={}, products={}, cart_items={}, user={})",
            self.backend,
            self.feed.products().len(),
            self.cart.len(),
            self.feed.settings_cache().user_id().unwrap_or("-")
        )
    }
}
