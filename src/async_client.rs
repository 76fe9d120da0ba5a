//! Async wrapper around [`CatalogFeed`] for use in async runtimes (Tokio, etc.).
//!
//! Store calls run on the blocking thread pool via
//! [`tokio::task::spawn_blocking`]; the feed itself sits behind a mutex that
//! is only held between suspension points, never across one. Because a
//! fetch is split into begin / execute / complete, a search issued while an
//! older fetch is still running makes the older result arrive as
//! [`FetchOutcome::Superseded`] instead of overwriting newer results.
//!
//! # Example
//!
//! ```no_run
//! use catalog_storefront::{AsyncCatalog, Storefront};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let sf = Storefront::builder().in_memory().build().unwrap();
//!     let catalog = AsyncCatalog::new(sf.into_feed());
//!
//!     catalog.search("iphone").await.unwrap();
//!     let products = catalog.products().unwrap();
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinSet;

use crate::catalog::{CatalogFeed, FetchOutcome};
use crate::error::{Result, StorefrontError};
use crate::models::{CatalogSettings, Category, Product};
use crate::store::CatalogStore;
use crate::visibility;

fn join_error(e: tokio::task::JoinError) -> StorefrontError {
    StorefrontError::InvalidArgument(format!("Task join error: {e}"))
}

async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(join_error)?
}

/// Async handle to a catalog feed. Cheap to clone; clones share the feed.
pub struct AsyncCatalog<S: CatalogStore + Send + Sync + ?Sized + 'static> {
    feed: Arc<Mutex<CatalogFeed<Arc<S>>>>,
    store: Arc<S>,
}

impl<S: CatalogStore + Send + Sync + ?Sized + 'static> Clone for AsyncCatalog<S> {
    fn clone(&self) -> Self {
        Self {
            feed: self.feed.clone(),
            store: self.store.clone(),
        }
    }
}

impl<S: CatalogStore + Send + Sync + ?Sized + 'static> AsyncCatalog<S> {
    pub fn new(feed: CatalogFeed<Arc<S>>) -> Self {
        let store = feed.store().clone();
        Self {
            feed: Arc::new(Mutex::new(feed)),
            store,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, CatalogFeed<Arc<S>>>> {
        self.feed
            .lock()
            .map_err(|_| StorefrontError::InvalidArgument("Catalog feed lock poisoned".into()))
    }

    /// Run `f` against the feed while holding its lock.
    pub fn with_feed<T>(&self, f: impl FnOnce(&mut CatalogFeed<Arc<S>>) -> T) -> Result<T> {
        Ok(f(&mut *self.lock()?))
    }

    /// Snapshot of the products currently held.
    pub fn products(&self) -> Result<Vec<Product>> {
        self.with_feed(|feed| feed.products().to_vec())
    }

    /// Set the search text and fetch its first page.
    pub async fn search(&self, query: &str) -> Result<FetchOutcome> {
        self.lock()?.set_search_query(query);
        self.refresh().await
    }

    /// Fetch page 1 for the current filters.
    pub async fn refresh(&self) -> Result<FetchOutcome> {
        let settings = self.load_settings().await?;
        let ticket = self.lock()?.begin_refresh(settings);

        let store = self.store.clone();
        let run = ticket.clone();
        let result = blocking(move || Ok(run.execute(&*store))).await?;

        self.lock()?.complete_fetch(ticket, result)
    }

    /// Fetch and append the next page.
    pub async fn load_more(&self) -> Result<FetchOutcome> {
        let settings = self.load_settings().await?;
        let Some(ticket) = self.lock()?.begin_load_more(settings) else {
            return Ok(FetchOutcome::Skipped);
        };

        let store = self.store.clone();
        let run = ticket.clone();
        let result = blocking(move || Ok(run.execute(&*store))).await?;

        self.lock()?.complete_fetch(ticket, result)
    }

    async fn load_settings(&self) -> Result<Arc<CatalogSettings>> {
        let cache = self.lock()?.settings_cache().clone();
        let store = self.store.clone();
        blocking(move || Ok(cache.get_or_load(&*store).0)).await
    }

    /// Categories with counts after visibility rules.
    ///
    /// Stock checks for the remaining categories run concurrently, one
    /// blocking task each; results are reassembled in category order.
    pub async fn categories_with_counts(&self) -> Result<Vec<Category>> {
        let settings = self.load_settings().await?;

        let store = self.store.clone();
        let categories = blocking(move || {
            let records = store.query_categories()?;
            let counts = store.count_products_per_category()?;
            Ok(records
                .into_iter()
                .map(|r| Category {
                    count: counts.get(&r.id).copied().unwrap_or(0),
                    id: r.id,
                    name: r.name,
                })
                .collect::<Vec<_>>())
        })
        .await?;

        let categories = visibility::drop_empty_categories(categories, &settings.visibility);
        if !settings.visibility.hide_categories_no_stock || categories.is_empty() {
            return Ok(categories);
        }

        let mut tasks = JoinSet::new();
        for (i, category) in categories.iter().enumerate() {
            let store = self.store.clone();
            let id = category.id.clone();
            tasks.spawn_blocking(move || (i, store.category_has_stock(&id)));
        }

        let mut slots: Vec<Option<Result<bool>>> = (0..categories.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (i, result) = joined.map_err(join_error)?;
            slots[i] = Some(result);
        }

        let checks = slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| Err(StorefrontError::TransientFetch("stock check did not finish".into())))
            })
            .collect();
        Ok(visibility::retain_stocked(categories, checks))
    }
}
