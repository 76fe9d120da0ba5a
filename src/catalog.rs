//! Catalog feed: filter state, paging, and visibility-filtered results.
//!
//! Every fetch is described by a [`FetchTicket`]. Changing the search text or
//! filters bumps the feed's generation; completing a ticket from an older
//! generation is reported as [`FetchOutcome::Superseded`] and leaves the
//! feed untouched. Synchronous callers use [`CatalogFeed::refresh`] and
//! [`CatalogFeed::load_more`]; async callers split a fetch into
//! `begin_*` / [`FetchTicket::execute`] / [`CatalogFeed::complete_fetch`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{SettingsCache, SettingsSource};
use crate::error::{Result, StorefrontError};
use crate::favorites::Favorites;
use crate::models::{CatalogSettings, Category, Product};
use crate::store::{CatalogFilters, CatalogStore, ProductPage};
use crate::visibility;

// ---------------------------------------------------------------------------
// FetchTicket / FetchOutcome
// ---------------------------------------------------------------------------

/// Snapshot of everything one store fetch needs.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    page: usize,
    page_size: usize,
    reset: bool,
    filters: CatalogFilters,
    settings: Arc<CatalogSettings>,
}

impl FetchTicket {
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn is_reset(&self) -> bool {
        self.reset
    }

    pub fn filters(&self) -> &CatalogFilters {
        &self.filters
    }

    /// Run the store query this ticket describes.
    pub fn execute<S: CatalogStore + ?Sized>(&self, store: &S) -> Result<ProductPage> {
        store.query_products(&self.filters, self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Results were applied; `received` is the visible row count of this page.
    Applied { received: usize },
    /// A newer filter state started since this fetch began; result ignored.
    Superseded,
    /// Nothing to do (no further pages, or a fetch is already pending).
    Skipped,
}

// ---------------------------------------------------------------------------
// CatalogFeed
// ---------------------------------------------------------------------------

/// Paged, filtered product list for one browsing session.
pub struct CatalogFeed<S: CatalogStore> {
    store: S,
    settings: SettingsCache,
    favorites: Favorites,
    filters: CatalogFilters,
    page_size: usize,
    products: Vec<Product>,
    page: usize,
    has_more: bool,
    loading: bool,
    error: Option<String>,
    generation: u64,
}

impl<S: CatalogStore> CatalogFeed<S> {
    /// Create an empty feed. Nothing is fetched until [`refresh`](Self::refresh).
    pub fn new(store: S, settings: SettingsCache, favorites: Favorites, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(StorefrontError::InvalidArgument(
                "page_size must be greater than zero".into(),
            ));
        }
        Ok(Self {
            store,
            settings,
            favorites,
            filters: CatalogFilters::default(),
            page_size,
            products: Vec::new(),
            page: 0,
            has_more: false,
            loading: false,
            error: None,
            generation: 0,
        })
    }

    // -- Read access -------------------------------------------------------

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed fetch, cleared by the next successful one.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn filters(&self) -> &CatalogFilters {
        &self.filters
    }

    pub fn search_query(&self) -> &str {
        self.filters.search.as_deref().unwrap_or("")
    }

    /// Last page applied; `0` before the first successful fetch.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings_cache(&self) -> &SettingsCache {
        &self.settings
    }

    // -- Filter state ------------------------------------------------------

    /// Replace the search text. Any in-flight fetch becomes stale.
    pub fn set_search_query(&mut self, query: &str) {
        self.filters.search = Some(query.to_string()).filter(|q| !q.is_empty());
        self.supersede();
    }

    /// Replace the filters, keeping the current search text.
    pub fn set_filters(&mut self, filters: CatalogFilters) {
        let search = self.filters.search.take();
        self.filters = CatalogFilters { search, ..filters };
        self.supersede();
    }

    /// Held products stay visible until the next refresh, but paging
    /// restarts: the old page counter belongs to the old filters.
    fn supersede(&mut self) {
        self.generation += 1;
        self.loading = false;
        self.page = 0;
        self.has_more = false;
    }

    // -- Settings ----------------------------------------------------------

    /// Settings from the cache or store; defaults if the store fails.
    pub fn load_settings(&self) -> (Arc<CatalogSettings>, SettingsSource) {
        self.settings.get_or_load(&self.store)
    }

    pub fn save_settings(&self, settings: &CatalogSettings) -> Result<()> {
        self.settings.save(&self.store, settings)
    }

    // -- Fetching ----------------------------------------------------------

    /// Fetch page 1 for the current filters and replace the held list.
    pub fn refresh(&mut self) -> Result<FetchOutcome> {
        let (settings, _) = self.load_settings();
        let ticket = self.begin_refresh(settings);
        let result = ticket.execute(&self.store);
        self.complete_fetch(ticket, result)
    }

    /// Fetch the next page and append it to the held list.
    pub fn load_more(&mut self) -> Result<FetchOutcome> {
        if !self.can_load_more() {
            return Ok(FetchOutcome::Skipped);
        }
        let (settings, _) = self.load_settings();
        match self.begin_load_more(settings) {
            Some(ticket) => {
                let result = ticket.execute(&self.store);
                self.complete_fetch(ticket, result)
            }
            None => Ok(FetchOutcome::Skipped),
        }
    }

    fn can_load_more(&self) -> bool {
        self.has_more && !self.loading && self.page > 0
    }

    /// Start a reset fetch. Supersedes anything already in flight.
    pub fn begin_refresh(&mut self, settings: Arc<CatalogSettings>) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        self.ticket(1, true, settings)
    }

    /// Start a next-page fetch, or `None` if there is nothing more to load
    /// or another fetch is pending.
    pub fn begin_load_more(&mut self, settings: Arc<CatalogSettings>) -> Option<FetchTicket> {
        if !self.can_load_more() {
            return None;
        }
        self.loading = true;
        Some(self.ticket(self.page + 1, false, settings))
    }

    fn ticket(&self, page: usize, reset: bool, settings: Arc<CatalogSettings>) -> FetchTicket {
        FetchTicket {
            generation: self.generation,
            page,
            page_size: self.page_size,
            reset,
            filters: self.filters.clone(),
            settings,
        }
    }

    /// Apply a fetch result if its ticket is still current.
    ///
    /// Store errors are recorded in [`error`](Self::error) and returned;
    /// products already held are kept.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<ProductPage>,
    ) -> Result<FetchOutcome> {
        if ticket.generation != self.generation {
            debug!(
                page = ticket.page,
                stale = ticket.generation,
                current = self.generation,
                "discarding superseded catalog fetch"
            );
            return Ok(FetchOutcome::Superseded);
        }
        self.loading = false;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        let visible = visibility::apply_visibility_rules(page.rows, &ticket.settings);
        let received = visible.len();
        if ticket.reset {
            self.products = visible;
        } else {
            self.products.extend(visible);
        }
        self.page = ticket.page;
        self.has_more = page.has_more;
        self.error = None;
        Ok(FetchOutcome::Applied { received })
    }

    // -- Categories --------------------------------------------------------

    /// All categories with product counts, after category visibility rules.
    pub fn categories_with_counts(&self) -> Result<Vec<Category>> {
        let records = self.store.query_categories()?;
        let counts: HashMap<String, i64> = self.store.count_products_per_category()?;
        let categories: Vec<Category> = records
            .into_iter()
            .map(|r| Category {
                count: counts.get(&r.id).copied().unwrap_or(0),
                id: r.id,
                name: r.name,
            })
            .collect();

        let (settings, _) = self.load_settings();
        Ok(visibility::apply_category_visibility_rules(
            categories,
            &settings,
            &self.store,
        ))
    }

    // -- Favorites ---------------------------------------------------------

    pub fn favorites(&self) -> &[String] {
        self.favorites.ids()
    }

    pub fn is_favorite(&self, product_id: &str) -> bool {
        self.favorites.contains(product_id)
    }

    /// Returns whether the product is a favorite after toggling.
    pub fn toggle_favorite(&mut self, product_id: &str) -> bool {
        self.favorites.toggle(product_id)
    }
}
