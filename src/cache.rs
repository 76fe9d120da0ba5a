//! Session cache for catalog settings.
//!
//! Settings are read-mostly: they are fetched once, served from memory for
//! a fixed TTL (15 minutes by default), and dropped on explicit save so the
//! next read sees what was written.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tracing::{debug, warn};

use crate::config;
use crate::error::Result;
use crate::models::CatalogSettings;
use crate::store::CatalogStore;

/// Where a settings value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSource {
    Cache,
    Store,
    /// The store had no record for this user.
    Defaults,
    /// The store could not be read; defaults stand in and nothing is cached.
    Fallback,
}

/// TTL-bounded settings cache keyed by user. Clones share entries.
#[derive(Clone)]
pub struct SettingsCache {
    cache: Cache<String, Arc<CatalogSettings>>,
    user_id: Option<String>,
}

impl SettingsCache {
    pub fn new(ttl: Duration, user_id: Option<String>) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(ttl)
            .build();
        Self { cache, user_id }
    }

    fn key(&self) -> String {
        self.user_id
            .clone()
            .unwrap_or_else(|| config::GLOBAL_SETTINGS_KEY.to_string())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Cached settings, if present and not expired.
    pub fn cached(&self) -> Option<Arc<CatalogSettings>> {
        self.cache.get(&self.key())
    }

    /// Return cached settings or load them from the store.
    ///
    /// Never fails: a store error yields defaults tagged
    /// [`SettingsSource::Fallback`] so the catalog can still render.
    pub fn get_or_load<S: CatalogStore + ?Sized>(
        &self,
        store: &S,
    ) -> (Arc<CatalogSettings>, SettingsSource) {
        let key = self.key();
        if let Some(hit) = self.cache.get(&key) {
            return (hit, SettingsSource::Cache);
        }

        match store.get_settings(self.user_id.as_deref()) {
            Ok(Some(settings)) => {
                let settings = Arc::new(settings);
                self.cache.insert(key, settings.clone());
                (settings, SettingsSource::Store)
            }
            Ok(None) => {
                debug!(user = %key, "no stored settings; using defaults");
                let settings = Arc::new(CatalogSettings::default());
                self.cache.insert(key, settings.clone());
                (settings, SettingsSource::Defaults)
            }
            Err(e) => {
                warn!(user = %key, error = %e, "failed to load catalog settings; using defaults");
                (Arc::new(CatalogSettings::default()), SettingsSource::Fallback)
            }
        }
    }

    /// Persist settings and invalidate the cached copy.
    pub fn save<S: CatalogStore + ?Sized>(&self, store: &S, settings: &CatalogSettings) -> Result<()> {
        store.save_settings(self.user_id.as_deref(), settings)?;
        self.invalidate();
        Ok(())
    }

    pub fn invalidate(&self) {
        self.cache.invalidate(&self.key());
    }
}
