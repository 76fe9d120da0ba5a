//! Favorited product ids, persisted alongside the quote cart.

use tracing::warn;

use crate::config;
use crate::storage::{decode_versioned, encode_versioned, Storage};

pub struct Favorites {
    storage: Box<dyn Storage>,
    ids: Vec<String>,
}

impl Favorites {
    /// Load favorites from storage; unreadable data yields an empty list.
    pub fn open(storage: impl Storage + 'static) -> Self {
        let ids = match storage.read(config::FAVORITES_STORAGE_KEY) {
            Ok(Some(raw)) => decode_ids(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read favorites; starting empty");
                Vec::new()
            }
        };
        Self {
            storage: Box::new(storage),
            ids,
        }
    }

    /// Product ids in the order they were favorited.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.ids.iter().any(|id| id == product_id)
    }

    /// Add or remove `product_id`; returns whether it is now a favorite.
    pub fn toggle(&mut self, product_id: &str) -> bool {
        let now_favorite = if self.contains(product_id) {
            self.ids.retain(|id| id != product_id);
            false
        } else {
            self.ids.push(product_id.to_string());
            true
        };
        self.persist();
        now_favorite
    }

    fn persist(&self) {
        let result = encode_versioned("ids", &self.ids)
            .and_then(|body| self.storage.write(config::FAVORITES_STORAGE_KEY, &body));
        if let Err(e) = result {
            warn!(error = %e, "failed to persist favorites");
        }
    }
}

fn decode_ids(raw: &str) -> Vec<String> {
    match decode_versioned(raw, "ids") {
        Ok(entries) => {
            let mut ids: Vec<String> = Vec::with_capacity(entries.len());
            for id in entries.into_iter().filter_map(|v| v.as_str().map(str::to_string)) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            ids
        }
        Err(e) => {
            warn!(error = %e, "saved favorites are unreadable; starting empty");
            Vec::new()
        }
    }
}
