//! Quote cart: an ordered, locally persisted list of configured items.
//!
//! The cart starts `Uninitialized`, reads the saved cart while `Hydrating`,
//! and only becomes `Ready` afterwards. Nothing is written to storage before
//! `Ready`, so an empty in-memory cart can never overwrite a saved one.
//! Persistence is best-effort: storage failures are logged and swallowed,
//! in-memory state is always updated.

use rand::Rng;
use tracing::{debug, warn};

use crate::config;
use crate::models::{CartItemPatch, NewCartItem, QuoteCartItem};
use crate::storage::{decode_versioned, encode_versioned, Storage};

/// Lifecycle of a [`QuoteCart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartPhase {
    Uninitialized,
    Hydrating,
    Ready,
}

/// Session-owned quote cart with write-through persistence.
pub struct QuoteCart {
    storage: Box<dyn Storage>,
    items: Vec<QuoteCartItem>,
    phase: CartPhase,
}

impl QuoteCart {
    /// Create an empty cart that has not read storage yet.
    ///
    /// Call [`hydrate`](Self::hydrate) before relying on persistence, or use
    /// [`open`](Self::open).
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            items: Vec::new(),
            phase: CartPhase::Uninitialized,
        }
    }

    /// Create a cart and hydrate it from storage.
    pub fn open(storage: impl Storage + 'static) -> Self {
        let mut cart = Self::new(storage);
        cart.hydrate();
        cart
    }

    /// Load the saved cart and move to `Ready`.
    ///
    /// Unreadable or corrupt storage yields an empty cart. Items added before
    /// hydration are kept after the saved ones and the merged cart is
    /// written back once. Calling this on a `Ready` cart does nothing.
    pub fn hydrate(&mut self) {
        if self.phase == CartPhase::Ready {
            return;
        }
        self.phase = CartPhase::Hydrating;
        let pending = std::mem::take(&mut self.items);

        self.items = match self.storage.read(config::CART_STORAGE_KEY) {
            Ok(Some(raw)) => decode_items(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read saved quote cart; starting empty");
                Vec::new()
            }
        };
        debug!(restored = self.items.len(), pending = pending.len(), "quote cart hydrated");

        let had_pending = !pending.is_empty();
        for mut item in pending {
            if self.contains(&item.id) {
                item.id = self.fresh_id();
            }
            self.items.push(item);
        }

        self.phase = CartPhase::Ready;
        if had_pending {
            self.persist();
        }
    }

    pub fn phase(&self) -> CartPhase {
        self.phase
    }

    /// Current items in insertion order.
    pub fn items(&self) -> &[QuoteCartItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&QuoteCartItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of the effective prices of every item, in cents.
    pub fn total(&self) -> u64 {
        self.items.iter().map(|i| i.price).sum()
    }

    /// Append an item and return its newly assigned id.
    pub fn add_item(&mut self, item: NewCartItem) -> String {
        let id = self.fresh_id();
        self.items.push(item.into_item(id.clone()));
        self.persist();
        id
    }

    /// Remove the item with `id`; unknown ids are ignored.
    pub fn remove_item(&mut self, id: &str) {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        if self.items.len() == before {
            debug!(id, "remove_item: no such cart item");
        }
        self.persist();
    }

    /// Merge `patch` into the item with `id`; unknown ids are ignored.
    pub fn update_item(&mut self, id: &str, patch: CartItemPatch) {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => patch.apply(item),
            None => debug!(id, "update_item: no such cart item"),
        }
        self.persist();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|i| i.id == id)
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = generate_item_id();
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Write the whole cart. Skipped until hydration has finished.
    fn persist(&self) {
        if self.phase != CartPhase::Ready {
            debug!(phase = ?self.phase, "quote cart not hydrated; skipping persist");
            return;
        }
        let result = encode_versioned("items", &self.items)
            .and_then(|body| self.storage.write(config::CART_STORAGE_KEY, &body));
        if let Err(e) = result {
            warn!(error = %e, items = self.items.len(), "failed to persist quote cart");
        }
    }
}

/// `<unix millis>-<9 base36 chars>`, e.g. `1700000000000-abc123def`.
pub fn generate_item_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", chrono::Utc::now().timestamp_millis(), suffix)
}

/// Decode a stored cart, dropping entries that no longer parse and
/// duplicate ids (first occurrence wins).
fn decode_items(raw: &str) -> Vec<QuoteCartItem> {
    let entries = match decode_versioned(raw, "items") {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "saved quote cart is unreadable; starting empty");
            return Vec::new();
        }
    };

    let mut items: Vec<QuoteCartItem> = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<QuoteCartItem>(entry) {
            Ok(item) if items.iter().any(|i| i.id == item.id) => {
                warn!(id = %item.id, "dropping duplicate saved cart item");
            }
            Ok(item) => items.push(item),
            Err(e) => warn!(error = %e, "dropping unreadable saved cart item"),
        }
    }
    items
}
