use std::path::PathBuf;
use std::time::Duration;

/// Durable storage key holding the serialized quote cart.
pub const CART_STORAGE_KEY: &str = "quote_cart";
/// Durable storage key holding the favorited product ids.
pub const FAVORITES_STORAGE_KEY: &str = "favorites";

/// Current version tag written into persisted cart and favorites payloads.
pub const CART_SCHEMA_VERSION: u32 = 1;

/// How long loaded catalog settings stay valid before the next read refetches.
pub const SETTINGS_TTL: Duration = Duration::from_secs(15 * 60);

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Table names used by the DuckDB-backed store.
pub const PRODUCTS_TABLE: &str = "products";
pub const CATEGORIES_TABLE: &str = "categories";
pub const SETTINGS_TABLE: &str = "catalog_settings";

/// Row key used for settings that are not tied to a signed-in user.
pub const GLOBAL_SETTINGS_KEY: &str = "__global__";

pub fn default_storage_dir() -> PathBuf {
    if let Some(data) = dirs::data_local_dir() {
        data.join("catalog-storefront")
    } else {
        PathBuf::from(".catalog-storefront")
    }
}
