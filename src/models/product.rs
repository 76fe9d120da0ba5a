use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// ProductSpecs
// ---------------------------------------------------------------------------

/// Free-form product attributes keyed by attribute name.
///
/// Only `ram`, `storage`, `color` and `color_hex` carry meaning for variant
/// extraction; everything else is passed through untouched. Empty strings
/// are treated the same as a missing attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductSpecs(pub Map<String, Value>);

impl ProductSpecs {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn ram(&self) -> Option<&str> {
        self.get("ram")
    }

    pub fn storage(&self) -> Option<&str> {
        self.get("storage")
    }

    pub fn color(&self) -> Option<&str> {
        self.get("color")
    }

    pub fn color_hex(&self) -> Option<&str> {
        self.get("color_hex")
    }

    /// Set a string attribute, returning `self` for chaining.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), Value::String(value.to_string()));
        self
    }
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A catalog product as returned by the data store.
///
/// `price_retail` is in minor currency units (cents). A product without a
/// `model_id` forms its own model group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brand: String,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub specs: ProductSpecs,
    #[serde(default)]
    pub price_retail: u64,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub has_discount: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_status() -> String {
    "active".to_string()
}

/// Stores may send `null` for columns that have a natural empty value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Product {
    /// Key of the model group this product belongs to.
    pub fn model_key(&self) -> &str {
        self.model_id
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.id)
    }

    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Category row as stored, before product counts are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: String,
    pub name: String,
}

/// Category with the number of products it holds before visibility filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub count: i64,
}
