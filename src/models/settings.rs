use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

// ---------------------------------------------------------------------------
// VisibilityRules
// ---------------------------------------------------------------------------

/// Toggles that suppress products and categories from display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityRules {
    pub hide_out_of_stock: bool,
    pub hide_zero_price: bool,
    pub hide_inactive: bool,
    /// Floor applied to every product regardless of the other toggles.
    pub min_stock_to_show: i64,
    pub hide_empty_categories: bool,
    pub hide_categories_no_stock: bool,
}

// ---------------------------------------------------------------------------
// DisplaySettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub products_per_page: usize,
    pub show_prices: bool,
    pub show_stock: bool,
    pub default_sort: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            products_per_page: crate::config::DEFAULT_PAGE_SIZE,
            show_prices: true,
            show_stock: false,
            default_sort: "name".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// PricingSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingSettings {
    pub max_installments: u32,
    /// Monthly interest rate in percent; `0` means interest-free installments.
    pub installment_interest_rate: f64,
    pub currency_symbol: String,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            max_installments: 12,
            installment_interest_rate: 0.0,
            currency_symbol: "R$".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// ContactSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactSettings {
    pub whatsapp_number: Option<String>,
    pub store_name: Option<String>,
}

// ---------------------------------------------------------------------------
// CatalogSettings
// ---------------------------------------------------------------------------

/// Storefront configuration.
///
/// Only [`VisibilityRules`] drives core behavior. The SEO, theme and analytics
/// maps are carried as opaque passthrough configuration for the presentation
/// layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub visibility: VisibilityRules,
    pub display: DisplaySettings,
    pub pricing: PricingSettings,
    pub contact: ContactSettings,
    pub seo: Map<String, Value>,
    pub theme: Map<String, Value>,
    pub analytics: Map<String, Value>,
}

impl CatalogSettings {
    /// Parse settings from either the nested layout or the legacy flat record.
    ///
    /// The flat layout keeps every option as a top-level key
    /// (`hide_out_of_stock`, `products_per_page`, `seo_title`, ...). Keys
    /// prefixed with `seo_`, `theme_` or `analytics_` land in the matching
    /// passthrough map.
    ///
    /// A `null` field reads as its default in either layout.
    pub fn from_value(value: Value) -> Result<Self> {
        let value = strip_nulls(value);
        let Value::Object(obj) = value else {
            return Ok(serde_json::from_value(value)?);
        };

        let nested = ["visibility", "display", "pricing", "contact"]
            .iter()
            .any(|k| obj.get(*k).map(Value::is_object).unwrap_or(false));
        if nested {
            return Ok(serde_json::from_value(Value::Object(obj))?);
        }

        let flat = Value::Object(obj.clone());
        let mut settings = CatalogSettings {
            visibility: serde_json::from_value(flat.clone())?,
            display: serde_json::from_value(flat.clone())?,
            pricing: serde_json::from_value(flat.clone())?,
            contact: serde_json::from_value(flat)?,
            ..Default::default()
        };

        for (key, val) in obj {
            if key.starts_with("seo_") {
                settings.seo.insert(key, val);
            } else if key.starts_with("theme_") {
                settings.theme.insert(key, val);
            } else if key.starts_with("analytics_") {
                settings.analytics.insert(key, val);
            }
        }

        Ok(settings)
    }
}

/// Drop `null`-valued keys at every object level.
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(obj) => Value::Object(
            obj.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        other => other,
    }
}
