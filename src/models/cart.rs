use serde::{Deserialize, Serialize};

use super::product::Product;

// ---------------------------------------------------------------------------
// InstallmentPlan
// ---------------------------------------------------------------------------

/// Installment breakdown captured when an item enters the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    pub installments: u32,
    /// Value of each installment in cents.
    pub installment_value: u64,
    /// Total paid over all installments in cents.
    pub total: u64,
}

impl InstallmentPlan {
    /// A single payment of `price`.
    pub fn single(price: u64) -> Self {
        Self {
            installments: 1,
            installment_value: price,
            total: price,
        }
    }

    /// Build a plan for `price` split into `installments` payments.
    ///
    /// With a zero rate the total equals the price and each installment is
    /// the price divided evenly, rounded to the nearest cent. With a positive
    /// monthly rate (percent) the installment follows the fixed-payment
    /// amortization formula and the total is `installment_value * installments`.
    pub fn compute(price: u64, installments: u32, monthly_rate_percent: f64) -> Self {
        let n = installments.max(1);
        if n == 1 {
            return Self::single(price);
        }

        if monthly_rate_percent <= 0.0 || !monthly_rate_percent.is_finite() {
            let n64 = u64::from(n);
            return Self {
                installments: n,
                installment_value: price.saturating_add(n64 / 2) / n64,
                total: price,
            };
        }

        let i = monthly_rate_percent / 100.0;
        let factor = i / (1.0 - (1.0 + i).powi(-(n as i32)));
        let value = (price as f64 * factor).round() as u64;
        Self {
            installments: n,
            installment_value: value,
            total: value.saturating_mul(u64::from(n)),
        }
    }
}

// ---------------------------------------------------------------------------
// QuoteCartItem
// ---------------------------------------------------------------------------

/// A line in the quote cart.
///
/// `product` is a snapshot taken at add time; later catalog changes never
/// alter a pending quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteCartItem {
    pub id: String,
    pub product: Product,
    #[serde(default)]
    pub ram: Option<String>,
    #[serde(default)]
    pub storage: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    /// Effective quoted price in cents (may differ from `product.price_retail`).
    pub price: u64,
    pub installment_plan: InstallmentPlan,
    #[serde(default = "default_true")]
    pub show_cash: bool,
    #[serde(default = "default_true")]
    pub show_installment: bool,
}

fn default_true() -> bool {
    true
}

/// Everything needed to add a cart line; the cart assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub product: Product,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub colors: Vec<String>,
    pub price: u64,
    pub installment_plan: InstallmentPlan,
    pub show_cash: bool,
    pub show_installment: bool,
}

impl NewCartItem {
    /// Start an item from a product at its list price, single payment,
    /// taking ram/storage from the product specs.
    pub fn from_product(product: Product) -> Self {
        let price = product.price_retail;
        Self {
            ram: product.specs.ram().map(str::to_string),
            storage: product.specs.storage().map(str::to_string),
            colors: product.specs.color().map(|c| vec![c.to_string()]).unwrap_or_default(),
            price,
            installment_plan: InstallmentPlan::single(price),
            show_cash: true,
            show_installment: true,
            product,
        }
    }

    pub fn into_item(self, id: String) -> QuoteCartItem {
        QuoteCartItem {
            id,
            product: self.product,
            ram: self.ram,
            storage: self.storage,
            colors: self.colors,
            price: self.price,
            installment_plan: self.installment_plan,
            show_cash: self.show_cash,
            show_installment: self.show_installment,
        }
    }
}

/// Partial update for a cart line. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartItemPatch {
    pub ram: Option<Option<String>>,
    pub storage: Option<Option<String>>,
    pub colors: Option<Vec<String>>,
    pub price: Option<u64>,
    pub installment_plan: Option<InstallmentPlan>,
    pub show_cash: Option<bool>,
    pub show_installment: Option<bool>,
}

impl CartItemPatch {
    pub fn apply(self, item: &mut QuoteCartItem) {
        if let Some(ram) = self.ram {
            item.ram = ram;
        }
        if let Some(storage) = self.storage {
            item.storage = storage;
        }
        if let Some(colors) = self.colors {
            item.colors = colors;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(plan) = self.installment_plan {
            item.installment_plan = plan;
        }
        if let Some(show_cash) = self.show_cash {
            item.show_cash = show_cash;
        }
        if let Some(show_installment) = self.show_installment {
            item.show_installment = show_installment;
        }
    }
}
