//! Plain-text quote messages built from cart contents.

use chrono::NaiveDate;

use crate::models::{CatalogSettings, QuoteCartItem};

/// Presentation knobs for a quote message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteStyle {
    pub currency_symbol: String,
    pub store_name: Option<String>,
}

impl Default for QuoteStyle {
    fn default() -> Self {
        Self {
            currency_symbol: "R$".to_string(),
            store_name: None,
        }
    }
}

impl QuoteStyle {
    pub fn from_settings(settings: &CatalogSettings) -> Self {
        Self {
            currency_symbol: settings.pricing.currency_symbol.clone(),
            store_name: settings.contact.store_name.clone(),
        }
    }
}

/// Compose a quote for `items` dated today with the default style.
pub fn compose_multi_item_quote(items: &[QuoteCartItem]) -> String {
    compose_multi_item_quote_on(items, chrono::Local::now().date_naive(), &QuoteStyle::default())
}

/// Compose a quote for `items` with an explicit date and style.
///
/// Returns an empty string for an empty cart. Per item: the product name
/// without any trailing `NNGB/NNNGB` suffix, the chosen RAM/storage, the cash
/// price when `show_cash` is set, the installment plan when
/// `show_installment` is set and there is more than one installment, and
/// the available colors when there are any.
pub fn compose_multi_item_quote_on(items: &[QuoteCartItem], date: NaiveDate, style: &QuoteStyle) -> String {
    if items.is_empty() {
        return String::new();
    }

    let symbol = style.currency_symbol.as_str();
    let mut lines: Vec<String> = Vec::new();

    match &style.store_name {
        Some(name) => lines.push(format!("*Orçamento - {}*", name)),
        None => lines.push("*Orçamento*".to_string()),
    }
    lines.push(format!("Data: {}", date.format("%d/%m/%Y")));

    for (n, item) in items.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("*{}. {}*", n + 1, clean_product_name(&item.product.name)));

        let config: Vec<&str> = [item.ram.as_deref(), item.storage.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if !config.is_empty() {
            lines.push(config.join(" / "));
        }

        if item.show_cash {
            lines.push(format!("À vista: {}", format_currency(item.price, symbol)));
        }

        let plan = &item.installment_plan;
        if item.show_installment && plan.installments > 1 {
            lines.push(format!(
                "Parcelado: {}x de {} (total {})",
                plan.installments,
                format_currency(plan.installment_value, symbol),
                format_currency(plan.total, symbol)
            ));
        }

        if !item.colors.is_empty() {
            lines.push(format!("Cores: {}", item.colors.join(", ")));
        }
    }

    lines.push(String::new());
    lines.push("Gostou? Responda esta mensagem para fechar seu pedido!".to_string());
    lines.join("\n")
}

/// Strip a trailing `"<digits>GB/<digits>GB"` (spaces around `/` allowed).
pub fn clean_product_name(name: &str) -> String {
    let trimmed = name.trim_end();
    let Some(rest) = strip_gb_suffix(trimmed) else {
        return trimmed.to_string();
    };
    let Some(rest) = rest.trim_end().strip_suffix('/') else {
        return trimmed.to_string();
    };
    match strip_gb_suffix(rest.trim_end()) {
        Some(head) => head.trim_end().to_string(),
        None => trimmed.to_string(),
    }
}

/// Remove a trailing `<digits>GB` (case-insensitive), if present.
fn strip_gb_suffix(s: &str) -> Option<&str> {
    let len = s.len();
    if len < 3 || !s.is_char_boundary(len - 2) || !s[len - 2..].eq_ignore_ascii_case("gb") {
        return None;
    }
    let without_unit = &s[..len - 2];
    let head = without_unit.trim_end_matches(|c: char| c.is_ascii_digit());
    if head.len() == without_unit.len() {
        None
    } else {
        Some(head)
    }
}

/// Format cents as `R$ 1.234,56` (dot thousands, comma decimals).
pub fn format_currency(cents: u64, symbol: &str) -> String {
    let units = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, ch) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{} {},{:02}", symbol, grouped, frac)
}
