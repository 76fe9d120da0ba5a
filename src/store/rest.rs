//! Hosted catalog store reached over a PostgREST-style HTTP API.
//!
//! Tables are exposed as `{endpoint}/{table}`; filters travel as query
//! parameters (`price_retail=gte.1000`) and row totals come back in the
//! `Content-Range` header when `Prefer: count=exact` is sent.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::Deserialize;

use crate::config;
use crate::error::{Result, StorefrontError};
use crate::models::{CatalogSettings, CategoryRecord, Product};
use crate::store::{page_offset, CatalogFilters, CatalogStore, ProductPage};

/// [`CatalogStore`] over a PostgREST endpoint such as `https://<project>/rest/v1`.
pub struct RestStore {
    endpoint: Url,
    api_key: String,
    client: Client,
}

impl RestStore {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let mut endpoint = Url::parse(endpoint)
            .map_err(|e| StorefrontError::InvalidArgument(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            endpoint,
            api_key: api_key.to_string(),
            client,
        })
    }

    fn table_url(&self, table: &str, pairs: &[(String, String)]) -> Result<Url> {
        let mut url = self
            .endpoint
            .join(table)
            .map_err(|e| StorefrontError::InvalidArgument(format!("Invalid table '{}': {}", table, e)))?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
    }

    fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = self.authorized(req).send().map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                StorefrontError::TransientFetch(e.to_string())
            } else {
                StorefrontError::Http(e)
            }
        })?;
        if resp.status().is_server_error() {
            return Err(StorefrontError::TransientFetch(format!(
                "{} returned {}",
                resp.url(),
                resp.status()
            )));
        }
        Ok(resp.error_for_status()?)
    }

    fn get_rows<T: for<'de> Deserialize<'de>>(&self, table: &str, pairs: &[(String, String)]) -> Result<Vec<T>> {
        let url = self.table_url(table, pairs)?;
        Ok(self.send(self.client.get(url))?.json()?)
    }
}

impl CatalogStore for RestStore {
    fn query_products(
        &self,
        filters: &CatalogFilters,
        page: usize,
        page_size: usize,
    ) -> Result<ProductPage> {
        let pairs = product_query_pairs(filters, page, page_size);
        let url = self.table_url(config::PRODUCTS_TABLE, &pairs)?;
        let resp = self.send(self.client.get(url).header("Prefer", "count=exact"))?;

        let range = resp
            .headers()
            .get("Content-Range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);
        let rows: Vec<Product> = resp.json()?;

        let has_more = match range {
            Some(r) => r.has_more(page_size),
            // No count available: a full page means there may be more.
            None => rows.len() == page_size,
        };
        Ok(ProductPage { rows, has_more })
    }

    fn query_categories(&self) -> Result<Vec<CategoryRecord>> {
        self.get_rows(
            config::CATEGORIES_TABLE,
            &[pair("select", "id,name"), pair("order", "name.asc")],
        )
    }

    fn count_products_per_category(&self) -> Result<HashMap<String, i64>> {
        #[derive(Deserialize)]
        struct Row {
            category_id: Option<String>,
        }

        let rows: Vec<Row> = self.get_rows(
            config::PRODUCTS_TABLE,
            &[pair("select", "category_id"), pair("category_id", "not.is.null")],
        )?;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for id in rows.into_iter().filter_map(|r| r.category_id) {
            *counts.entry(id).or_default() += 1;
        }
        Ok(counts)
    }

    fn get_settings(&self, user_id: Option<&str>) -> Result<Option<CatalogSettings>> {
        #[derive(Deserialize)]
        struct Row {
            settings: serde_json::Value,
        }

        let key = user_id.unwrap_or(config::GLOBAL_SETTINGS_KEY);
        let rows: Vec<Row> = self.get_rows(
            config::SETTINGS_TABLE,
            &[
                pair("select", "settings"),
                pair("user_key", &format!("eq.{}", key)),
                pair("limit", "1"),
            ],
        )?;
        rows.into_iter()
            .next()
            .map(|r| CatalogSettings::from_value(r.settings))
            .transpose()
    }

    fn save_settings(&self, user_id: Option<&str>, settings: &CatalogSettings) -> Result<()> {
        let key = user_id.unwrap_or(config::GLOBAL_SETTINGS_KEY);
        let url = self.table_url(config::SETTINGS_TABLE, &[])?;
        let body = serde_json::json!({ "user_key": key, "settings": settings });
        self.send(
            self.client
                .post(url)
                .header("Prefer", "resolution=merge-duplicates")
                .json(&body),
        )?;
        Ok(())
    }

    fn category_has_stock(&self, category_id: &str) -> Result<bool> {
        let rows: Vec<serde_json::Value> = self.get_rows(
            config::PRODUCTS_TABLE,
            &[
                pair("select", "id"),
                pair("category_id", &format!("eq.{}", category_id)),
                pair("stock_quantity", "gt.0"),
                pair("limit", "1"),
            ],
        )?;
        Ok(!rows.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Query encoding
// ---------------------------------------------------------------------------

fn pair(k: &str, v: &str) -> (String, String) {
    (k.to_string(), v.to_string())
}

/// Quote a value for use inside a PostgREST list or logic expression.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Query parameters for one page of products.
pub fn product_query_pairs(filters: &CatalogFilters, page: usize, page_size: usize) -> Vec<(String, String)> {
    let mut pairs = vec![pair("select", "*")];

    if let Some(term) = filters.search_term() {
        let pattern = quote(&format!("*{}*", term));
        pairs.push(pair(
            "or",
            &format!("(name.ilike.{p},brand.ilike.{p})", p = pattern),
        ));
    }

    if !filters.categories.is_empty() {
        let list: Vec<String> = filters.categories.iter().map(|c| quote(c)).collect();
        pairs.push(pair("category_id", &format!("in.({})", list.join(","))));
    }

    if !filters.brands.is_empty() {
        let list: Vec<String> = filters.brands.iter().map(|b| quote(b)).collect();
        pairs.push(pair("brand", &format!("in.({})", list.join(","))));
    }

    if let Some((min, max)) = filters.price_range {
        pairs.push(pair("price_retail", &format!("gte.{}", min)));
        pairs.push(pair("price_retail", &format!("lte.{}", max)));
    }

    if filters.in_stock_only {
        pairs.push(pair("stock_quantity", "gt.0"));
    }
    if filters.featured_only {
        pairs.push(pair("featured", "is.true"));
    }
    if filters.new_only {
        pairs.push(pair("is_new", "is.true"));
    }

    pairs.push(pair("order", "name.asc,id.asc"));
    pairs.push(pair("offset", &page_offset(page, page_size).to_string()));
    pairs.push(pair("limit", &page_size.to_string()));
    pairs
}

/// Parsed `Content-Range: <start>-<end>/<total>` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// `None` when the page was empty (`*/<total>`).
    pub span: Option<(u64, u64)>,
    /// `None` when the server did not count (`.../*`).
    pub total: Option<u64>,
}

impl ContentRange {
    /// Whether rows exist beyond the end of this range.
    ///
    /// Without a total, a span covering a full page means there may be more.
    pub fn has_more(&self, page_size: usize) -> bool {
        match (self.span, self.total) {
            (Some((_, end)), Some(total)) => end.saturating_add(1) < total,
            (Some((start, end)), None) => {
                end.saturating_sub(start).saturating_add(1) >= page_size as u64
            }
            (None, _) => false,
        }
    }
}

pub fn parse_content_range(header: &str) -> Option<ContentRange> {
    let (span, total) = header.trim().split_once('/')?;
    let total = match total {
        "*" => None,
        t => Some(t.parse().ok()?),
    };
    let span = match span {
        "*" => None,
        s => {
            let (start, end) = s.split_once('-')?;
            Some((start.parse().ok()?, end.parse().ok()?))
        }
    };
    Some(ContentRange { span, total })
}
