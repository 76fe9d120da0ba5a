//! In-process catalog store backed by DuckDB.

use std::collections::HashMap;
use std::path::Path;

use crate::config;
use crate::connection::Connection;
use crate::error::Result;
use crate::models::{CatalogSettings, CategoryRecord, Product};
use crate::sql_builder::{SqlBuilder, SqlValue};
use crate::store::{page_offset, CatalogFilters, CatalogStore, ProductPage};

/// [`CatalogStore`] over a local DuckDB database.
pub struct DuckDbStore {
    conn: Connection,
}

impl DuckDbStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Connection::open(path)?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert or replace products.
    pub fn upsert_products(&self, products: &[Product]) -> Result<()> {
        let sql = format!(
            "INSERT OR REPLACE INTO {} (id, name, brand, model_id, category_id, specs, \
             price_retail, stock_quantity, status, featured, is_new, has_discount, image_url) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            config::PRODUCTS_TABLE
        );
        let raw = self.conn.raw()?;
        let mut stmt = raw.prepare(&sql)?;
        for p in products {
            let specs = serde_json::to_string(&p.specs)?;
            let price = i64::try_from(p.price_retail).unwrap_or(i64::MAX);
            stmt.execute(::duckdb::params![
                p.id,
                p.name,
                p.brand,
                p.model_id,
                p.category_id,
                specs,
                price,
                p.stock_quantity,
                p.status,
                p.featured,
                p.is_new,
                p.has_discount,
                p.image_url,
            ])?;
        }
        Ok(())
    }

    /// Insert or replace categories.
    pub fn upsert_categories(&self, categories: &[CategoryRecord]) -> Result<()> {
        let sql = format!(
            "INSERT OR REPLACE INTO {} (id, name) VALUES (?, ?)",
            config::CATEGORIES_TABLE
        );
        for c in categories {
            self.conn
                .execute_command(&sql, &[c.id.as_str().into(), c.name.as_str().into()])?;
        }
        Ok(())
    }

    /// Translate filters into a WHERE clause on the products table.
    pub fn product_query(filters: &CatalogFilters) -> SqlBuilder {
        let mut qb = SqlBuilder::new(config::PRODUCTS_TABLE);

        if let Some(term) = filters.search_term() {
            qb.where_contains_any(&["name", "brand"], term);
        }

        if !filters.categories.is_empty() {
            let ids: Vec<&str> = filters.categories.iter().map(String::as_str).collect();
            qb.where_in("category_id", &ids);
        }

        if !filters.brands.is_empty() {
            let brands: Vec<&str> = filters.brands.iter().map(String::as_str).collect();
            qb.where_in("brand", &brands);
        }

        if let Some((min, max)) = filters.price_range {
            qb.where_gte("price_retail", min);
            qb.where_lte("price_retail", max);
        }

        if filters.in_stock_only {
            qb.where_gt("stock_quantity", 0i64);
        }
        if filters.featured_only {
            qb.where_eq("featured", true);
        }
        if filters.new_only {
            qb.where_eq("is_new", true);
        }

        qb.order_by(&["name ASC", "id ASC"]);
        qb
    }
}

impl CatalogStore for DuckDbStore {
    /// Fetches one extra row to learn whether a further page exists.
    fn query_products(
        &self,
        filters: &CatalogFilters,
        page: usize,
        page_size: usize,
    ) -> Result<ProductPage> {
        let mut qb = Self::product_query(filters);
        qb.limit(page_size + 1).offset(page_offset(page, page_size));
        let (sql, params) = qb.build();

        let mut rows: Vec<Product> = self.conn.execute_into(&sql, &params)?;
        let has_more = rows.len() > page_size;
        rows.truncate(page_size);
        Ok(ProductPage { rows, has_more })
    }

    fn query_categories(&self) -> Result<Vec<CategoryRecord>> {
        let (sql, params) = SqlBuilder::new(config::CATEGORIES_TABLE)
            .select(&["id", "name"])
            .order_by(&["name ASC"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    fn count_products_per_category(&self) -> Result<HashMap<String, i64>> {
        let (sql, params) = SqlBuilder::new(config::PRODUCTS_TABLE)
            .select(&["category_id", "COUNT(*) AS cnt"])
            .where_clause("category_id IS NOT NULL", Vec::new())
            .group_by(&["category_id"])
            .build();

        let rows = self.conn.execute(&sql, &params)?;
        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let id = r.get("category_id")?.as_str()?.to_string();
                let cnt = r.get("cnt").and_then(|v| v.as_i64()).unwrap_or(0);
                Some((id, cnt))
            })
            .collect())
    }

    fn get_settings(&self, user_id: Option<&str>) -> Result<Option<CatalogSettings>> {
        let key = user_id.unwrap_or(config::GLOBAL_SETTINGS_KEY);
        let (sql, params) = SqlBuilder::new(config::SETTINGS_TABLE)
            .select(&["settings"])
            .where_eq("user_key", key)
            .limit(1)
            .build();

        match self.conn.execute_scalar(&sql, &params)? {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(text)) => {
                Ok(Some(CatalogSettings::from_value(serde_json::from_str(&text)?)?))
            }
            Some(other) => Ok(Some(CatalogSettings::from_value(other)?)),
        }
    }

    fn save_settings(&self, user_id: Option<&str>, settings: &CatalogSettings) -> Result<()> {
        let key = user_id.unwrap_or(config::GLOBAL_SETTINGS_KEY);
        let body = serde_json::to_string(settings)?;
        self.conn.execute_command(
            &format!(
                "INSERT OR REPLACE INTO {} (user_key, settings) VALUES (?, ?)",
                config::SETTINGS_TABLE
            ),
            &[key.into(), SqlValue::Text(body)],
        )?;
        Ok(())
    }

    fn category_has_stock(&self, category_id: &str) -> Result<bool> {
        let (sql, params) = SqlBuilder::new(config::PRODUCTS_TABLE)
            .select(&["1"])
            .where_eq("category_id", category_id)
            .where_gt("stock_quantity", 0i64)
            .limit(1)
            .build();
        Ok(self.conn.execute_scalar(&sql, &params)?.is_some())
    }

    /// Answers every category with a single grouped query.
    fn categories_with_stock(&self, category_ids: &[&str]) -> Vec<Result<bool>> {
        if category_ids.is_empty() {
            return Vec::new();
        }

        let (sql, params) = SqlBuilder::new(config::PRODUCTS_TABLE)
            .select(&["DISTINCT category_id"])
            .where_in("category_id", category_ids)
            .where_gt("stock_quantity", 0i64)
            .build();

        match self.conn.execute(&sql, &params) {
            Ok(rows) => {
                let stocked: std::collections::HashSet<String> = rows
                    .into_iter()
                    .filter_map(|r| r.get("category_id")?.as_str().map(str::to_string))
                    .collect();
                category_ids
                    .iter()
                    .map(|id| Ok(stocked.contains(*id)))
                    .collect()
            }
            // Fall back to per-category checks so one bad batch does not hide everything.
            Err(e) => {
                tracing::warn!(error = %e, "batched category stock check failed; checking individually");
                category_ids
                    .iter()
                    .map(|id| self.category_has_stock(id))
                    .collect()
            }
        }
    }
}
