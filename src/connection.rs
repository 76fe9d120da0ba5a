//! DuckDB connection wrapper with schema bootstrap and query execution.
//!
//! Rows come back as `HashMap<String, serde_json::Value>` so they can be
//! deserialized straight into the model types. Columns holding JSON text
//! (such as `specs`) are decoded into JSON values on the way out.

use crate::config;
use crate::error::{Result, StorefrontError};
use crate::sql_builder::SqlValue;
use duckdb::{types::ValueRef, Connection as DuckDbConnection};
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Columns stored as JSON text that are decoded into structured values.
fn json_columns() -> HashSet<&'static str> {
    HashSet::from(["specs", "settings"])
}

/// Column list used when importing products from NDJSON.
const PRODUCT_COLUMNS: &str = "{\
    'id': 'VARCHAR', 'name': 'VARCHAR', 'brand': 'VARCHAR', \
    'model_id': 'VARCHAR', 'category_id': 'VARCHAR', 'specs': 'JSON', \
    'price_retail': 'BIGINT', 'stock_quantity': 'BIGINT', 'status': 'VARCHAR', \
    'featured': 'BOOLEAN', 'is_new': 'BOOLEAN', 'has_discount': 'BOOLEAN', \
    'image_url': 'VARCHAR'}";

/// Wraps a DuckDB connection holding the catalog tables.
///
/// The connection sits behind a mutex so one `Connection` can be shared by
/// reference across threads.
pub struct Connection {
    conn: Mutex<DuckDbConnection>,
}

impl Connection {
    /// Open an in-memory database with the catalog schema created.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_raw(DuckDbConnection::open_in_memory()?)
    }

    /// Open (or create) a database file with the catalog schema created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_raw(DuckDbConnection::open(path)?)
    }

    fn from_raw(conn: DuckDbConnection) -> Result<Self> {
        let this = Self {
            conn: Mutex::new(conn),
        };
        this.init_schema()?;
        Ok(this)
    }

    fn lock(&self) -> Result<MutexGuard<'_, DuckDbConnection>> {
        self.conn
            .lock()
            .map_err(|_| StorefrontError::InvalidArgument("DuckDB connection lock poisoned".into()))
    }

    /// Create the catalog tables if they do not exist yet.
    pub fn init_schema(&self) -> Result<()> {
        self.lock()?.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {products} (
                id VARCHAR PRIMARY KEY,
                name VARCHAR NOT NULL,
                brand VARCHAR NOT NULL DEFAULT '',
                model_id VARCHAR,
                category_id VARCHAR,
                specs JSON,
                price_retail BIGINT NOT NULL DEFAULT 0 CHECK (price_retail >= 0),
                stock_quantity BIGINT NOT NULL DEFAULT 0,
                status VARCHAR NOT NULL DEFAULT 'active',
                featured BOOLEAN NOT NULL DEFAULT FALSE,
                is_new BOOLEAN NOT NULL DEFAULT FALSE,
                has_discount BOOLEAN NOT NULL DEFAULT FALSE,
                image_url VARCHAR
            );
            CREATE TABLE IF NOT EXISTS {categories} (
                id VARCHAR PRIMARY KEY,
                name VARCHAR NOT NULL
            );
            CREATE TABLE IF NOT EXISTS {settings} (
                user_key VARCHAR PRIMARY KEY,
                settings JSON NOT NULL
            );",
            products = config::PRODUCTS_TABLE,
            categories = config::CATEGORIES_TABLE,
            settings = config::SETTINGS_TABLE,
        ))?;
        Ok(())
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    pub fn execute(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();

        let mut rows_result = stmt.query(param_values.as_slice())?;

        // Column metadata is only available after the statement has run.
        let stmt_ref = rows_result
            .as_ref()
            .ok_or_else(|| StorefrontError::InvalidArgument("statement produced no result set".into()))?;
        let column_names: Vec<String> = stmt_ref
            .column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        let json_cols = json_columns();
        let mut out: Vec<HashMap<String, serde_json::Value>> = Vec::new();

        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::with_capacity(column_names.len());
            for (i, col_name) in column_names.iter().enumerate() {
                let mut value = convert_value_ref(row.get_ref(i)?);
                if json_cols.contains(col_name.as_str()) {
                    value = decode_json_text(value);
                }
                map.insert(col_name.clone(), value);
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(row.into_iter().collect());
            results.push(serde_json::from_value(value)?);
        }
        Ok(results)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(&self, sql: &str, params: &[SqlValue]) -> Result<Option<serde_json::Value>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        if let Some(row) = rows.next()? {
            Ok(Some(convert_value_ref(row.get_ref(0)?)))
        } else {
            Ok(None)
        }
    }

    /// Execute a statement that returns no rows; yields the affected row count.
    pub fn execute_command(&self, sql: &str, params: &[SqlValue]) -> Result<usize> {
        let conn = self.lock()?;
        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();
        Ok(conn.execute(sql, param_values.as_slice())?)
    }

    /// Append products from a newline-delimited JSON file.
    ///
    /// `specs` objects are stored as JSON text. Data is streamed from disk by
    /// DuckDB rather than parsed in Rust first.
    pub fn import_products_ndjson(&self, ndjson_path: &str) -> Result<usize> {
        let path_fwd = ndjson_path.replace('\\', "/").replace('\'', "''");
        let conn = self.lock()?;
        let n = conn.execute(
            &format!(
                "INSERT INTO {} BY NAME SELECT * FROM read_json('{}', format='newline_delimited', columns={})",
                config::PRODUCTS_TABLE,
                path_fwd,
                PRODUCT_COLUMNS
            ),
            [],
        )?;
        tracing::debug!(rows = n, path = %path_fwd, "imported products");
        Ok(n)
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> Result<MutexGuard<'_, DuckDbConnection>> {
        self.lock()
    }
}

/// Parse a JSON-text column into a structured value; leave anything else as is.
fn decode_json_text(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => serde_json::from_str(&s).unwrap_or(serde_json::Value::String(s)),
        other => other,
    }
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UTinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::USmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UBigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => {
            // COUNT(*) and SUM(...) come back as HUGEINT
            if let Ok(i) = i64::try_from(n) {
                serde_json::Value::Number(i.into())
            } else {
                serde_json::Value::String(n.to_string())
            }
        }
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).to_string()),
        _ => serde_json::Value::Null,
    }
}
