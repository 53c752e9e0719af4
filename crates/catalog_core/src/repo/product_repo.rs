//! Product repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the store operations the catalog needs over `products`.
//! - Keep SQL details inside core persistence boundary.
//!
//! # Invariants
//! - Write paths validate their input before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Listings are ordered by `id ASC` so pagination is reproducible.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::product::{
    NewProduct, Product, ProductId, ProductPatch, ProductValidationError,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const PRODUCT_SELECT_SQL: &str = "SELECT
    id,
    name,
    price,
    available,
    created_at,
    updated_at
FROM products";

const REQUIRED_COLUMNS: [&str; 6] = [
    "id",
    "name",
    "price",
    "available",
    "created_at",
    "updated_at",
];

// Stays well below SQLITE_MAX_VARIABLE_NUMBER on every supported build.
const ID_LOOKUP_CHUNK: usize = 500;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for product persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ProductValidationError),
    Db(DbError),
    NotFound(ProductId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "product not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "product repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "product repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "product repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted product data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ProductValidationError> for RepoError {
    fn from(value: ProductValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductListQuery {
    /// Include products with `available = false`.
    pub include_retired: bool,
    pub limit: Option<u32>,
    pub offset: u64,
}

/// Store interface the catalog is built on.
pub trait ProductRepository {
    /// Inserts a live product and returns the persisted row.
    fn create_product(&self, input: &NewProduct) -> RepoResult<Product>;
    /// Gets one product, optionally including retired rows.
    fn get_product(&self, id: ProductId, include_retired: bool) -> RepoResult<Option<Product>>;
    /// Lists products ordered by id.
    fn list_products(&self, query: &ProductListQuery) -> RepoResult<Vec<Product>>;
    /// Counts products, optionally including retired rows.
    fn count_products(&self, include_retired: bool) -> RepoResult<u64>;
    /// Applies a partial update regardless of availability.
    fn update_product(&self, id: ProductId, patch: &ProductPatch) -> RepoResult<Product>;
    /// Flips the availability flag, leaving every other field untouched.
    fn set_available(&self, id: ProductId, available: bool) -> RepoResult<Product>;
    /// Returns every stored product whose id is in `ids`, retired or not.
    fn find_products_by_ids(&self, ids: &[ProductId]) -> RepoResult<Vec<Product>>;
}

/// SQLite-backed product repository.
pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_product_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn read_back(&self, id: ProductId) -> RepoResult<Product> {
        self.get_product(id, true)?.ok_or(RepoError::NotFound(id))
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn create_product(&self, input: &NewProduct) -> RepoResult<Product> {
        input.validate()?;

        self.conn.execute(
            "INSERT INTO products (name, price, available) VALUES (?1, ?2, 1);",
            params![input.name.as_str(), price_to_db(input.price)],
        )?;
        let id = self.conn.last_insert_rowid();

        self.get_product(id, true)?.ok_or_else(|| {
            RepoError::InvalidData(format!("created product {id} not found in read-back"))
        })
    }

    fn get_product(&self, id: ProductId, include_retired: bool) -> RepoResult<Option<Product>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{PRODUCT_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR available = 1);"
        ))?;

        let mut rows = stmt.query(params![id, bool_to_int(include_retired)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_product_row(row)?));
        }

        Ok(None)
    }

    fn list_products(&self, query: &ProductListQuery) -> RepoResult<Vec<Product>> {
        let mut sql = format!("{PRODUCT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_retired {
            sql.push_str(" AND available = 1");
        }

        sql.push_str(" ORDER BY id ASC LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(query.limit.map_or(-1, i64::from)));
        bind_values.push(Value::Integer(
            i64::try_from(query.offset).unwrap_or(i64::MAX),
        ));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut products = Vec::new();

        while let Some(row) = rows.next()? {
            products.push(parse_product_row(row)?);
        }

        Ok(products)
    }

    fn count_products(&self, include_retired: bool) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM products WHERE (?1 = 1 OR available = 1);",
            [bool_to_int(include_retired)],
            |row| row.get(0),
        )?;

        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative product count `{count}`")))
    }

    fn update_product(&self, id: ProductId, patch: &ProductPatch) -> RepoResult<Product> {
        patch.validate()?;

        if patch.is_empty() {
            return self.read_back(id);
        }

        let mut assignments: Vec<&str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(name) = patch.name.as_deref() {
            assignments.push("name = ?");
            bind_values.push(Value::Text(name.to_string()));
        }
        if let Some(price) = patch.price {
            assignments.push("price = ?");
            bind_values.push(Value::Text(price_to_db(price)));
        }
        if let Some(available) = patch.available {
            assignments.push("available = ?");
            bind_values.push(Value::Integer(bool_to_int(available)));
        }
        assignments.push("updated_at = CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)");
        bind_values.push(Value::Integer(id));

        let sql = format!(
            "UPDATE products SET {} WHERE id = ?;",
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        self.read_back(id)
    }

    fn set_available(&self, id: ProductId, available: bool) -> RepoResult<Product> {
        let changed = self.conn.execute(
            "UPDATE products
             SET
                available = ?1,
                updated_at = CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)
             WHERE id = ?2;",
            params![bool_to_int(available), id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        self.read_back(id)
    }

    fn find_products_by_ids(&self, ids: &[ProductId]) -> RepoResult<Vec<Product>> {
        let mut products = Vec::new();

        for chunk in ids.chunks(ID_LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let mut stmt = self.conn.prepare(&format!(
                "{PRODUCT_SELECT_SQL} WHERE id IN ({placeholders}) ORDER BY id ASC;"
            ))?;
            let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                products.push(parse_product_row(row)?);
            }
        }

        if ids.len() > ID_LOOKUP_CHUNK {
            products.sort_by_key(|product| product.id);
        }
        Ok(products)
    }
}

fn parse_product_row(row: &Row<'_>) -> RepoResult<Product> {
    let id: ProductId = row.get("id")?;

    let price_text: String = row.get("price")?;
    let price = Decimal::from_str(&price_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid price value `{price_text}` in products.price for id {id}"
        ))
    })?;

    let available = match row.get::<_, i64>("available")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid available value `{other}` in products.available for id {id}"
            )));
        }
    };

    Ok(Product {
        id,
        name: row.get("name")?,
        price,
        available,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn ensure_product_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_sql: Option<String> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'products';",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if table_sql.is_none() {
        return Err(RepoError::MissingRequiredTable("products"));
    }

    let columns = table_columns(conn, "products")?;
    for column in REQUIRED_COLUMNS {
        if !columns.iter().any(|current| current == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: "products",
                column,
            });
        }
    }

    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn price_to_db(price: Decimal) -> String {
    price.normalize().to_string()
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
