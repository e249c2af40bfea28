use crate::engine::reconcile::{ImportPlan, Snapshot};
use crate::error::StoreError;
use crate::product::Product;
use crate::store::{CommitSummary, ProductStore};

use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id    TEXT    NOT NULL UNIQUE,
    product_name  TEXT    NOT NULL,
    category      TEXT    NOT NULL,
    price         TEXT    NOT NULL,
    quantity_sold INTEGER NOT NULL CHECK (quantity_sold >= 0),
    rating        REAL    NOT NULL,
    review_count  INTEGER NOT NULL CHECK (review_count >= 0)
);
CREATE INDEX IF NOT EXISTS idx_products_category ON products (category);
"#;

const SELECT_ALL: &str = "SELECT product_id, product_name, category, price, quantity_sold, \
                          rating, review_count FROM products ORDER BY product_id";

/// Products persisted in a SQLite database file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

struct StoredRow {
    product_id: String,
    product_name: String,
    category: String,
    price: String,
    quantity_sold: i64,
    rating: f64,
    review_count: i64,
}

impl StoredRow {
    fn into_product(self) -> Result<Product, StoreError> {
        let corrupt = |message: String| StoreError::Corrupt {
            product_id: self.product_id.clone(),
            message,
        };

        let price = Decimal::from_str(&self.price)
            .map_err(|e| corrupt(format!("bad price {:?}: {}", self.price, e)))?;
        let quantity_sold = u32::try_from(self.quantity_sold)
            .map_err(|_| corrupt(format!("bad quantity_sold {}", self.quantity_sold)))?;
        let review_count = u32::try_from(self.review_count)
            .map_err(|_| corrupt(format!("bad review_count {}", self.review_count)))?;

        Ok(Product {
            product_id: self.product_id,
            product_name: self.product_name,
            category: self.category,
            price,
            quantity_sold,
            rating: self.rating,
            review_count,
        })
    }
}

fn conflict_or(e: rusqlite::Error, product_id: &str) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, ref message)
            if err.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict {
                product_id: product_id.to_string(),
                message: message
                    .clone()
                    .unwrap_or_else(|| "constraint violation".to_string()),
            }
        }
        other => StoreError::Sqlite(other),
    }
}

impl ProductStore for SqliteStore {
    fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(self
            .all()?
            .into_iter()
            .map(|p| (p.product_id.clone(), p))
            .collect())
    }

    fn all(&self) -> Result<Vec<Product>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(SELECT_ALL)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(StoredRow {
                    product_id: row.get(0)?,
                    product_name: row.get(1)?,
                    category: row.get(2)?,
                    price: row.get(3)?,
                    quantity_sold: row.get(4)?,
                    rating: row.get(5)?,
                    review_count: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(StoredRow::into_product).collect()
    }

    fn commit(&self, plan: &ImportPlan) -> Result<CommitSummary, StoreError> {
        let mut conn = self.conn.lock();
        // Rolled back on drop unless committed below.
        let tx = conn.transaction()?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO products (product_id, product_name, category, price, \
                 quantity_sold, rating, review_count) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for p in &plan.to_create {
                insert
                    .execute(params![
                        p.product_id,
                        p.product_name,
                        p.category,
                        p.price.to_string(),
                        p.quantity_sold,
                        p.rating,
                        p.review_count,
                    ])
                    .map_err(|e| conflict_or(e, &p.product_id))?;
            }

            let mut update = tx.prepare(
                "UPDATE products SET product_name = ?2, category = ?3, price = ?4, \
                 quantity_sold = ?5, rating = ?6, review_count = ?7 WHERE product_id = ?1",
            )?;
            for p in &plan.to_update {
                let changed = update
                    .execute(params![
                        p.product_id,
                        p.product_name,
                        p.category,
                        p.price.to_string(),
                        p.quantity_sold,
                        p.rating,
                        p.review_count,
                    ])
                    .map_err(|e| conflict_or(e, &p.product_id))?;
                if changed != 1 {
                    return Err(StoreError::Conflict {
                        product_id: p.product_id.clone(),
                        message: "product to update does not exist".to_string(),
                    });
                }
            }
        }

        tx.commit()?;

        Ok(CommitSummary {
            created: plan.to_create.len(),
            updated: plan.to_update.len(),
        })
    }
}
