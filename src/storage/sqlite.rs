//! SQLite implementation of OrderStorage.

use crate::config::StorageConfig;
use crate::domain::{Order, OrderItem, OrderStatus, PaymentStatus, ShippingAddress};
use crate::storage::{OrderQuery, OrderStorage, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

const ORDER_COLUMNS: &str = "id, user_id, items, total_amount, status, payment_status, \
    street, city, country, postal_code, payment_method, idempotency_key, created_at, updated_at";

/// SqliteStorage implements OrderStorage using SQLite.
pub struct SqliteStorage {
    pool: Pool<Sqlite>,
}

/// SqliteStorageConfig holds SQLite storage configuration.
#[derive(Debug, Clone)]
pub struct SqliteStorageConfig {
    /// Path to the SQLite database file.
    pub path: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
}

impl Default for SqliteStorageConfig {
    fn default() -> Self {
        Self {
            path: "orders.db".to_string(),
            max_connections: 5,
        }
    }
}

impl From<&StorageConfig> for SqliteStorageConfig {
    fn from(config: &StorageConfig) -> Self {
        let defaults = Self::default();
        Self {
            path: config.path.clone().unwrap_or(defaults.path),
            max_connections: config.max_connections.unwrap_or(defaults.max_connections),
        }
    }
}

impl SqliteStorage {
    /// Creates a new SQLite storage instance.
    pub async fn new(config: SqliteStorageConfig) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let storage = Self { pool };

        storage.migrate().await?;

        info!(path = %config.path, "SQLite order storage initialized");
        Ok(storage)
    }

    /// Runs database migrations to create the schema.
    async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                items TEXT NOT NULL,
                total_amount TEXT NOT NULL,
                status TEXT NOT NULL,
                payment_status TEXT NOT NULL,
                street TEXT NOT NULL,
                city TEXT NOT NULL,
                country TEXT NOT NULL,
                postal_code TEXT NOT NULL,
                payment_method TEXT NOT NULL,
                idempotency_key TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_user_id ON orders(user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders(created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        // NULL keys never collide, so orders placed without a key are unaffected.
        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_orders_idempotency ON orders(user_id, idempotency_key)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Formats a timestamp so that lexical order matches chronological order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn status_list(statuses: &[OrderStatus]) -> String {
    statuses
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl OrderStorage for SqliteStorage {
    async fn insert(&self, order: &Order) -> Result<bool, StorageError> {
        let items = serde_json::to_string(&order.items)?;

        let result = sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, items, total_amount, status, payment_status,
                street, city, country, postal_code, payment_method,
                idempotency_key, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(user_id, idempotency_key) DO NOTHING
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(&items)
        .bind(order.total_amount.to_string())
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(&order.shipping_address.street)
        .bind(&order.shipping_address.city)
        .bind(&order.shipping_address.country)
        .bind(&order.shipping_address.postal_code)
        .bind(&order.payment_method)
        .bind(order.idempotency_key.as_deref())
        .bind(format_timestamp(&order.created_at))
        .bind(format_timestamp(&order.updated_at))
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;

        if inserted {
            debug!(
                order_id = %order.id,
                user_id = %order.user_id,
                total = %order.total_amount,
                "Order saved"
            );
        }

        Ok(inserted)
    }

    async fn set_payment_outcome(
        &self,
        order_id: &str,
        payment_status: PaymentStatus,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "UPDATE orders SET payment_status = ?1, status = ?2, updated_at = ?3 WHERE id = ?4",
        )
        .bind(payment_status.as_str())
        .bind(status.as_str())
        .bind(format_timestamp(&updated_at))
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn transition_status(
        &self,
        user_id: &str,
        order_id: &str,
        from: &[OrderStatus],
        to: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        if from.is_empty() {
            return Ok(false);
        }

        // Status names come from the enum, never from callers.
        let sql = format!(
            "UPDATE orders SET status = ?1, updated_at = ?2 \
             WHERE id = ?3 AND user_id = ?4 AND status IN ({})",
            status_list(from)
        );

        let result = sqlx::query(&sql)
            .bind(to.as_str())
            .bind(format_timestamp(&updated_at))
            .bind(order_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn overwrite_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query("UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status.as_str())
            .bind(format_timestamp(&updated_at))
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_by_id(&self, order_id: &str) -> Result<Option<Order>, StorageError> {
        let sql = format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(parse_order_row).transpose()
    }

    async fn get_for_user(
        &self,
        user_id: &str,
        order_id: &str,
    ) -> Result<Option<Order>, StorageError> {
        let sql = format!(
            "SELECT {} FROM orders WHERE id = ? AND user_id = ?",
            ORDER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(order_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(parse_order_row).transpose()
    }

    async fn get_by_idempotency_key(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<Order>, StorageError> {
        let sql = format!(
            "SELECT {} FROM orders WHERE user_id = ? AND idempotency_key = ?",
            ORDER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(parse_order_row).transpose()
    }

    async fn list(&self, query: &OrderQuery) -> Result<Vec<Order>, StorageError> {
        let sql = format!(
            r#"
            SELECT {} FROM orders
            WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?3 OFFSET ?4
            "#,
            ORDER_COLUMNS
        );

        let offset = i64::try_from(query.offset)
            .map_err(|_| StorageError::InvalidData(format!("offset too large: {}", query.offset)))?;

        let rows = sqlx::query(&sql)
            .bind(&query.user_id)
            .bind(query.status.map(|s| s.as_str()))
            .bind(i64::from(query.limit))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(parse_order_row).collect()
    }

    async fn count_matching(&self, query: &OrderQuery) -> Result<u64, StorageError> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM orders WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)",
        )
        .bind(&query.user_id)
        .bind(query.status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;

        parse_count(&row)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM orders")
            .fetch_one(&self.pool)
            .await?;

        parse_count(&row)
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close().await;
        Ok(())
    }
}

fn parse_count(row: &sqlx::sqlite::SqliteRow) -> Result<u64, StorageError> {
    let count: i64 = row.try_get("count")?;
    u64::try_from(count).map_err(|_| StorageError::InvalidData(format!("Invalid count: {}", count)))
}

fn parse_timestamp(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<DateTime<Utc>, StorageError> {
    let value: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidData(format!("Invalid {}: {}", column, e)))
}

/// Parses an order from a database row.
fn parse_order_row(row: &sqlx::sqlite::SqliteRow) -> Result<Order, StorageError> {
    let items_json: String = row.try_get("items")?;
    let items: Vec<OrderItem> = serde_json::from_str(&items_json)?;

    let total_str: String = row.try_get("total_amount")?;
    let total_amount = Decimal::from_str(&total_str)
        .map_err(|e| StorageError::InvalidData(format!("Invalid total_amount: {}", e)))?;

    let status_str: String = row.try_get("status")?;
    let status = OrderStatus::from_str(&status_str).map_err(StorageError::InvalidData)?;

    let payment_status_str: String = row.try_get("payment_status")?;
    let payment_status =
        PaymentStatus::from_str(&payment_status_str).map_err(StorageError::InvalidData)?;

    Ok(Order {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        items,
        total_amount,
        status,
        payment_status,
        shipping_address: ShippingAddress {
            street: row.try_get("street")?,
            city: row.try_get("city")?,
            country: row.try_get("country")?,
            postal_code: row.try_get("postal_code")?,
        },
        payment_method: row.try_get("payment_method")?,
        idempotency_key: row.try_get("idempotency_key")?,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}
