//! Storage interfaces and implementations for persisting orders.

mod sqlite;

pub use sqlite::{SqliteStorage, SqliteStorageConfig};

use crate::domain::{Order, OrderStatus, PaymentStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// OrderQuery selects a user's orders for listing.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// Owning user.
    pub user_id: String,
    /// Restrict to a single status.
    pub status: Option<OrderStatus>,
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u32,
}

/// OrderStorage defines the interface of the order store.
///
/// Every write touches a single order row and is atomic on its own.
#[async_trait]
pub trait OrderStorage: Send + Sync {
    /// Insert persists a new order.
    /// Returns false if an order with the same user and idempotency key already exists.
    async fn insert(&self, order: &Order) -> Result<bool, StorageError>;

    /// SetPaymentOutcome records payment and fulfilment status together.
    /// Returns false if the order does not exist.
    async fn set_payment_outcome(
        &self,
        order_id: &str,
        payment_status: PaymentStatus,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// TransitionStatus moves an order to `to` only if its current status is one of `from`.
    /// Returns false if no order matched.
    async fn transition_status(
        &self,
        user_id: &str,
        order_id: &str,
        from: &[OrderStatus],
        to: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// OverwriteStatus sets the status unconditionally.
    /// Returns false if the order does not exist.
    async fn overwrite_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// GetByID retrieves an order regardless of owner.
    async fn get_by_id(&self, order_id: &str) -> Result<Option<Order>, StorageError>;

    /// GetForUser retrieves an order only if it belongs to the given user.
    async fn get_for_user(
        &self,
        user_id: &str,
        order_id: &str,
    ) -> Result<Option<Order>, StorageError>;

    /// GetByIdempotencyKey retrieves the order a user placed with the given key.
    async fn get_by_idempotency_key(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<Order>, StorageError>;

    /// List returns one page of a user's orders, newest first.
    async fn list(&self, query: &OrderQuery) -> Result<Vec<Order>, StorageError>;

    /// CountMatching returns how many orders match the query, ignoring offset and limit.
    async fn count_matching(&self, query: &OrderQuery) -> Result<u64, StorageError>;

    /// Count returns the total number of stored orders.
    async fn count(&self) -> Result<u64, StorageError>;

    /// Close closes the storage connection.
    async fn close(&self) -> Result<(), StorageError>;
}

/// StorageError represents errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests;
