//! Checkout error types.

use crate::domain::OrderStatus;
use crate::storage::StorageError;

/// Errors returned by the order placement service.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// Missing or malformed input; reported before any side effect.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The user's cart is absent or has no items.
    #[error("cart is empty")]
    EmptyCart,

    /// The cart service failed, timed out, or returned an unusable cart.
    #[error("cart service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// No such order exists for the requesting user.
    #[error("order {0} not found")]
    NotFound(String),

    /// The requested status change is not allowed from the current status.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Another checkout for the same user is still running.
    #[error("checkout already in progress for user {0}")]
    CheckoutInProgress(String),

    /// The order store failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] StorageError),
}

/// Result type for checkout operations.
pub type Result<T> = std::result::Result<T, CheckoutError>;
