//! Cart service integration.
//!
//! The checkout core never owns cart state. It reads a snapshot through
//! [`CartCollaborator::fetch`] and asks for the cart to be emptied once the
//! order is committed.

mod http;

pub use http::{AuthorizedCart, HttpCartClient, HttpCartConfig};

use crate::domain::Cart;
use async_trait::async_trait;
use thiserror::Error;

/// Cart collaborator errors.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart service could not be reached.
    #[error("cart service unreachable: {0}")]
    Unreachable(String),

    /// The cart service answered with a non-success status.
    #[error("cart service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("invalid cart response: {0}")]
    InvalidResponse(String),

    /// The credentials do not belong to the requested user.
    #[error("cart access denied: {0}")]
    Forbidden(String),
}

impl From<reqwest::Error> for CartError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CartError::InvalidResponse(err.to_string())
        } else {
            CartError::Unreachable(err.to_string())
        }
    }
}

/// Result type for cart operations.
pub type Result<T> = std::result::Result<T, CartError>;

/// CartCollaborator is the narrow view of the cart service the checkout needs.
#[async_trait]
pub trait CartCollaborator: Send + Sync {
    /// Fetch returns the user's current cart, or None if the user has none.
    async fn fetch(&self, user_id: &str) -> Result<Option<Cart>>;

    /// Clear empties the user's cart. Clearing an empty cart succeeds.
    async fn clear(&self, user_id: &str) -> Result<()>;
}
