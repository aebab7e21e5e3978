//! Cart service configuration.

use serde::Deserialize;
use std::time::Duration;

use super::duration;

/// Default bound on a single cart service call.
pub const DEFAULT_CART_TIMEOUT: Duration = Duration::from_secs(5);

/// Cart service connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CartServiceConfig {
    /// Base URL of the cart service (e.g., "http://cart-service:3003").
    pub base_url: String,
    /// Maximum time to wait for the cart snapshot.
    #[serde(default, with = "duration")]
    pub fetch_timeout: Duration,
    /// Maximum time to wait for the cart to be cleared.
    #[serde(default, with = "duration")]
    pub clear_timeout: Duration,
}

impl CartServiceConfig {
    /// Fetch timeout, falling back to the default when unset.
    pub fn fetch_timeout(&self) -> Duration {
        if self.fetch_timeout.is_zero() {
            DEFAULT_CART_TIMEOUT
        } else {
            self.fetch_timeout
        }
    }

    /// Clear timeout, falling back to the default when unset.
    pub fn clear_timeout(&self) -> Duration {
        if self.clear_timeout.is_zero() {
            DEFAULT_CART_TIMEOUT
        } else {
            self.clear_timeout
        }
    }
}
