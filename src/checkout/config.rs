//! Order placement service configuration.

use std::time::Duration;

use crate::config::{CheckoutConfig, Config, DEFAULT_CART_TIMEOUT};

/// Order placement service options.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bound on the cart snapshot fetch.
    pub cart_fetch_timeout: Duration,
    /// Bound on the post-commit cart clear.
    pub cart_clear_timeout: Duration,
    /// Page size when the caller gives none.
    pub default_page_limit: u32,
    /// Largest accepted page size.
    pub max_page_limit: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let checkout = CheckoutConfig::default();
        Self {
            cart_fetch_timeout: DEFAULT_CART_TIMEOUT,
            cart_clear_timeout: DEFAULT_CART_TIMEOUT,
            default_page_limit: checkout.default_page_limit(),
            max_page_limit: checkout.max_page_limit(),
        }
    }
}

impl From<&Config> for ServiceConfig {
    fn from(config: &Config) -> Self {
        Self {
            cart_fetch_timeout: config.cart.fetch_timeout(),
            cart_clear_timeout: config.cart.clear_timeout(),
            default_page_limit: config.checkout.default_page_limit(),
            max_page_limit: config.checkout.max_page_limit(),
        }
    }
}
