//! Checkout and order listing configuration.

use serde::Deserialize;

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const DEFAULT_MAX_PAGE_LIMIT: u32 = 100;

/// Order listing limits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutConfig {
    /// Page size used when the caller does not ask for one.
    pub default_page_limit: Option<u32>,
    /// Largest page size a caller may ask for.
    pub max_page_limit: Option<u32>,
}

impl CheckoutConfig {
    pub fn default_page_limit(&self) -> u32 {
        self.default_page_limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }

    pub fn max_page_limit(&self) -> u32 {
        self.max_page_limit.unwrap_or(DEFAULT_MAX_PAGE_LIMIT)
    }
}
