//! Configuration loading and validation for the checkout service.
//!
//! Uses serde_yaml to load YAML configuration files with support for
//! environment variable overrides for deployment-specific endpoints.

mod app;
mod cart;
mod checkout;
mod duration;
mod error;
mod storage;

pub use app::AppConfig;
pub use cart::{CartServiceConfig, DEFAULT_CART_TIMEOUT};
pub use checkout::CheckoutConfig;
pub use error::ConfigError;
pub use storage::StorageConfig;

use serde::Deserialize;
use std::{env, fs};

/// Environment variable overriding `cart.base_url`.
pub const CART_SERVICE_URL_ENV: &str = "CART_SERVICE_URL";

/// Environment variable overriding `storage.path`.
pub const ORDERS_DB_PATH_ENV: &str = "ORDERS_DB_PATH";

/// Root configuration structure for the checkout service.
///
/// Required sections: app, cart.
/// Optional sections: storage, checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Application-level settings like name and environment.
    pub app: AppConfig,
    /// Cart service endpoint and timeouts.
    pub cart: CartServiceConfig,
    /// Order store location (optional).
    #[serde(default)]
    pub storage: StorageConfig,
    /// Listing limits (optional).
    #[serde(default)]
    pub checkout: CheckoutConfig,
}

impl Config {
    /// Load configuration from a YAML file at the given path.
    ///
    /// First loads environment variables from `.env` file (if exists),
    /// then loads YAML config and applies overrides from:
    /// - `CART_SERVICE_URL`
    /// - `ORDERS_DB_PATH`
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content, |name| env::var(name).ok())
    }

    /// Parse and validate configuration from YAML text.
    ///
    /// `lookup_env` resolves override variables, which keeps tests away
    /// from the process environment.
    pub fn from_yaml<F>(yaml: &str, lookup_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Config = serde_yaml::from_str(yaml)?;

        config.apply_env_overrides(lookup_env);
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides<F>(&mut self, lookup_env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup_env(CART_SERVICE_URL_ENV).filter(|v| !v.is_empty()) {
            self.cart.base_url = url;
        }

        if let Some(path) = lookup_env(ORDERS_DB_PATH_ENV).filter(|v| !v.is_empty()) {
            self.storage.path = Some(path);
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.app.name.is_empty() {
            return Err(ConfigError::Validation("app.name is required".into()));
        }

        let base_url = self.cart.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::Validation(format!(
                "cart.base_url is required (or set {})",
                CART_SERVICE_URL_ENV
            )));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                field: "cart.base_url",
                value: base_url.to_string(),
            });
        }

        if let Some(max) = self.storage.max_connections {
            if max == 0 {
                return Err(ConfigError::Validation(
                    "storage.max_connections must be positive".into(),
                ));
            }
        }

        let default_limit = self.checkout.default_page_limit();
        let max_limit = self.checkout.max_page_limit();
        if default_limit == 0 || max_limit == 0 {
            return Err(ConfigError::Validation(
                "checkout page limits must be positive".into(),
            ));
        }
        if default_limit > max_limit {
            return Err(ConfigError::Validation(format!(
                "checkout.default_page_limit ({}) exceeds checkout.max_page_limit ({})",
                default_limit, max_limit
            )));
        }

        Ok(())
    }
}
