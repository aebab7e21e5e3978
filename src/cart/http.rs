//! HTTP client for the cart service REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{CartCollaborator, CartError, Result};
use crate::config::CartServiceConfig;
use crate::domain::Cart;

/// Path of the caller's cart on the cart service.
const CART_ENDPOINT: &str = "/api/cart";

/// Upper bound for any single request when no tighter timeout is applied.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for creating a new HttpCartClient.
#[derive(Debug, Clone)]
pub struct HttpCartConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl HttpCartConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl From<&CartServiceConfig> for HttpCartConfig {
    fn from(config: &CartServiceConfig) -> Self {
        Self::new(config.base_url.clone())
    }
}

/// HTTP client for the cart service.
///
/// Holds no credentials. The cart service identifies the user from the
/// bearer token, so every call goes through [`HttpCartClient::authorize`].
#[derive(Debug, Clone)]
pub struct HttpCartClient {
    config: HttpCartConfig,
    http_client: HttpClient,
}

impl HttpCartClient {
    /// Creates a new cart service client.
    pub fn new(config: HttpCartConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CartError::Unreachable(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Binds a user and their bearer token for the duration of one request.
    ///
    /// The cart service resolves the user from the token alone, so the
    /// returned handle only serves `user_id` and rejects carts the service
    /// reports as owned by anyone else.
    pub fn authorize(&self, user_id: &str, token: &str) -> Result<AuthorizedCart<'_>> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        let authorization = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| CartError::InvalidResponse(format!("invalid bearer token: {}", e)))?;

        Ok(AuthorizedCart {
            client: self,
            user_id: user_id.to_string(),
            authorization,
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.config.base_url, CART_ENDPOINT)
    }

    /// Creates a CartError from an error response.
    fn parse_error_response(&self, status: StatusCode, body: &[u8]) -> CartError {
        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<String>,
        }

        let message = serde_json::from_slice::<ErrorResponse>(body)
            .ok()
            .and_then(|resp| resp.error)
            .unwrap_or_else(|| String::from_utf8_lossy(body).to_string());

        warn!(status = status.as_u16(), message = %message, "cart service error");

        CartError::Status {
            status: status.as_u16(),
            message,
        }
    }
}

/// A cart client bound to one caller's identity and credentials.
pub struct AuthorizedCart<'a> {
    client: &'a HttpCartClient,
    user_id: String,
    authorization: HeaderValue,
}

impl AuthorizedCart<'_> {
    /// Returns the user this handle was authorized for.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn ensure_principal(&self, user_id: &str) -> Result<()> {
        if user_id != self.user_id {
            warn!(principal = %self.user_id, requested = %user_id, "cart access for another user refused");
            return Err(CartError::Forbidden(format!(
                "token is bound to user {}, not {}",
                self.user_id, user_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CartCollaborator for AuthorizedCart<'_> {
    async fn fetch(&self, user_id: &str) -> Result<Option<Cart>> {
        #[derive(Deserialize)]
        struct CartResponse {
            cart: Option<Cart>,
        }

        self.ensure_principal(user_id)?;
        debug!(user_id = %user_id, "fetching cart");

        let response = self
            .client
            .http_client
            .get(self.client.url())
            .header(AUTHORIZATION, self.authorization.clone())
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(self.client.parse_error_response(status, &body));
        }

        let parsed: CartResponse = serde_json::from_slice(&body)
            .map_err(|e| CartError::InvalidResponse(e.to_string()))?;

        if let Some(owner) = parsed.cart.as_ref().and_then(|c| c.user_id.as_deref()) {
            if owner != user_id {
                warn!(principal = %user_id, owner = %owner, "cart service returned another user's cart");
                return Err(CartError::Forbidden(format!(
                    "token resolves to user {}, not {}",
                    owner, user_id
                )));
            }
        }

        Ok(parsed.cart)
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        self.ensure_principal(user_id)?;
        debug!(user_id = %user_id, "clearing cart");

        let response = self
            .client
            .http_client
            .delete(self.client.url())
            .header(AUTHORIZATION, self.authorization.clone())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }

        let body = response.bytes().await?;
        Err(self.client.parse_error_response(status, &body))
    }
}
