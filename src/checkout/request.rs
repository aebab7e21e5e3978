//! Inputs and outputs of the order placement service.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{CheckoutError, Result};
use crate::domain::{Order, OrderStatus, PageInfo, ShippingAddress};

/// CreateOrderRequest carries what the client submits at checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    /// Token identifying one logical checkout attempt.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl CreateOrderRequest {
    /// Checks the request before anything is read or written.
    pub fn validate(&self) -> Result<()> {
        if let Some(field) = self.shipping_address.missing_field() {
            return Err(CheckoutError::Validation(format!(
                "incomplete shipping address: {} is required",
                field
            )));
        }

        if self.payment_method.trim().is_empty() {
            return Err(CheckoutError::Validation("paymentMethod is required".into()));
        }

        if let Some(ref key) = self.idempotency_key {
            if key.trim().is_empty() {
                return Err(CheckoutError::Validation(
                    "idempotencyKey must not be blank".into(),
                ));
            }
        }

        Ok(())
    }
}

/// OrderPage is one page of a user's order history.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub pagination: PageInfo,
}

/// Parses a status name supplied by a caller.
pub fn parse_status(value: &str) -> Result<OrderStatus> {
    OrderStatus::from_str(value.trim()).map_err(CheckoutError::Validation)
}
