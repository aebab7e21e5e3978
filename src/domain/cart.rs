//! Cart contents as returned by the cart service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// CartItem is one line of a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    /// Unit price; the cart service stores it as a plain JSON number.
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

/// Cart is the server-side basket of a single user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Owner as resolved by the cart service from the caller's token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new(items: Vec<CartItem>) -> Self {
        Self {
            user_id: None,
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns a description of the first line item the cart service should
    /// never have accepted (zero quantity or negative price).
    pub fn invalid_item(&self) -> Option<String> {
        self.items.iter().find_map(|item| {
            if item.quantity == 0 {
                Some(format!("item {} has zero quantity", item.product_id))
            } else if item.price < Decimal::ZERO {
                Some(format!("item {} has negative price {}", item.product_id, item.price))
            } else {
                None
            }
        })
    }
}
