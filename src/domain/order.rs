//! Placed orders and their lifecycle states.

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CartItem;

/// Returns the current time at the microsecond precision orders are stored with.
pub fn utc_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// OrderStatus represents the fulfilment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order is persisted but payment has not settled yet.
    Pending,
    /// Payment settled, order is being fulfilled.
    Processing,
    /// Order was fulfilled.
    Completed,
    /// Order was cancelled before fulfilment.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Returns the stored representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true for statuses no checked transition may leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Statuses from which a user may cancel.
    pub fn cancellable() -> &'static [OrderStatus] {
        &[OrderStatus::Pending, OrderStatus::Processing]
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

/// PaymentStatus represents the settlement state of an order's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            _ => Err(format!("Unknown payment status: {}", s)),
        }
    }
}

/// OrderItem is a line item copied from the cart when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Catalog reference of the purchased product.
    pub product_id: String,
    /// Display name at the time of purchase.
    pub name: String,
    /// Price per unit at the time of purchase.
    pub unit_price: Decimal,
    /// Number of units purchased (at least 1).
    pub quantity: u32,
    /// Optional product image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl OrderItem {
    /// Returns unit_price * quantity, or None if it overflows.
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            unit_price: item.price,
            quantity: item.quantity,
            image: item.image.clone(),
        }
    }
}

/// ShippingAddress is the delivery destination of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub country: String,
    pub postal_code: String,
}

impl ShippingAddress {
    /// Returns the name of the first blank field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("street", &self.street),
            ("city", &self.city),
            ("country", &self.country),
            ("postalCode", &self.postal_code),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Order is a purchase record created from a snapshot of a user's cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique identifier assigned at creation.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Line items copied from the cart.
    pub items: Vec<OrderItem>,
    /// Sum of all line totals, fixed at creation.
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    /// Client-supplied checkout token used to deduplicate retries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a pending order from cart line items.
    ///
    /// Items are copied, so later changes to the cart or catalog never
    /// reach the order. The total is computed here and never again.
    /// Fails if the total does not fit in a `Decimal`.
    pub fn from_cart_items(
        user_id: impl Into<String>,
        items: &[CartItem],
        shipping_address: ShippingAddress,
        payment_method: impl Into<String>,
        idempotency_key: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, String> {
        let items: Vec<OrderItem> = items.iter().map(OrderItem::from).collect();
        let total_amount = Self::total_of(&items)
            .ok_or_else(|| "order total exceeds the supported amount range".to_string())?;
        let now = now.trunc_subsecs(6);

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            items,
            total_amount,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_address,
            payment_method: payment_method.into(),
            idempotency_key,
            created_at: now,
            updated_at: now,
        })
    }

    /// Sums the line totals of the given items, or None on overflow.
    pub fn total_of(items: &[OrderItem]) -> Option<Decimal> {
        items
            .iter()
            .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.line_total()?))
    }

    /// Returns true if the user may still cancel this order.
    pub fn is_cancellable(&self) -> bool {
        OrderStatus::cancellable().contains(&self.status)
    }
}
