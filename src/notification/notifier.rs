use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{OrderStatus, PaymentStatus};

/// Kind of checkout event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// An order was committed.
    OrderPlaced,
    /// A user cancelled an order.
    OrderCancelled,
    /// An administrator overwrote an order status.
    StatusOverwritten,
    /// The cart could not be cleared after the order committed.
    CartClearFailed,
    /// Payment did not settle for a committed order.
    PaymentUnsettled,
}

impl EventType {
    /// Returns true for events that report something going wrong.
    pub fn is_failure(&self) -> bool {
        matches!(self, EventType::CartClearFailed | EventType::PaymentUnsettled)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::OrderPlaced => write!(f, "order_placed"),
            EventType::OrderCancelled => write!(f, "order_cancelled"),
            EventType::StatusOverwritten => write!(f, "status_overwritten"),
            EventType::CartClearFailed => write!(f, "cart_clear_failed"),
            EventType::PaymentUnsettled => write!(f, "payment_unsettled"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderPlacedData {
    pub order_id: String,
    pub user_id: String,
    pub total_amount: Decimal,
    pub item_count: usize,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone)]
pub struct OrderCancelledData {
    pub order_id: String,
    pub user_id: String,
    pub previous: OrderStatus,
}

#[derive(Debug, Clone)]
pub struct StatusOverwrittenData {
    pub order_id: String,
    pub previous: OrderStatus,
    pub current: OrderStatus,
}

#[derive(Debug, Clone)]
pub struct CartClearFailedData {
    pub order_id: String,
    pub user_id: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct PaymentUnsettledData {
    pub order_id: String,
    pub user_id: String,
    pub reason: String,
}

/// Payload of an event.
#[derive(Debug, Clone)]
pub enum EventData {
    OrderPlaced(OrderPlacedData),
    OrderCancelled(OrderCancelledData),
    StatusOverwritten(StatusOverwrittenData),
    CartClearFailed(CartClearFailedData),
    PaymentUnsettled(PaymentUnsettledData),
}

/// A checkout event.
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub data: EventData,
}

impl Event {
    pub fn new(event_type: EventType, data: EventData) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            data,
        }
    }

    pub fn order_placed(data: OrderPlacedData) -> Self {
        Self::new(EventType::OrderPlaced, EventData::OrderPlaced(data))
    }

    pub fn order_cancelled(data: OrderCancelledData) -> Self {
        Self::new(EventType::OrderCancelled, EventData::OrderCancelled(data))
    }

    pub fn status_overwritten(data: StatusOverwrittenData) -> Self {
        Self::new(EventType::StatusOverwritten, EventData::StatusOverwritten(data))
    }

    pub fn cart_clear_failed(data: CartClearFailedData) -> Self {
        Self::new(EventType::CartClearFailed, EventData::CartClearFailed(data))
    }

    pub fn payment_unsettled(data: PaymentUnsettledData) -> Self {
        Self::new(EventType::PaymentUnsettled, EventData::PaymentUnsettled(data))
    }

    /// Returns the order this event is about.
    pub fn order_id(&self) -> &str {
        match &self.data {
            EventData::OrderPlaced(d) => &d.order_id,
            EventData::OrderCancelled(d) => &d.order_id,
            EventData::StatusOverwritten(d) => &d.order_id,
            EventData::CartClearFailed(d) => &d.order_id,
            EventData::PaymentUnsettled(d) => &d.order_id,
        }
    }
}

/// Notifier delivers checkout events somewhere outside the request path.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one event.
    async fn send(&self, event: &Event) -> Result<(), NotificationError>;

    /// Returns true if this notifier wants events of the given type.
    fn is_enabled(&self, event_type: EventType) -> bool;

    /// Releases any resources held by the notifier.
    async fn close(&self) -> Result<(), NotificationError>;
}

/// Notification delivery error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("NotificationError: {message}")]
pub struct NotificationError {
    pub message: String,
}

impl NotificationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// MultiNotifier fans an event out to several notifiers.
pub struct MultiNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl MultiNotifier {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }
}

#[async_trait::async_trait]
impl Notifier for MultiNotifier {
    async fn send(&self, event: &Event) -> Result<(), NotificationError> {
        let mut errors = Vec::new();
        for notifier in &self.notifiers {
            if notifier.is_enabled(event.event_type) {
                if let Err(e) = notifier.send(event).await {
                    errors.push(e.message);
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(NotificationError::new(errors.join("; ")))
        }
    }

    fn is_enabled(&self, event_type: EventType) -> bool {
        self.notifiers.iter().any(|n| n.is_enabled(event_type))
    }

    async fn close(&self) -> Result<(), NotificationError> {
        let mut errors = Vec::new();
        for notifier in &self.notifiers {
            if let Err(e) = notifier.close().await {
                errors.push(e.message);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(NotificationError::new(errors.join("; ")))
        }
    }
}

/// NoopNotifier drops every event.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl NoopNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, _event: &Event) -> Result<(), NotificationError> {
        Ok(())
    }

    fn is_enabled(&self, _event_type: EventType) -> bool {
        false
    }

    async fn close(&self) -> Result<(), NotificationError> {
        Ok(())
    }
}

/// LogNotifier writes events to the tracing subscriber.
///
/// Failure events are logged at WARN, everything else at INFO.
#[derive(Debug, Default)]
pub struct LogNotifier {
    failures_only: bool,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only report failure events.
    pub fn failures_only() -> Self {
        Self { failures_only: true }
    }
}

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, event: &Event) -> Result<(), NotificationError> {
        let message = format_event(event);
        if event.event_type.is_failure() {
            warn!(event_type = %event.event_type, order_id = %event.order_id(), "{}", message);
        } else {
            info!(event_type = %event.event_type, order_id = %event.order_id(), "{}", message);
        }
        Ok(())
    }

    fn is_enabled(&self, event_type: EventType) -> bool {
        !self.failures_only || event_type.is_failure()
    }

    async fn close(&self) -> Result<(), NotificationError> {
        Ok(())
    }
}

// === Formatting ===

pub fn format_order_placed(data: &OrderPlacedData) -> String {
    format!(
        "order placed for user {}: {} item(s), total {}, payment {}",
        data.user_id, data.item_count, data.total_amount, data.payment_status
    )
}

pub fn format_order_cancelled(data: &OrderCancelledData) -> String {
    format!(
        "order cancelled by user {} (was {})",
        data.user_id, data.previous
    )
}

pub fn format_status_overwritten(data: &StatusOverwrittenData) -> String {
    format!("order status overwritten: {} -> {}", data.previous, data.current)
}

pub fn format_cart_clear_failed(data: &CartClearFailedData) -> String {
    format!(
        "cart of user {} not cleared after order commit: {}",
        data.user_id, data.error
    )
}

pub fn format_payment_unsettled(data: &PaymentUnsettledData) -> String {
    format!(
        "payment not settled for user {}: {}",
        data.user_id, data.reason
    )
}

/// Formats an event as a single human-readable line.
pub fn format_event(event: &Event) -> String {
    match &event.data {
        EventData::OrderPlaced(data) => format_order_placed(data),
        EventData::OrderCancelled(data) => format_order_cancelled(data),
        EventData::StatusOverwritten(data) => format_status_overwritten(data),
        EventData::CartClearFailed(data) => format_cart_clear_failed(data),
        EventData::PaymentUnsettled(data) => format_payment_unsettled(data),
    }
}
