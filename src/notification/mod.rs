//! Out-of-band reporting of checkout events.
//!
//! Some failures must never reach the caller (a cart that could not be
//! cleared after the order committed), yet someone has to hear about them.
//! They are reported here instead.

mod notifier;

pub use notifier::{
    CartClearFailedData, Event, EventData, EventType, LogNotifier, MultiNotifier,
    NoopNotifier, NotificationError, Notifier, OrderCancelledData, OrderPlacedData,
    PaymentUnsettledData, StatusOverwrittenData, format_event,
};
