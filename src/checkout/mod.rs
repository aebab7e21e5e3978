//! Order placement service.
//!
//! Turns a user's server-side cart into a persisted order and serves the
//! order queries and status changes that follow. The order store write is
//! the commit point: anything that fails before it leaves no trace, and
//! anything that fails after it is reported out-of-band while the caller
//! still receives the committed order.

mod config;
mod error;
mod locks;
mod request;

pub use config::ServiceConfig;
pub use error::{CheckoutError, Result};
pub use locks::{CheckoutGuard, CheckoutLocks};
pub use request::{CreateOrderRequest, OrderPage, parse_status};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cart::CartCollaborator;
use crate::domain::{
    Cart, Order, OrderStatus, PageInfo, PageRequest, PaymentStatus, utc_now,
};
use crate::notification::{
    CartClearFailedData, Event, Notifier, OrderCancelledData, OrderPlacedData,
    PaymentUnsettledData, StatusOverwrittenData,
};
use crate::payment::{PaymentGateway, PaymentOutcome};
use crate::storage::{OrderQuery, OrderStorage, StorageError};

/// Order placement service.
pub struct OrderService {
    cfg: ServiceConfig,
    storage: Arc<dyn OrderStorage>,
    payments: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    checkout_locks: CheckoutLocks,
}

impl OrderService {
    /// Creates a new OrderService.
    pub fn new(
        cfg: ServiceConfig,
        storage: Arc<dyn OrderStorage>,
        payments: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            cfg,
            storage,
            payments,
            notifier,
            checkout_locks: CheckoutLocks::new(),
        }
    }

    /// Places an order from the user's current cart.
    ///
    /// The cart capability is passed per call so each request can carry its
    /// own credentials.
    pub async fn create_order(
        &self,
        cart: &dyn CartCollaborator,
        user_id: &str,
        request: CreateOrderRequest,
    ) -> Result<Order> {
        validate_user_id(user_id)?;
        request.validate()?;

        let _guard = self
            .checkout_locks
            .try_acquire(user_id)
            .ok_or_else(|| CheckoutError::CheckoutInProgress(user_id.to_string()))?;

        if let Some(ref key) = request.idempotency_key {
            if let Some(existing) = self.storage.get_by_idempotency_key(user_id, key).await? {
                info!(
                    order_id = %existing.id,
                    user_id = %user_id,
                    "Checkout replayed for known idempotency key"
                );
                return Ok(existing);
            }
        }

        let snapshot = self.fetch_cart(cart, user_id).await?;
        let snapshot = match snapshot {
            Some(c) if !c.is_empty() => c,
            _ => return Err(CheckoutError::EmptyCart),
        };
        if let Some(problem) = snapshot.invalid_item() {
            warn!(user_id = %user_id, problem = %problem, "Cart service returned an invalid cart");
            return Err(CheckoutError::UpstreamUnavailable(problem));
        }

        let mut order = Order::from_cart_items(
            user_id,
            &snapshot.items,
            request.shipping_address,
            request.payment_method,
            request.idempotency_key,
            utc_now(),
        )
        .map_err(|problem| {
            warn!(user_id = %user_id, problem = %problem, "Cart total cannot be represented");
            CheckoutError::UpstreamUnavailable(problem)
        })?;

        if !self.storage.insert(&order).await? {
            return self.resolve_lost_insert(&order).await;
        }

        info!(
            order_id = %order.id,
            user_id = %user_id,
            items = order.items.len(),
            total = %order.total_amount,
            "Order created"
        );

        if self.settle_payment(&mut order).await {
            self.clear_cart(cart, &order).await;
        }

        self.send_notification(Event::order_placed(OrderPlacedData {
            order_id: order.id.clone(),
            user_id: order.user_id.clone(),
            total_amount: order.total_amount,
            item_count: order.items.len(),
            payment_status: order.payment_status,
        }))
        .await;

        Ok(order)
    }

    /// Returns one page of the user's orders, newest first.
    pub async fn list_orders(
        &self,
        user_id: &str,
        status: Option<OrderStatus>,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<OrderPage> {
        validate_user_id(user_id)?;
        let request = self.page_request(page, limit)?;

        let query = OrderQuery {
            user_id: user_id.to_string(),
            status,
            offset: request.offset(),
            limit: request.limit,
        };

        let (orders, total) = tokio::try_join!(
            self.storage.list(&query),
            self.storage.count_matching(&query)
        )?;

        debug!(
            user_id = %user_id,
            status = ?status,
            page = request.page,
            returned = orders.len(),
            total = total,
            "Orders listed"
        );

        Ok(OrderPage {
            orders,
            pagination: PageInfo::new(request, total),
        })
    }

    /// Returns a single order owned by the user.
    ///
    /// Orders of other users are reported exactly like missing ones.
    pub async fn get_order(&self, user_id: &str, order_id: &str) -> Result<Order> {
        self.storage
            .get_for_user(user_id, order_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFound(order_id.to_string()))
    }

    /// Cancels a pending or processing order owned by the user.
    pub async fn cancel_order(&self, user_id: &str, order_id: &str) -> Result<Order> {
        let mut order = self.get_order(user_id, order_id).await?;
        let previous = order.status;

        if !order.is_cancellable() {
            return Err(CheckoutError::InvalidTransition {
                from: previous,
                to: OrderStatus::Cancelled,
            });
        }

        let now = utc_now();
        let moved = self
            .storage
            .transition_status(
                user_id,
                order_id,
                OrderStatus::cancellable(),
                OrderStatus::Cancelled,
                now,
            )
            .await?;

        if !moved {
            // Someone else changed the status between our read and write.
            let current = self.get_order(user_id, order_id).await?;
            return Err(CheckoutError::InvalidTransition {
                from: current.status,
                to: OrderStatus::Cancelled,
            });
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = now;

        info!(order_id = %order_id, user_id = %user_id, previous = %previous, "Order cancelled");

        self.send_notification(Event::order_cancelled(OrderCancelledData {
            order_id: order.id.clone(),
            user_id: order.user_id.clone(),
            previous,
        }))
        .await;

        Ok(order)
    }

    /// Overwrites an order's status without consulting the state machine.
    ///
    /// Administrative escape hatch: unlike [`OrderService::cancel_order`] it
    /// is not scoped to an owner and can leave terminal states. Callers are
    /// responsible for authorising its use.
    pub async fn set_order_status(&self, order_id: &str, status: OrderStatus) -> Result<Order> {
        let mut order = self
            .storage
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFound(order_id.to_string()))?;
        let previous = order.status;

        let now = utc_now();
        if !self.storage.overwrite_status(order_id, status, now).await? {
            return Err(CheckoutError::NotFound(order_id.to_string()));
        }

        order.status = status;
        order.updated_at = now;

        if previous.is_terminal() && previous != status {
            warn!(
                order_id = %order_id,
                previous = %previous,
                status = %status,
                "Terminal order status overwritten"
            );
        } else {
            info!(order_id = %order_id, previous = %previous, status = %status, "Order status overwritten");
        }

        self.send_notification(Event::status_overwritten(StatusOverwrittenData {
            order_id: order.id.clone(),
            previous,
            current: status,
        }))
        .await;

        Ok(order)
    }

    /// Returns the checkout guard set, for observing in-flight checkouts.
    pub fn checkout_locks(&self) -> &CheckoutLocks {
        &self.checkout_locks
    }

    /// Reads the cart snapshot within the configured timeout.
    async fn fetch_cart(&self, cart: &dyn CartCollaborator, user_id: &str) -> Result<Option<Cart>> {
        let timeout = self.cfg.cart_fetch_timeout;

        match tokio::time::timeout(timeout, cart.fetch(user_id)).await {
            Ok(Ok(snapshot)) => Ok(snapshot),
            Ok(Err(e)) => {
                warn!(user_id = %user_id, error = %e, "Failed to fetch cart");
                Err(CheckoutError::UpstreamUnavailable(e.to_string()))
            }
            Err(_) => {
                warn!(user_id = %user_id, timeout = ?timeout, "Cart fetch timed out");
                Err(CheckoutError::UpstreamUnavailable(format!(
                    "cart fetch timed out after {:?}",
                    timeout
                )))
            }
        }
    }

    /// Settles payment and records the outcome.
    /// Returns true if the order is now paid and processing.
    async fn settle_payment(&self, order: &mut Order) -> bool {
        match self.payments.settle(order).await {
            Ok(PaymentOutcome::Paid) => {
                self.record_payment(order, PaymentStatus::Paid, OrderStatus::Processing)
                    .await
            }
            Ok(PaymentOutcome::Declined(reason)) => {
                info!(order_id = %order.id, reason = %reason, "Payment declined");
                // A failed record has already been reported by record_payment.
                if self
                    .record_payment(order, PaymentStatus::Failed, OrderStatus::Pending)
                    .await
                {
                    self.report_unsettled(order, format!("payment declined: {}", reason))
                        .await;
                }
                false
            }
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Payment gateway failed");
                self.report_unsettled(order, e.to_string()).await;
                false
            }
        }
    }

    /// Persists a payment outcome and mirrors it on the in-memory order.
    /// On failure the order is left exactly as stored.
    async fn record_payment(
        &self,
        order: &mut Order,
        payment_status: PaymentStatus,
        status: OrderStatus,
    ) -> bool {
        let now = utc_now();
        let result = self
            .storage
            .set_payment_outcome(&order.id, payment_status, status, now)
            .await;

        match result {
            Ok(true) => {
                order.payment_status = payment_status;
                order.status = status;
                order.updated_at = now;
                true
            }
            Ok(false) => {
                warn!(order_id = %order.id, "Order vanished before payment was recorded");
                self.report_unsettled(order, "order missing when recording payment".to_string())
                    .await;
                false
            }
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Failed to record payment outcome");
                self.report_unsettled(order, format!("failed to record payment: {}", e))
                    .await;
                false
            }
        }
    }

    /// Empties the user's cart after the order committed. Never fails the checkout.
    async fn clear_cart(&self, cart: &dyn CartCollaborator, order: &Order) {
        let timeout = self.cfg.cart_clear_timeout;

        let error = match tokio::time::timeout(timeout, cart.clear(&order.user_id)).await {
            Ok(Ok(())) => {
                debug!(order_id = %order.id, user_id = %order.user_id, "Cart cleared");
                return;
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("cart clear timed out after {:?}", timeout),
        };

        warn!(
            order_id = %order.id,
            user_id = %order.user_id,
            error = %error,
            "Failed to clear cart, order kept"
        );

        self.send_notification(Event::cart_clear_failed(CartClearFailedData {
            order_id: order.id.clone(),
            user_id: order.user_id.clone(),
            error,
        }))
        .await;
    }

    /// Handles an insert the store skipped because the idempotency key was taken.
    async fn resolve_lost_insert(&self, order: &Order) -> Result<Order> {
        if let Some(ref key) = order.idempotency_key {
            if let Some(existing) = self
                .storage
                .get_by_idempotency_key(&order.user_id, key)
                .await?
            {
                info!(
                    order_id = %existing.id,
                    user_id = %order.user_id,
                    "Concurrent checkout with same idempotency key, returning first order"
                );
                return Ok(existing);
            }
        }

        Err(CheckoutError::Persistence(StorageError::InvalidData(format!(
            "order {} was not inserted",
            order.id
        ))))
    }

    async fn report_unsettled(&self, order: &Order, reason: String) {
        self.send_notification(Event::payment_unsettled(PaymentUnsettledData {
            order_id: order.id.clone(),
            user_id: order.user_id.clone(),
            reason,
        }))
        .await;
    }

    /// Builds a page request, applying defaults and limits.
    fn page_request(&self, page: Option<u32>, limit: Option<u32>) -> Result<PageRequest> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(self.cfg.default_page_limit);

        if page < 1 {
            return Err(CheckoutError::Validation("page must be at least 1".into()));
        }
        if limit < 1 || limit > self.cfg.max_page_limit {
            return Err(CheckoutError::Validation(format!(
                "limit must be between 1 and {}",
                self.cfg.max_page_limit
            )));
        }

        Ok(PageRequest::new(page, limit))
    }

    /// Sends a notification event if the notifier wants it.
    async fn send_notification(&self, event: Event) {
        if !self.notifier.is_enabled(event.event_type) {
            return;
        }
        if let Err(e) = self.notifier.send(&event).await {
            debug!(
                event_type = %event.event_type,
                error = %e,
                "Failed to send notification"
            );
        }
    }
}

fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(CheckoutError::Validation("user id is required".into()));
    }
    Ok(())
}
