//! Payment settlement for freshly placed orders.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::domain::Order;

/// Payment gateway errors.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The gateway could not be reached or did not answer.
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// PaymentOutcome is the gateway's verdict on a settlement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Funds were captured.
    Paid,
    /// The payment method was refused.
    Declined(String),
}

/// PaymentGateway settles payment for an order that is already persisted.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn settle(&self, order: &Order) -> Result<PaymentOutcome, PaymentError>;
}

/// SimulatedPaymentGateway accepts every payment.
///
/// Stands in for a real gateway. Replacing it also requires the gateway's
/// own idempotency contract, keyed by order id.
#[derive(Debug, Default)]
pub struct SimulatedPaymentGateway;

impl SimulatedPaymentGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn settle(&self, order: &Order) -> Result<PaymentOutcome, PaymentError> {
        debug!(
            order_id = %order.id,
            amount = %order.total_amount,
            method = %order.payment_method,
            "simulated payment settled"
        );
        Ok(PaymentOutcome::Paid)
    }
}
