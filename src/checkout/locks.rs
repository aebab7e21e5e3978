//! Per-user single-flight guard for checkout.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// CheckoutLocks tracks users with a checkout in flight.
#[derive(Debug, Clone, Default)]
pub struct CheckoutLocks {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl CheckoutLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to claim the checkout slot of a user.
    /// Returns None if the user already has a checkout in flight.
    pub fn try_acquire(&self, user_id: &str) -> Option<CheckoutGuard> {
        let mut users = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !users.insert(user_id.to_string()) {
            return None;
        }

        Some(CheckoutGuard {
            in_flight: Arc::clone(&self.in_flight),
            user_id: user_id.to_string(),
        })
    }

    /// Returns true if the user has a checkout in flight.
    pub fn is_locked(&self, user_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(user_id)
    }
}

/// Releases the user's checkout slot when dropped, including when the
/// request future is cancelled mid-flight.
#[derive(Debug)]
pub struct CheckoutGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    user_id: String,
}

impl Drop for CheckoutGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.user_id);
    }
}
