//! Domain models for carts and placed orders.

mod cart;
mod order;
mod page;

pub use cart::{Cart, CartItem};
pub use order::{utc_now, Order, OrderItem, OrderStatus, PaymentStatus, ShippingAddress};
pub use page::{PageInfo, PageRequest};
