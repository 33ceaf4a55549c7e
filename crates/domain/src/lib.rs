//! Domain layer for the order fulfillment core.
//!
//! This crate holds the pure business objects and their state machines:
//! - `Order` with its status lifecycle and monetary breakdown
//! - `Payment` with capture, retry, and refund rules
//! - `Shipment` with its carrier-event-driven tracking lifecycle
//! - `Cart`, `Money`, and `Address` value objects
//!
//! Nothing here performs I/O. Each transition method validates the edge,
//! mutates state, and stamps the corresponding timestamp; persistence and
//! side effects are coordinated by the `fulfillment` crate.

pub mod address;
pub mod cart;
pub mod money;
pub mod order;
pub mod payment;
pub mod shipment;

pub use address::Address;
pub use cart::{Cart, CartLine};
pub use money::Money;
pub use order::{
    MAX_LINE_QUANTITY, Order, OrderCharges, OrderError, OrderLine, OrderStatus, RETURN_WINDOW_DAYS,
};
pub use payment::{
    MAX_PAYMENT_RETRIES, Payment, PaymentError, PaymentStatus, RefundRecord,
};
pub use shipment::{
    Shipment, ShipmentError, ShipmentStatus, ShippingMethod, TrackingEvent,
};
