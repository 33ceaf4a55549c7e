//! External collaborator contracts and in-memory implementations.
//!
//! These are abstract contracts, not wire formats: the customer directory is
//! a read-only lookup, the payment gateway is an unreliable remote
//! dependency, and the notification sender is strictly fire-and-forget.

mod customers;
mod gateway;
mod notify;

pub use customers::{Customer, CustomerDirectory, InMemoryCustomerDirectory};
pub use gateway::{
    GatewayCharge, GatewayError, GatewaySettlement, InMemoryPaymentGateway, PaymentGateway,
};
pub use notify::{NotificationKind, NotificationSender, RecordingNotificationSender, notify_best_effort};
