//! Order lifecycle coordination for the fulfillment core.
//!
//! This crate ties the independently-lifecycled aggregates together:
//!
//! 1. The [`OrderLifecycleManager`] drives the order state machine and, on
//!    every transition, coordinates the inventory ledger, the payment
//!    orchestrator, and the shipment tracker.
//! 2. The [`PaymentOrchestrator`] drives payments against an unreliable
//!    external gateway, with timeout, capped retry, and reconciliation.
//! 3. The [`ShipmentTracker`] drives shipments through the carrier event
//!    machine and serves the public tracking lookup.
//!
//! Compensating actions (inventory release, refunds) run when a cancellation
//! or return unwinds previously committed steps. An external side effect that
//! fails after its status transition committed is queued on the deferred
//! queue rather than rolled back; the committed status is the source of
//! truth.

pub mod collaborators;
pub mod deferred;
pub mod error;
pub mod orders;
pub mod payments;
pub mod shipments;
pub mod stores;

pub use collaborators::{
    Customer, CustomerDirectory, GatewayCharge, GatewayError, GatewaySettlement,
    InMemoryCustomerDirectory, InMemoryPaymentGateway, NotificationKind, NotificationSender,
    PaymentGateway, RecordingNotificationSender,
};
pub use deferred::{DeferredAction, DeferredQueue};
pub use error::FulfillmentError;
pub use orders::{CreateOrderRequest, OrderLifecycleManager};
pub use payments::{PaymentOrchestrator, PaymentRequest, STALENESS_THRESHOLD_MINUTES};
pub use shipments::{ShipmentTracker, TrackingUpdate};
pub use stores::{
    InMemoryOrderStore, InMemoryPaymentStore, InMemoryShipmentStore, OrderStore, PaymentStore,
    ShipmentStore,
};
