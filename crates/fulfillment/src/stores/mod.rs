//! Store traits and in-memory implementations.
//!
//! Stores uphold the persistence invariants the core needs without binding a
//! particular engine: one record per id, optimistic concurrency on save, and
//! the secondary lookups the lifecycle operations use. Every save presents
//! the version the caller loaded; a mismatch means another transition won
//! the race and the caller gets a `Conflict` instead of a lost update.

mod order;
mod payment;
mod shipment;

pub use order::{InMemoryOrderStore, OrderStore};
pub use payment::{InMemoryPaymentStore, PaymentStore};
pub use shipment::{InMemoryShipmentStore, ShipmentStore};
