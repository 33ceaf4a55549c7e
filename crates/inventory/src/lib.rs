//! Inventory ledger for the order fulfillment core.
//!
//! The ledger is the one resource with real read-modify-write contention
//! across customers, so every operation is atomic with respect to concurrent
//! callers on the same product, and `available` can never go negative: an
//! operation that would breach that fails instead of clamping.

mod ledger;

pub use ledger::{InMemoryInventoryLedger, InventoryError, InventoryLedger, StockLine};
