//! Shared types for the order fulfillment core.
//!
//! Every aggregate references its siblings by typed identifier, never by an
//! embedded object reference, so the identifier types live here at the
//! bottom of the dependency graph.

mod types;
mod version;

pub use types::{CustomerId, OrderId, PaymentId, ProductId, ShipmentId};
pub use version::Version;
