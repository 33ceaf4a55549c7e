//! Inventory ledger trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::ProductId;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The reservation would take `available` negative. Carries the numbers
    /// so callers can show an actionable message.
    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The ledger has never seen this product.
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),
}

/// A (product, quantity) pair for multi-line operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl StockLine {
    /// Creates a new stock line.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Ledger of available quantity per product.
///
/// Reservation and confirmation share the same decrement: `reserve` takes
/// the units, `confirm` is the explicit lifecycle hook that acknowledges the
/// hold became a sale, and `release`/`return_to_stock` are the only
/// operations that put units back.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Returns the available quantity for a product.
    async fn available(&self, product_id: &ProductId) -> Result<u32, InventoryError>;

    /// Places a hold on `quantity` units, decrementing `available`.
    ///
    /// Fails with `InsufficientStock` when `available < quantity`; the
    /// ledger is unchanged on failure.
    async fn reserve(&self, product_id: &ProductId, quantity: u32) -> Result<(), InventoryError>;

    /// Drops a hold, incrementing `available`. Used on cancellation.
    async fn release(&self, product_id: &ProductId, quantity: u32) -> Result<(), InventoryError>;

    /// Acknowledges that a hold became a sale.
    ///
    /// Quantity was already decremented at reservation time; this exists as
    /// the explicit hook for a future two-phase model.
    async fn confirm(&self, product_id: &ProductId, quantity: u32) -> Result<(), InventoryError>;

    /// Puts returned goods back into stock.
    ///
    /// Same increment as `release`, but returns mean physical goods
    /// re-entering a warehouse rather than a logical hold being dropped.
    async fn return_to_stock(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), InventoryError>;

    /// Reserves every line or none of them.
    ///
    /// Lines are taken in ascending product id order so that two concurrent
    /// multi-line reservations over overlapping product sets cannot
    /// deadlock. On the first failure, holds already placed by this call are
    /// released before the error is returned.
    async fn reserve_all(&self, lines: &[StockLine]) -> Result<(), InventoryError> {
        let mut ordered: Vec<&StockLine> = lines.iter().collect();
        ordered.sort_by(|a, b| a.product_id.cmp(&b.product_id));

        let mut reserved: Vec<&StockLine> = Vec::with_capacity(ordered.len());
        for line in ordered {
            match self.reserve(&line.product_id, line.quantity).await {
                Ok(()) => reserved.push(line),
                Err(err) => {
                    for done in &reserved {
                        if let Err(release_err) =
                            self.release(&done.product_id, done.quantity).await
                        {
                            tracing::error!(
                                product_id = %done.product_id,
                                error = %release_err,
                                "failed to roll back reservation",
                            );
                        }
                    }
                    metrics::counter!("stock_reservation_failures_total").increment(1);
                    return Err(err);
                }
            }
        }
        metrics::counter!("stock_reservations_total").increment(1);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    available: HashMap<ProductId, u32>,
}

/// In-memory inventory ledger.
///
/// A single lock over the whole map makes each operation atomic with respect
/// to concurrent callers; the lock is never held across an await point.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryInventoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the available quantity for a product, creating the record if
    /// needed. Used by stock intake and tests.
    pub fn set_stock(&self, product_id: impl Into<ProductId>, quantity: u32) {
        self.state
            .write()
            .unwrap()
            .available
            .insert(product_id.into(), quantity);
    }

    /// Returns products at or below the given threshold.
    pub fn low_stock(&self, threshold: u32) -> Vec<(ProductId, u32)> {
        let state = self.state.read().unwrap();
        let mut low: Vec<(ProductId, u32)> = state
            .available
            .iter()
            .filter(|(_, qty)| **qty <= threshold)
            .map(|(id, qty)| (id.clone(), *qty))
            .collect();
        low.sort_by(|a, b| a.0.cmp(&b.0));
        low
    }
}

#[async_trait]
impl InventoryLedger for InMemoryInventoryLedger {
    async fn available(&self, product_id: &ProductId) -> Result<u32, InventoryError> {
        let state = self.state.read().unwrap();
        state
            .available
            .get(product_id)
            .copied()
            .ok_or_else(|| InventoryError::UnknownProduct(product_id.clone()))
    }

    async fn reserve(&self, product_id: &ProductId, quantity: u32) -> Result<(), InventoryError> {
        let mut state = self.state.write().unwrap();
        let available = state
            .available
            .get_mut(product_id)
            .ok_or_else(|| InventoryError::UnknownProduct(product_id.clone()))?;

        if *available < quantity {
            return Err(InventoryError::InsufficientStock {
                product_id: product_id.clone(),
                requested: quantity,
                available: *available,
            });
        }

        *available -= quantity;
        tracing::debug!(%product_id, quantity, remaining = *available, "stock reserved");
        Ok(())
    }

    async fn release(&self, product_id: &ProductId, quantity: u32) -> Result<(), InventoryError> {
        let mut state = self.state.write().unwrap();
        let available = state
            .available
            .get_mut(product_id)
            .ok_or_else(|| InventoryError::UnknownProduct(product_id.clone()))?;

        *available += quantity;
        tracing::debug!(%product_id, quantity, remaining = *available, "reservation released");
        Ok(())
    }

    async fn confirm(&self, product_id: &ProductId, quantity: u32) -> Result<(), InventoryError> {
        let state = self.state.read().unwrap();
        if !state.available.contains_key(product_id) {
            return Err(InventoryError::UnknownProduct(product_id.clone()));
        }
        // Quantity already decremented at reservation time.
        tracing::debug!(%product_id, quantity, "reservation confirmed");
        Ok(())
    }

    async fn return_to_stock(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), InventoryError> {
        let mut state = self.state.write().unwrap();
        let available = state
            .available
            .get_mut(product_id)
            .ok_or_else(|| InventoryError::UnknownProduct(product_id.clone()))?;

        *available += quantity;
        tracing::debug!(%product_id, quantity, remaining = *available, "returned to stock");
        Ok(())
    }
}
