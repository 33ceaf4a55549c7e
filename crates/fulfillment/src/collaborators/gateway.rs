//! Payment gateway contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use domain::Money;
use thiserror::Error;

/// Gateway transport failure. Distinct from a business rejection: the charge
/// may or may not have happened on the remote side.
#[derive(Debug, Error)]
#[error("payment gateway unreachable: {0}")]
pub struct GatewayError(pub String);

/// Outcome of a charge attempt.
#[derive(Debug, Clone)]
pub struct GatewayCharge {
    /// The gateway's id for this charge.
    pub transaction_id: String,
    pub success: bool,
    pub failure_reason: Option<String>,
}

/// Settled state of a charge as reported by the gateway, used for
/// reconciliation of payments stuck pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewaySettlement {
    Completed,
    Pending,
    Failed,
}

/// External payment gateway.
///
/// Treated as an unreliable remote dependency: callers wrap `charge` in a
/// timeout and reconcile through `lookup` rather than trusting a single
/// round trip.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the given amount against a tokenized payment method.
    ///
    /// Our `reference` travels with the charge so a lost response can be
    /// reconciled later.
    async fn charge(
        &self,
        reference: &str,
        amount: Money,
        currency: &str,
        method_token: &str,
    ) -> Result<GatewayCharge, GatewayError>;

    /// Refunds part of a settled charge.
    async fn refund(&self, transaction_id: &str, amount: Money) -> Result<bool, GatewayError>;

    /// Reports the settled state of a charge by our reference.
    async fn lookup(&self, reference: &str) -> Result<GatewaySettlement, GatewayError>;
}

#[derive(Debug, Default)]
struct GatewayState {
    /// Settled charges keyed by our reference.
    charges: HashMap<String, GatewayCharge>,
    refunds: Vec<(String, Money)>,
    fail_next_charge: Option<String>,
    /// Respond, but only through `lookup` — simulates a lost callback.
    settle_silently: bool,
    /// Delay applied before answering the next charge.
    charge_delay: Option<Duration>,
    unreachable: bool,
    next_id: u32,
}

/// In-memory payment gateway with failure-injection knobs for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a gateway that approves everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declines the next charge with the given reason.
    pub fn fail_next_charge(&self, reason: impl Into<String>) {
        self.state.lock().unwrap().fail_next_charge = Some(reason.into());
    }

    /// Settles charges but withholds the response, so only `lookup` sees the
    /// outcome. Simulates a slow-but-successful remote call.
    pub fn settle_silently(&self, on: bool) {
        self.state.lock().unwrap().settle_silently = on;
    }

    /// Delays the next charge responses by the given duration.
    pub fn set_charge_delay(&self, delay: Duration) {
        self.state.lock().unwrap().charge_delay = Some(delay);
    }

    /// Makes every call fail with a transport error.
    pub fn set_unreachable(&self, on: bool) {
        self.state.lock().unwrap().unreachable = on;
    }

    /// Returns the number of settled (successful) charges.
    pub fn charge_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .charges
            .values()
            .filter(|c| c.success)
            .count()
    }

    /// Returns all refunds issued so far.
    pub fn refunds(&self) -> Vec<(String, Money)> {
        self.state.lock().unwrap().refunds.clone()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn charge(
        &self,
        reference: &str,
        _amount: Money,
        _currency: &str,
        _method_token: &str,
    ) -> Result<GatewayCharge, GatewayError> {
        let delay = {
            let state = self.state.lock().unwrap();
            state.charge_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(GatewayError("connection refused".to_string()));
        }

        state.next_id += 1;
        let transaction_id = format!("GW-{:04}", state.next_id);

        let charge = if let Some(reason) = state.fail_next_charge.take() {
            GatewayCharge {
                transaction_id,
                success: false,
                failure_reason: Some(reason),
            }
        } else {
            GatewayCharge {
                transaction_id,
                success: true,
                failure_reason: None,
            }
        };

        state.charges.insert(reference.to_string(), charge.clone());

        if state.settle_silently {
            // The charge settled remotely, but the caller never hears back.
            return Err(GatewayError("response lost".to_string()));
        }
        Ok(charge)
    }

    async fn refund(&self, transaction_id: &str, amount: Money) -> Result<bool, GatewayError> {
        let mut state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(GatewayError("connection refused".to_string()));
        }
        state.refunds.push((transaction_id.to_string(), amount));
        Ok(true)
    }

    async fn lookup(&self, reference: &str) -> Result<GatewaySettlement, GatewayError> {
        let state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(GatewayError("connection refused".to_string()));
        }
        Ok(match state.charges.get(reference) {
            Some(charge) if charge.success => GatewaySettlement::Completed,
            Some(_) => GatewaySettlement::Failed,
            None => GatewaySettlement::Pending,
        })
    }
}
