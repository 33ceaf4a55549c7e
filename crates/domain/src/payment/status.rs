//! Payment status state machine.

use serde::{Deserialize, Serialize};

/// The status of a payment in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──► Authorized ──► Completed ──► PartiallyRefunded ──► Refunded
///    │ ▲          │                └──────────────────────────────► Refunded
///    │ └──────────┤ (retry, capped)
///    └────────────┴──► Failed / Cancelled
/// ```
///
/// `Failed -> Pending` is the only backward edge and is guarded by the retry
/// cap on the aggregate. `Refunded` and `Cancelled` freeze the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Created, not yet settled with the gateway.
    #[default]
    Pending,

    /// Gateway authorized the charge, capture outstanding.
    Authorized,

    /// Funds captured.
    Completed,

    /// Gateway rejected or the attempt errored; retryable until the cap.
    Failed,

    /// Abandoned before capture (terminal).
    Cancelled,

    /// Part of the amount has been refunded.
    PartiallyRefunded,

    /// The full amount has been refunded (terminal).
    Refunded,
}

impl PaymentStatus {
    /// Returns true if the edge `self -> target` is in the transition table.
    pub fn can_transition_to(self, target: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Authorized)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Authorized, Completed)
                | (Authorized, Failed)
                | (Authorized, Cancelled)
                | (Failed, Pending)
                | (Completed, Refunded)
                | (Completed, PartiallyRefunded)
                | (PartiallyRefunded, Refunded)
        )
    }

    /// Returns true if refunds can be applied in this status.
    pub fn is_refundable(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::PartiallyRefunded
        )
    }

    /// Returns true if the record is frozen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Refunded | PaymentStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Authorized => "Authorized",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Cancelled => "Cancelled",
            PaymentStatus::PartiallyRefunded => "PartiallyRefunded",
            PaymentStatus::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
