//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──► Confirmed ──► Shipped ──► Delivered ──► Returned
///    │            │            │
///    └────────────┴────────────┴──► Cancelled
/// ```
///
/// `Delivered` is the terminal success status; its only exit is `Returned`,
/// and only within the return window enforced by the aggregate. `Cancelled`
/// and `Returned` have no exits at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order created, awaiting payment. Inventory is reserved.
    #[default]
    Pending,

    /// Payment captured, reservation confirmed.
    Confirmed,

    /// Handed to the carrier.
    Shipped,

    /// Delivered to the customer.
    Delivered,

    /// Cancelled before delivery (terminal).
    Cancelled,

    /// Returned after delivery (terminal).
    Returned,
}

impl OrderStatus {
    /// Returns true if the edge `self -> target` is in the transition table.
    ///
    /// Self-transitions are never legal, and terminal states have no exits.
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Shipped, Delivered)
                | (Shipped, Cancelled)
                | (Delivered, Returned)
        )
    }

    /// Returns true if the order can still be cancelled.
    pub fn can_be_cancelled(&self) -> bool {
        self.can_transition_to(OrderStatus::Cancelled)
    }

    /// Returns true if the order can be returned (delivered orders only).
    pub fn can_be_returned(&self) -> bool {
        self.can_transition_to(OrderStatus::Returned)
    }

    /// Returns true if no further transition is legal from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Returned => "Returned",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::*;

    const ALL: [OrderStatus; 6] = [Pending, Confirmed, Shipped, Delivered, Cancelled, Returned];

    #[test]
    fn default_status_is_pending() {
        assert_eq!(OrderStatus::default(), Pending);
    }

    #[test]
    fn forward_edges() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Delivered.can_transition_to(Returned));
    }

    #[test]
    fn no_stage_skipping() {
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Confirmed.can_transition_to(Delivered));
    }

    #[test]
    fn cancellation_reachable_until_delivery() {
        assert!(Pending.can_be_cancelled());
        assert!(Confirmed.can_be_cancelled());
        assert!(Shipped.can_be_cancelled());
        assert!(!Delivered.can_be_cancelled());
        assert!(!Cancelled.can_be_cancelled());
        assert!(!Returned.can_be_cancelled());
    }

    #[test]
    fn return_only_from_delivered() {
        for status in ALL {
            assert_eq!(status.can_be_returned(), status == Delivered);
        }
    }

    #[test]
    fn self_transitions_rejected() {
        for status in ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for terminal in [Cancelled, Returned] {
            assert!(terminal.is_terminal());
            for target in ALL {
                assert!(!terminal.can_transition_to(target));
            }
        }
    }

    #[test]
    fn no_backward_edges() {
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Confirmed));
        assert!(!Delivered.can_transition_to(Shipped));
    }

    #[test]
    fn serialization_roundtrip() {
        let status = OrderStatus::Shipped;
        let json = serde_json::to_string(&status).unwrap();
        let deserialized: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, deserialized);
    }
}
