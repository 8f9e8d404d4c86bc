//! Order state machine — tracks which step of the collection a session is in.

use serde::{Deserialize, Serialize};

/// The phases of the order conversation.
///
/// Progresses linearly: AwaitingCount → AwaitingProductName → AwaitingAddress →
/// AwaitingAmount → AwaitingShipping → Completed. The product name phase
/// repeats once per product without changing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPhase {
    AwaitingCount,
    AwaitingProductName,
    AwaitingAddress,
    AwaitingAmount,
    AwaitingShipping,
    /// Invoice rendered, waiting for delivery to be confirmed.
    Completed,
}

impl OrderPhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OrderPhase) -> bool {
        use OrderPhase::*;
        matches!(
            (self, target),
            (AwaitingCount, AwaitingProductName)
                | (AwaitingProductName, AwaitingAddress)
                | (AwaitingAddress, AwaitingAmount)
                | (AwaitingAmount, AwaitingShipping)
                | (AwaitingShipping, Completed)
                // Delivery failed: go back and ask for the last field again
                | (Completed, AwaitingShipping)
        )
    }

    /// Whether this phase is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Get the next phase in the linear progression, if any.
    pub fn next(&self) -> Option<OrderPhase> {
        use OrderPhase::*;
        match self {
            AwaitingCount => Some(AwaitingProductName),
            AwaitingProductName => Some(AwaitingAddress),
            AwaitingAddress => Some(AwaitingAmount),
            AwaitingAmount => Some(AwaitingShipping),
            AwaitingShipping => Some(Completed),
            Completed => None,
        }
    }
}

impl Default for OrderPhase {
    fn default() -> Self {
        Self::AwaitingCount
    }
}

impl std::fmt::Display for OrderPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingCount => "awaiting_count",
            Self::AwaitingProductName => "awaiting_product_name",
            Self::AwaitingAddress => "awaiting_address",
            Self::AwaitingAmount => "awaiting_amount",
            Self::AwaitingShipping => "awaiting_shipping",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}
