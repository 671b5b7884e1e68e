//! Status enums for orders and payment sessions.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a persisted order.
///
/// An order is created as `Processing` at checkout submission and moves to
/// `Paid` or `Canceled` once the payment session resolves. Orders are never
/// deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Payment session created, outcome not yet known.
    #[default]
    Processing,
    /// Payment succeeded.
    Paid,
    /// Payment session resolved without a successful payment.
    Canceled,
}

impl OrderStatus {
    /// The status as its wire/database string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Paid => "paid",
            Self::Canceled => "canceled",
        }
    }

    /// Parse a status from its wire/database string.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(Self::Processing),
            "paid" => Some(Self::Paid),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved outcome of an external payment session.
///
/// `Paid` and `Canceled` are terminal and are mirrored into the order record;
/// `Unauthorized` and `Unknown` are pass-through states for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// The payment intent succeeded.
    Paid,
    /// The payment intent resolved to any other terminal state.
    Canceled,
    /// The caller could not be authorized against the session.
    Unauthorized,
    /// The session carried no recognizable intent status.
    Unknown,
}

impl PaymentOutcome {
    /// The order status this outcome maps to, if it is terminal.
    #[must_use]
    pub const fn as_order_status(&self) -> Option<OrderStatus> {
        match self {
            Self::Paid => Some(OrderStatus::Paid),
            Self::Canceled => Some(OrderStatus::Canceled),
            Self::Unauthorized | Self::Unknown => None,
        }
    }
}

impl fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Paid => "paid",
            Self::Canceled => "canceled",
            Self::Unauthorized => "unauthorized",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_round_trip() {
        for status in [
            OrderStatus::Processing,
            OrderStatus::Paid,
            OrderStatus::Canceled,
        ] {
            assert_eq!(OrderStatus::from_str_opt(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_str_opt("refunded"), None);
    }

    #[test]
    fn test_outcome_to_order_status() {
        assert_eq!(
            PaymentOutcome::Paid.as_order_status(),
            Some(OrderStatus::Paid)
        );
        assert_eq!(
            PaymentOutcome::Canceled.as_order_status(),
            Some(OrderStatus::Canceled)
        );
        assert_eq!(PaymentOutcome::Unknown.as_order_status(), None);
        assert_eq!(PaymentOutcome::Unauthorized.as_order_status(), None);
    }
}
