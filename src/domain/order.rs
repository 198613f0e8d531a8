//! Order status state machine
//!
//! `Pending` is the only status this service creates. Staff fulfilment
//! moves an order to `Completed`; the customer (or staff) can cancel a
//! not-yet-fulfilled order. `Processing` is accepted as an additional
//! cancellable state but is never produced here; it is reserved for
//! future use. `Completed` and `Cancelled` are terminal.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Why a claim code cannot be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FulfillmentError {
    #[error("This order is already completed.")]
    AlreadyCompleted,

    #[error("This order was cancelled and cannot be fulfilled.")]
    Unfulfillable,
}

/// Checks whether an order in `status` may be fulfilled via its claim
/// code. The status is left to the caller to transition.
pub fn check_fulfillable(status: OrderStatus) -> Result<(), FulfillmentError> {
    match status {
        OrderStatus::Completed => Err(FulfillmentError::AlreadyCompleted),
        OrderStatus::Cancelled => Err(FulfillmentError::Unfulfillable),
        OrderStatus::Pending | OrderStatus::Processing => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("Shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_cancellable_states() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Processing.is_cancellable());
        assert!(!OrderStatus::Completed.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn test_fulfillment_checks() {
        assert!(check_fulfillable(OrderStatus::Pending).is_ok());
        assert!(check_fulfillable(OrderStatus::Processing).is_ok());
        assert_eq!(
            check_fulfillable(OrderStatus::Completed),
            Err(FulfillmentError::AlreadyCompleted)
        );
        assert_eq!(
            check_fulfillable(OrderStatus::Cancelled),
            Err(FulfillmentError::Unfulfillable)
        );
    }
}
