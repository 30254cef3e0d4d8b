//! Domain primitives: TradeId, Side, Region, LifecycleStatus.

use serde::{Deserialize, Serialize};

/// Unique trade identifier, immutable once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradeId(pub i64);

impl TradeId {
    pub fn new(id: i64) -> Self {
        TradeId(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TradeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade side: Buy (from a mill) or Sell (to a customer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Market region a trade or report price belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    West,
    Central,
    East,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Region::West => write!(f, "west"),
            Region::Central => write!(f, "central"),
            Region::East => write!(f, "east"),
        }
    }
}

/// Lifecycle state of a trade. Defaults to `Draft` when unrecorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    #[default]
    Draft,
    Pending,
    Approved,
    Confirmed,
    Shipped,
    Delivered,
    Settled,
    Cancelled,
}

impl std::fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleStatus::Draft => "draft",
            LifecycleStatus::Pending => "pending",
            LifecycleStatus::Approved => "approved",
            LifecycleStatus::Confirmed => "confirmed",
            LifecycleStatus::Shipped => "shipped",
            LifecycleStatus::Delivered => "delivered",
            LifecycleStatus::Settled => "settled",
            LifecycleStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_serialization() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "\"sell\"");
    }

    #[test]
    fn test_region_serialization() {
        assert_eq!(serde_json::to_string(&Region::West).unwrap(), "\"west\"");
        let back: Region = serde_json::from_str("\"central\"").unwrap();
        assert_eq!(back, Region::Central);
    }

    #[test]
    fn test_status_default_is_draft() {
        assert_eq!(LifecycleStatus::default(), LifecycleStatus::Draft);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(LifecycleStatus::Settled.to_string(), "settled");
        assert_eq!(LifecycleStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_trade_id_display() {
        assert_eq!(TradeId::new(42).to_string(), "42");
    }
}
