//! Domain types for the trading desk ledger.
//!
//! This module provides:
//! - Exact numeric handling via the Decimal wrapper
//! - Domain primitives: TradeId, Side, Region, LifecycleStatus
//! - Product code / length normalization
//! - Trade and MarketReport records

pub mod decimal;
pub mod primitives;
pub mod product;
pub mod report;
pub mod trade;

pub use decimal::Decimal;
pub use primitives::{LifecycleStatus, Region, Side, TradeId};
pub use product::{normalize_length, ProductCode, RANDOM_LENGTH};
pub use report::MarketReport;
pub use trade::Trade;
