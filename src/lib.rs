//! Trade matching, market-benchmark, and lifecycle engine for a wholesale
//! lumber trading desk's back-office ledger.
//!
//! The crate is a library with a purely in-process boundary: the caller
//! supplies Trade and MarketReport collections (plus a [`StatusTable`]
//! handle for the lifecycle machine) and gets plain aggregate structures
//! back. Loading trades and persisting statuses belong to the surrounding
//! application.

pub mod domain;
pub mod engine;
pub mod error;

pub use domain::{
    normalize_length, Decimal, LifecycleStatus, MarketReport, ProductCode, Region, Side, Trade,
    TradeId, RANDOM_LENGTH,
};
pub use engine::{
    match_pairs, valid_next_states, AgingBuckets, Analytics, ApprovalCheck, ApprovalReason,
    BenchmarkAnnotation, BenchmarkQuery, BenchmarkResolver, BlendedTotals, BuyIndex,
    EngineContext, GroupStat, MatchedPair, MatchedTotals, StatusTable, Transition,
    TransitionRecord, WeekBucket, WeekDeviation,
};
pub use error::LedgerError;
