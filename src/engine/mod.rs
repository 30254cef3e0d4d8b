//! Pure computation engines for the desk ledger.
//!
//! Everything here is a synchronous function of its inputs: no I/O, no
//! shared mutable state, identical outputs for identical inputs. The one
//! stateful component is [`lifecycle::StatusTable`], which owns the shared
//! status map behind a single-writer critical section.

use crate::domain::{MarketReport, Trade};

pub mod analytics;
pub mod benchmark;
pub mod lifecycle;
pub mod matching;

pub use analytics::{
    AgingBuckets, Analytics, BenchmarkAnnotation, BlendedTotals, GroupStat, WeekBucket,
    WeekDeviation,
};
pub use benchmark::{BenchmarkQuery, BenchmarkResolver};
pub use lifecycle::{
    valid_next_states, ApprovalCheck, ApprovalReason, StatusTable, Transition, TransitionRecord,
};
pub use matching::{match_pairs, BuyIndex, MatchedPair, MatchedTotals};

/// Explicit handle to the global collections cross-window computations need.
///
/// The working set handed to a view is already filtered by the caller (date
/// range, product, region, visibility); matching and aging must still see
/// every order, so the unfiltered collections travel here rather than in
/// ambient globals.
#[derive(Debug, Clone, Copy)]
pub struct EngineContext<'a> {
    /// Every Buy on the book, unfiltered.
    pub all_buys: &'a [Trade],
    /// Every Sell on the book, unfiltered.
    pub all_sells: &'a [Trade],
    /// Full market-report history, sorted ascending by date.
    pub reports: &'a [MarketReport],
}

impl<'a> EngineContext<'a> {
    pub fn new(
        all_buys: &'a [Trade],
        all_sells: &'a [Trade],
        reports: &'a [MarketReport],
    ) -> Self {
        Self {
            all_buys,
            all_sells,
            reports,
        }
    }

    pub fn resolver(&self) -> BenchmarkResolver<'a> {
        BenchmarkResolver::new(self.reports)
    }

    pub fn buy_index(&self) -> BuyIndex<'a> {
        BuyIndex::new(self.all_buys)
    }
}
