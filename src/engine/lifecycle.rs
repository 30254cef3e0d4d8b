//! Trade lifecycle state machine and approval gating.
//!
//! The status table is the one stateful piece of the engine. Each mutation
//! runs read-validate-write inside a single lock acquisition, so two
//! concurrent transition requests for the same trade can never both
//! validate against a stale current value.

use crate::domain::{Decimal, LifecycleStatus, Side, Trade, TradeId};
use crate::engine::EngineContext;
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use crate::domain::LifecycleStatus::*;

/// Allowed transitions out of a status. Empty for `Settled` (terminal).
pub fn valid_next_states(status: LifecycleStatus) -> &'static [LifecycleStatus] {
    match status {
        Draft => &[Pending, Cancelled],
        Pending => &[Approved, Cancelled],
        Approved => &[Confirmed, Cancelled],
        Confirmed => &[Shipped, Cancelled],
        Shipped => &[Delivered],
        Delivered => &[Settled],
        Settled => &[],
        Cancelled => &[Draft],
    }
}

/// A successfully applied transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub trade_id: TradeId,
    pub from: LifecycleStatus,
    pub to: LifecycleStatus,
}

/// One entry of the append-only transition log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub trade_id: TradeId,
    pub from: LifecycleStatus,
    pub to: LifecycleStatus,
    pub notes: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct TableState {
    statuses: HashMap<TradeId, LifecycleStatus>,
    log: Vec<TransitionRecord>,
}

/// Shared map from trade id to lifecycle status, plus the transition log.
///
/// Statuses default to `Draft` when unrecorded. The engine owns only the
/// transition rules; persisting the table is the caller's concern.
#[derive(Debug, Default)]
pub struct StatusTable {
    inner: Mutex<TableState>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored status for a trade, or `Draft` when unrecorded.
    pub fn current_status(&self, trade_id: TradeId) -> LifecycleStatus {
        self.lock().statuses.get(&trade_id).copied().unwrap_or_default()
    }

    /// Validate and apply a transition.
    ///
    /// A no-op transition to the current state is always permitted. On an
    /// invalid transition the table is left unchanged and the attempted
    /// `(from, to)` pair is reported back.
    pub fn set_status(
        &self,
        trade_id: TradeId,
        new_status: LifecycleStatus,
        notes: Option<&str>,
    ) -> Result<Transition, LedgerError> {
        let mut state = self.lock();
        Self::apply(&mut state, trade_id, new_status, notes)
    }

    /// Move a trade to its next status, preferring forward progress:
    /// the first candidate that is not `Cancelled`, falling back to
    /// `Cancelled` only when it is the sole option.
    pub fn advance(
        &self,
        trade_id: TradeId,
        notes: Option<&str>,
    ) -> Result<Transition, LedgerError> {
        let mut state = self.lock();
        let current = state.statuses.get(&trade_id).copied().unwrap_or_default();

        let candidates = valid_next_states(current);
        let next = candidates
            .iter()
            .copied()
            .find(|s| *s != Cancelled)
            .or_else(|| candidates.first().copied())
            .ok_or(LedgerError::NoFurtherTransitions(current))?;

        Self::apply(&mut state, trade_id, next, notes)
    }

    /// Recorded transitions for a trade, in application order.
    pub fn history(&self, trade_id: TradeId) -> Vec<TransitionRecord> {
        self.lock()
            .log
            .iter()
            .filter(|r| r.trade_id == trade_id)
            .cloned()
            .collect()
    }

    fn apply(
        state: &mut TableState,
        trade_id: TradeId,
        new_status: LifecycleStatus,
        notes: Option<&str>,
    ) -> Result<Transition, LedgerError> {
        let current = state.statuses.get(&trade_id).copied().unwrap_or_default();

        if new_status != current && !valid_next_states(current).contains(&new_status) {
            tracing::warn!(%trade_id, from = %current, to = %new_status, "invalid transition rejected");
            return Err(LedgerError::InvalidTransition {
                from: current,
                to: new_status,
            });
        }

        state.statuses.insert(trade_id, new_status);
        state.log.push(TransitionRecord {
            trade_id,
            from: current,
            to: new_status,
            notes: notes.map(str::to_string),
            at: Utc::now(),
        });
        tracing::info!(%trade_id, from = %current, to = %new_status, "status transition");

        Ok(Transition {
            trade_id,
            from: current,
            to: new_status,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TableState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Why a trade was flagged for approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalReason {
    /// Volume above 100 MBF.
    LargeVolume,
    /// Notional above 50,000.
    LargeNotional,
    /// Sell to a customer with no prior non-cancelled Sell.
    FirstTimeCounterparty,
    /// Price more than 10% away from the resolvable benchmark.
    OffMarketPrice,
}

/// Result of the approval-requirement predicate.
///
/// Advisory only: it flags the move into `pending` for the operator but
/// never blocks the transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalCheck {
    pub required: bool,
    pub reasons: Vec<ApprovalReason>,
}

impl ApprovalCheck {
    /// Evaluate the approval rules for a trade about to move to `pending`.
    ///
    /// Pure given its inputs: the trade, the global Sell history (for the
    /// first-time-counterparty rule), the status table (cancelled Sells do
    /// not count as history), and the report history via the context.
    pub fn evaluate(trade: &Trade, ctx: &EngineContext<'_>, table: &StatusTable) -> Self {
        let mut reasons = Vec::new();

        if trade.volume > volume_limit() {
            reasons.push(ApprovalReason::LargeVolume);
        }
        if trade.notional() > notional_limit() {
            reasons.push(ApprovalReason::LargeNotional);
        }
        if trade.side == Side::Sell && is_first_time_customer(trade, ctx, table) {
            reasons.push(ApprovalReason::FirstTimeCounterparty);
        }
        if is_off_market(trade, ctx) {
            reasons.push(ApprovalReason::OffMarketPrice);
        }

        ApprovalCheck {
            required: !reasons.is_empty(),
            reasons,
        }
    }
}

/// 100 MBF.
fn volume_limit() -> Decimal {
    Decimal::from(100)
}

/// 50,000 in currency.
fn notional_limit() -> Decimal {
    Decimal::from(50_000)
}

fn is_first_time_customer(trade: &Trade, ctx: &EngineContext<'_>, table: &StatusTable) -> bool {
    !ctx.all_sells.iter().any(|other| {
        other.id != trade.id
            && other.counterparty == trade.counterparty
            && table.current_status(other.id) != Cancelled
    })
}

fn is_off_market(trade: &Trade, ctx: &EngineContext<'_>) -> bool {
    let Some(benchmark) = ctx.resolver().resolve_for_trade(trade) else {
        return false;
    };
    if benchmark.is_zero() {
        return false;
    }
    let tolerance = Decimal::from_str("0.10").expect("valid decimal");
    (trade.price - benchmark).abs() / benchmark > tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: i64) -> TradeId {
        TradeId::new(n)
    }

    #[test]
    fn test_transition_table_rows() {
        assert_eq!(valid_next_states(Draft), &[Pending, Cancelled]);
        assert_eq!(valid_next_states(Shipped), &[Delivered]);
        assert_eq!(valid_next_states(Settled), &[] as &[LifecycleStatus]);
        assert_eq!(valid_next_states(Cancelled), &[Draft]);
    }

    #[test]
    fn test_unrecorded_trade_is_draft() {
        let table = StatusTable::new();
        assert_eq!(table.current_status(id(1)), Draft);
    }

    #[test]
    fn test_set_status_valid_and_invalid() {
        let table = StatusTable::new();

        let t = table.set_status(id(1), Pending, Some("submitted")).unwrap();
        assert_eq!(t.from, Draft);
        assert_eq!(t.to, Pending);

        let err = table.set_status(id(1), Shipped, None).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidTransition {
                from: Pending,
                to: Shipped
            }
        );
        // State unchanged after the rejected transition.
        assert_eq!(table.current_status(id(1)), Pending);
    }

    #[test]
    fn test_same_state_noop_always_permitted() {
        let table = StatusTable::new();
        table.set_status(id(1), Pending, None).unwrap();
        let t = table.set_status(id(1), Pending, Some("re-submitted")).unwrap();
        assert_eq!(t.from, Pending);
        assert_eq!(t.to, Pending);
    }

    #[test]
    fn test_settled_is_terminal() {
        let table = StatusTable::new();
        for status in [Pending, Approved, Confirmed, Shipped, Delivered, Settled] {
            table.set_status(id(1), status, None).unwrap();
        }
        assert_eq!(
            table.set_status(id(1), Draft, None).unwrap_err(),
            LedgerError::InvalidTransition {
                from: Settled,
                to: Draft
            }
        );
        assert_eq!(
            table.advance(id(1), None).unwrap_err(),
            LedgerError::NoFurtherTransitions(Settled)
        );
    }

    #[test]
    fn test_advance_prefers_forward_progress() {
        let table = StatusTable::new();
        let t = table.advance(id(1), None).unwrap();
        assert_eq!(t.to, Pending);
    }

    #[test]
    fn test_advance_from_shipped_lands_on_delivered() {
        let table = StatusTable::new();
        for status in [Pending, Approved, Confirmed, Shipped] {
            table.set_status(id(1), status, None).unwrap();
        }
        let t = table.advance(id(1), None).unwrap();
        assert_eq!(t.to, Delivered);
    }

    #[test]
    fn test_advance_from_cancelled_reopens_draft() {
        let table = StatusTable::new();
        table.set_status(id(1), Cancelled, None).unwrap();
        let t = table.advance(id(1), None).unwrap();
        assert_eq!(t.to, Draft);
    }

    #[test]
    fn test_history_records_in_order() {
        let table = StatusTable::new();
        table.set_status(id(1), Pending, Some("submitted")).unwrap();
        table.set_status(id(2), Pending, None).unwrap();
        table.set_status(id(1), Approved, Some("desk ok")).unwrap();

        let history = table.history(id(1));
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].to, Pending);
        assert_eq!(history[0].notes.as_deref(), Some("submitted"));
        assert_eq!(history[1].from, Pending);
        assert_eq!(history[1].to, Approved);
    }
}
