use crate::domain::LifecycleStatus;
use thiserror::Error;

/// Errors reported by the ledger engine.
///
/// Absence (no matching Buy, no benchmark at any tier) is never an error;
/// those outcomes are `Option` and callers check them before averaging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("field `{field}` must be non-negative, got {value}")]
    NegativeField { field: &'static str, value: String },

    #[error("invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition {
        from: LifecycleStatus,
        to: LifecycleStatus,
    },

    #[error("no further transitions from {0}")]
    NoFurtherTransitions(LifecycleStatus),
}
