//! Error taxonomy for the decision pipeline.
//!
//! Only genuinely exceptional conditions are errors. A quorum that is not
//! met or a confidence below threshold is a valid negative outcome and is
//! modeled as data by the ensemble crate, not as a variant here.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::signal::SignalStatus;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or malformed snapshot data. Evaluators log and skip the
    /// instrument; they never abort the cycle.
    #[error("invalid market data for {symbol}: {reason}")]
    Input { symbol: String, reason: String },

    /// The sizer cannot place any position without breaching allocation
    /// limits. Surfaced to the caller, never silently degraded or retried.
    #[error("allocation exhausted for {symbol}: headroom {headroom} below minimum {minimum}")]
    AllocationExhausted {
        symbol: String,
        headroom: Decimal,
        minimum: Decimal,
    },

    /// Persistence failure. Propagated; retry policy belongs to the
    /// repository implementation, not the core.
    #[error("repository failure")]
    Repository(#[source] anyhow::Error),

    /// Illegal signal status transition.
    #[error("invalid signal transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: SignalStatus,
        to: SignalStatus,
    },
}

impl EngineError {
    /// Wraps an arbitrary repository error.
    #[must_use]
    pub fn repository(err: impl Into<anyhow::Error>) -> Self {
        Self::Repository(err.into())
    }
}
