//! Seams between the decision pipeline and its collaborators.
//!
//! The REST layer, persistence, market-data ingestion, and the scheduler all
//! live behind these traits. The core never performs blocking I/O directly;
//! lifecycle of the concrete clients is owned by the caller.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::market::{Instrument, MarketSnapshot};
use crate::position::{Position, RiskProfile};
use crate::signal::{CandidateSignal, Factor, Signal, SignalSource, SignalStatus};

/// Read-only source of immutable market snapshots.
#[async_trait]
pub trait MarketSnapshotProvider: Send + Sync {
    async fn get_snapshot(&self, instrument: &Instrument) -> Result<MarketSnapshot>;
}

/// Persistence for signals and their explanatory factors.
#[async_trait]
pub trait SignalRepository: Send + Sync {
    /// Persists a signal and returns its assigned id.
    async fn save(&self, signal: &Signal) -> Result<i64>;

    async fn save_factor(&self, signal_id: i64, factor: &Factor) -> Result<()>;

    async fn find_recent(&self, symbol: &str, since: DateTime<Utc>) -> Result<Vec<Signal>>;

    /// Signals for `symbol` not yet in a terminal status, regardless of age.
    /// The expiry sweep relies on this so a pending signal can never outlive
    /// its time frame unnoticed.
    async fn find_unresolved(&self, symbol: &str) -> Result<Vec<Signal>>;

    async fn update_status(&self, signal_id: i64, status: SignalStatus) -> Result<()>;
}

/// Account state accessors consumed by the position sizer.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn get_risk_profile(&self, account_id: i64) -> Result<RiskProfile>;

    async fn get_portfolio_value(&self, account_id: i64) -> Result<Decimal>;

    async fn get_open_positions(&self, account_id: i64) -> Result<Vec<Position>>;

    /// Atomically checks headroom for `symbol` and reserves `amount` against
    /// it. Returns false when the reservation would breach the allocation
    /// limit. This is the single point that closes the check-then-act race
    /// between concurrent sizing requests for the same account.
    async fn reserve_allocation(&self, account_id: i64, symbol: &str, amount: Decimal)
        -> Result<bool>;
}

/// Pairwise return correlations between basket symbols.
#[async_trait]
pub trait CorrelationProvider: Send + Sync {
    /// Correlation in [-1, 1], or None when no estimate exists. Callers
    /// treat None as neutral rather than guessing.
    async fn get_correlation(&self, symbol_a: &str, symbol_b: &str) -> Result<Option<f64>>;
}

/// A strategy evaluator: a pure function from an instrument and its snapshot
/// to zero or more candidate signals.
///
/// Evaluators abstain (return an empty vec) on missing or malformed snapshot
/// data and when no qualifying option contract exists. They never panic and
/// never perform I/O.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    fn source(&self) -> SignalSource;

    fn evaluate(&self, instrument: &Instrument, snapshot: &MarketSnapshot) -> Vec<CandidateSignal>;
}
