//! Evaluation cycle orchestration.
//!
//! One cycle fans out across the instrument basket, one task per
//! instrument: snapshot, strategy evaluation, consensus, persistence, and
//! sizing of whatever the ensemble emits. A failure on one instrument
//! never takes down the cycle; it is reported and the rest proceed.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sevendte_core::config::{EngineConfig, SizingMethod};
use sevendte_core::error::EngineError;
use sevendte_core::market::{DteWindow, Instrument, MarketSnapshot, OptionQuote};
use sevendte_core::signal::{CandidateSignal, Signal, SignalStatus, TimeFrame};
use sevendte_core::traits::{
    AccountRepository, CorrelationProvider, MarketSnapshotProvider, SignalRepository,
};
use sevendte_ensemble::{Aggregator, BucketDecision, ConsensusFailure, WeightTable};
use sevendte_exits::{ExitCheck, ExitPlanner};
use sevendte_risk::{MinimumBetPolicy, PositionSize, RiskBudgetPolicy, Sizer, SizingPolicy};
use sevendte_strategy::StrategyRegistry;
use tracing::{error, info, warn};

/// Everything one instrument produced in a cycle.
#[derive(Debug)]
pub struct InstrumentOutcome {
    pub symbol: String,
    pub strategy_signal_ids: Vec<i64>,
    pub ensemble_signal_ids: Vec<i64>,
    pub rejections: Vec<ConsensusFailure>,
    pub sized: Vec<PositionSize>,
    /// Sizing attempts that were refused, e.g. exhausted allocation.
    pub sizing_failures: Vec<String>,
}

#[derive(Debug)]
pub struct CycleFailure {
    pub symbol: String,
    pub error: String,
}

#[derive(Debug)]
pub struct CycleReport {
    pub outcomes: Vec<InstrumentOutcome>,
    pub failures: Vec<CycleFailure>,
}

impl CycleReport {
    #[must_use]
    pub fn ensemble_signal_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.ensemble_signal_ids.len()).sum()
    }
}

pub struct DecisionEngine {
    config: EngineConfig,
    registry: StrategyRegistry,
    aggregator: Aggregator,
    planner: ExitPlanner,
    sizer: Sizer,
    snapshots: Arc<dyn MarketSnapshotProvider>,
    signals: Arc<dyn SignalRepository>,
    account: Arc<dyn AccountRepository>,
    account_id: i64,
}

impl DecisionEngine {
    #[must_use]
    pub fn new(
        config: EngineConfig,
        snapshots: Arc<dyn MarketSnapshotProvider>,
        signals: Arc<dyn SignalRepository>,
        account: Arc<dyn AccountRepository>,
        correlation: Arc<dyn CorrelationProvider>,
        account_id: i64,
    ) -> Self {
        let window = DteWindow {
            target_days: config.evaluation.target_dte_days,
            tolerance_days: config.evaluation.dte_tolerance_days,
        };
        let registry = StrategyRegistry::with_defaults(window);
        let aggregator = Aggregator::new(&config.ensemble, WeightTable::default(), window);
        let policy: Box<dyn SizingPolicy> = match config.sizing.policy {
            SizingMethod::MinimumBet => Box::new(MinimumBetPolicy::new(config.sizing.clone())),
            SizingMethod::RiskBudget => Box::new(RiskBudgetPolicy),
        };
        let sizer = Sizer::new(Arc::clone(&account), correlation, policy);
        let planner = ExitPlanner::new(config.exits.clone());
        Self {
            config,
            registry,
            aggregator,
            planner,
            sizer,
            snapshots,
            signals,
            account,
            account_id,
        }
    }

    /// Runs one evaluation cycle over the basket, one task per instrument.
    pub async fn run_cycle(self: &Arc<Self>, instruments: &[Instrument]) -> CycleReport {
        let mut handles = Vec::with_capacity(instruments.len());
        for instrument in instruments {
            let engine = Arc::clone(self);
            let instrument = instrument.clone();
            let symbol = instrument.symbol.clone();
            handles.push((
                symbol,
                tokio::spawn(async move { engine.process_instrument(&instrument).await }),
            ));
        }

        let mut outcomes = Vec::new();
        let mut failures = Vec::new();
        for (symbol, handle) in handles {
            match handle.await {
                Ok(Ok(outcome)) => outcomes.push(outcome),
                Ok(Err(err)) => {
                    error!(symbol = %symbol, error = %err, "instrument processing failed");
                    failures.push(CycleFailure {
                        symbol,
                        error: err.to_string(),
                    });
                }
                Err(join_err) => {
                    error!(symbol = %symbol, error = %join_err, "instrument task panicked");
                    failures.push(CycleFailure {
                        symbol,
                        error: join_err.to_string(),
                    });
                }
            }
        }

        info!(
            instruments = outcomes.len() + failures.len(),
            ensemble_signals = outcomes
                .iter()
                .map(|o| o.ensemble_signal_ids.len())
                .sum::<usize>(),
            failures = failures.len(),
            "cycle complete"
        );
        CycleReport { outcomes, failures }
    }

    async fn process_instrument(
        &self,
        instrument: &Instrument,
    ) -> Result<InstrumentOutcome, EngineError> {
        let snapshot = self
            .snapshots
            .get_snapshot(instrument)
            .await
            .map_err(EngineError::repository)?;

        let candidates = self.registry.evaluate_all(instrument, &snapshot);
        let mut strategy_signal_ids = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let signal = self
                .persist_candidate(&instrument.symbol, candidate, snapshot.as_of)
                .await?;
            strategy_signal_ids.push(signal.id);
        }

        let decisions = self.aggregator.aggregate(&candidates, &snapshot);
        let mut ensemble_signal_ids = Vec::new();
        let mut rejections = Vec::new();
        let mut sized = Vec::new();
        let mut sizing_failures = Vec::new();
        for decision in decisions {
            match decision {
                BucketDecision::Emit(candidate) => {
                    let signal = self
                        .persist_candidate(&instrument.symbol, &candidate, snapshot.as_of)
                        .await?;
                    ensemble_signal_ids.push(signal.id);
                    match self.size_emitted(&signal, &snapshot).await {
                        Ok(size) => sized.push(size),
                        Err(err) => {
                            warn!(symbol = %instrument.symbol, error = %err, "sizing refused");
                            sizing_failures.push(err.to_string());
                        }
                    }
                }
                BucketDecision::NoConsensus(failure) => rejections.push(failure),
            }
        }

        Ok(InstrumentOutcome {
            symbol: instrument.symbol.clone(),
            strategy_signal_ids,
            ensemble_signal_ids,
            rejections,
            sized,
            sizing_failures,
        })
    }

    /// Persists a candidate and its factors, stamping the configured time
    /// frame. Both per-strategy and ensemble signals go through here so the
    /// audit trail keeps every voice, not just the consensus.
    async fn persist_candidate(
        &self,
        symbol: &str,
        candidate: &CandidateSignal,
        as_of: DateTime<Utc>,
    ) -> Result<Signal, EngineError> {
        let mut signal = Signal::from_candidate(0, symbol, candidate.clone(), as_of);
        signal.time_frame = TimeFrame(self.config.evaluation.time_frame_days);
        let id = self
            .signals
            .save(&signal)
            .await
            .map_err(EngineError::repository)?;
        signal.id = id;
        for factor in &signal.factors {
            self.signals
                .save_factor(id, factor)
                .await
                .map_err(EngineError::repository)?;
        }
        Ok(signal)
    }

    async fn size_emitted(
        &self,
        signal: &Signal,
        snapshot: &MarketSnapshot,
    ) -> Result<PositionSize, EngineError> {
        let price = leg_mid_price(snapshot, &signal.leg.symbol).ok_or_else(|| {
            EngineError::Input {
                symbol: signal.symbol.clone(),
                reason: format!("no quote for leg {}", signal.leg.symbol),
            }
        })?;
        self.sizer
            .size_signal(self.account_id, signal, price, snapshot.fundamentals.as_ref())
            .await
    }

    /// Expires persisted signals whose time frame has elapsed. Returns the
    /// number of signals transitioned.
    pub async fn sweep_expired(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> Result<usize, EngineError> {
        // Fetch by status rather than age so signals left pending across a
        // scheduler gap still get expired.
        let signals = self
            .signals
            .find_unresolved(symbol)
            .await
            .map_err(EngineError::repository)?;

        let mut expired = 0;
        for mut signal in signals {
            if signal.expire_if_elapsed(now) {
                self.signals
                    .update_status(signal.id, SignalStatus::Expired)
                    .await
                    .map_err(EngineError::repository)?;
                expired += 1;
            }
        }
        if expired > 0 {
            info!(symbol, expired, "expired stale signals");
        }
        Ok(expired)
    }

    /// Runs the exit planner over every open position at its last known
    /// price. Pure review; applying the recommendations is the caller's
    /// decision.
    pub async fn review_positions(&self, today: NaiveDate) -> Result<Vec<ExitCheck>, EngineError> {
        let positions = self
            .account
            .get_open_positions(self.account_id)
            .await
            .map_err(EngineError::repository)?;
        Ok(positions
            .iter()
            .map(|p| self.planner.check(p, p.current_price, today))
            .collect())
    }
}

fn leg_mid_price(snapshot: &MarketSnapshot, leg_symbol: &str) -> Option<Decimal> {
    snapshot
        .chain
        .iter()
        .find(|q| q.symbol == leg_symbol)
        .map(OptionQuote::mid_price)
}
