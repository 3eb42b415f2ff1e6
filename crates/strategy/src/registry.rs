//! Strategy registry: owns the evaluator set and runs them over a snapshot.

use sevendte_core::market::{DteWindow, Instrument, MarketSnapshot};
use sevendte_core::signal::CandidateSignal;
use sevendte_core::traits::Strategy;
use tracing::debug;

use crate::bollinger::BollingerStrategy;
use crate::earnings::EarningsStrategy;
use crate::iv_percentile::IvPercentileStrategy;
use crate::macd::MacdStrategy;
use crate::rsi::RsiStrategy;
use crate::valuation::ValuationStrategy;

#[derive(Default)]
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn Strategy>>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard evaluator set, all selecting legs from
    /// the same expiry window.
    #[must_use]
    pub fn with_defaults(window: DteWindow) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(RsiStrategy::new(window)));
        registry.register(Box::new(MacdStrategy::new(window)));
        registry.register(Box::new(BollingerStrategy::new(window)));
        registry.register(Box::new(EarningsStrategy::new(window)));
        registry.register(Box::new(ValuationStrategy::new(window)));
        registry.register(Box::new(IvPercentileStrategy::new(window)));
        registry
    }

    pub fn register(&mut self, strategy: Box<dyn Strategy>) {
        self.strategies.push(strategy);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Runs every registered evaluator over the snapshot and collects their
    /// candidates. Evaluators abstain independently; an empty result means
    /// no strategy saw an edge.
    #[must_use]
    pub fn evaluate_all(
        &self,
        instrument: &Instrument,
        snapshot: &MarketSnapshot,
    ) -> Vec<CandidateSignal> {
        let mut out = Vec::new();
        for strategy in &self.strategies {
            let candidates = strategy.evaluate(instrument, snapshot);
            debug!(
                strategy = strategy.name(),
                symbol = %instrument.symbol,
                count = candidates.len(),
                "strategy evaluated"
            );
            out.extend(candidates);
        }
        out
    }
}
