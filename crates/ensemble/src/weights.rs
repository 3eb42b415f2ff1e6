//! Reliability weights for combining strategy candidates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sevendte_core::signal::{CandidateSignal, SignalSource};

/// Per-strategy and per-source reliability weights. Unknown strategies fall
/// back to `default_weight` so a newly registered evaluator participates
/// without a table edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightTable {
    pub strategy_weights: HashMap<String, f64>,
    pub source_weights: HashMap<SignalSource, f64>,
    pub default_weight: f64,
}

impl Default for WeightTable {
    fn default() -> Self {
        let strategy_weights = HashMap::from([
            ("rsi".to_string(), 0.7),
            ("macd".to_string(), 0.8),
            ("bollinger".to_string(), 0.6),
            ("earnings".to_string(), 0.9),
            ("valuation".to_string(), 0.8),
            ("iv_percentile".to_string(), 0.8),
        ]);
        let source_weights = HashMap::from([
            (SignalSource::Technical, 0.7),
            (SignalSource::Fundamental, 0.9),
            (SignalSource::Volatility, 0.8),
        ]);
        Self {
            strategy_weights,
            source_weights,
            default_weight: 0.5,
        }
    }
}

impl WeightTable {
    /// Combined weight for one candidate: the mean of its strategy weight
    /// and its source weight.
    #[must_use]
    pub fn weight_for(&self, candidate: &CandidateSignal) -> f64 {
        let strategy = self
            .strategy_weights
            .get(&candidate.strategy)
            .copied()
            .unwrap_or(self.default_weight);
        let source = self
            .source_weights
            .get(&candidate.source)
            .copied()
            .unwrap_or(self.default_weight);
        (strategy + source) / 2.0
    }
}
