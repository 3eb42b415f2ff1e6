//! Implied-volatility percentile evaluator.
//!
//! Buys premium when IV sits in the bottom quintile of its trailing
//! distribution and positions defensively in the top quintile.

use rust_decimal::Decimal;
use sevendte_core::market::{DteWindow, Instrument, MarketSnapshot, OptionRight};
use sevendte_core::signal::{CandidateSignal, Factor, OptionLeg, SignalKind, SignalSource};
use sevendte_core::traits::Strategy;

const LOW_PERCENTILE: f64 = 20.0;
const HIGH_PERCENTILE: f64 = 80.0;

pub struct IvPercentileStrategy {
    window: DteWindow,
}

impl IvPercentileStrategy {
    #[must_use]
    pub fn new(window: DteWindow) -> Self {
        Self { window }
    }

    fn signal_for(&self, snapshot: &MarketSnapshot) -> Option<CandidateSignal> {
        let volatility = snapshot.volatility.as_ref()?;
        let percentile = volatility.iv_percentile;

        let (kind, right, confidence) = if percentile < LOW_PERCENTILE {
            let conf = 0.6 + (LOW_PERCENTILE - percentile) / LOW_PERCENTILE * 0.3;
            (SignalKind::LongCall, OptionRight::Call, conf)
        } else if percentile > HIGH_PERCENTILE {
            let conf = 0.6 + (percentile - HIGH_PERCENTILE) / (100.0 - HIGH_PERCENTILE) * 0.3;
            (SignalKind::LongPut, OptionRight::Put, conf)
        } else {
            return None;
        };

        let spot = snapshot.latest_close()?;
        let quote = snapshot.find_atm(right, spot, &self.window)?;
        let (target, stop) = match kind {
            SignalKind::LongCall => (spot * Decimal::new(105, 2), spot * Decimal::new(97, 2)),
            _ => (spot * Decimal::new(95, 2), spot * Decimal::new(103, 2)),
        };

        let mut candidate = CandidateSignal::new(
            "iv_percentile",
            kind,
            SignalSource::Volatility,
            confidence.clamp(0.0, 1.0),
            OptionLeg::from(quote),
        )
        .ok()?
        .with_prices(Some(target), Some(stop));
        candidate.entry_price = Some(spot);

        Some(candidate.with_factor(Factor::new(
            "iv_percentile",
            percentile,
            1.0,
            "volatility",
            format!("IV at the {percentile:.0}th percentile of its trailing year"),
        )))
    }
}

impl Strategy for IvPercentileStrategy {
    fn name(&self) -> &str {
        "iv_percentile"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Volatility
    }

    fn evaluate(&self, _instrument: &Instrument, snapshot: &MarketSnapshot) -> Vec<CandidateSignal> {
        self.signal_for(snapshot).map_or_else(Vec::new, |c| vec![c])
    }
}
