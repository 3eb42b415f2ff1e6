//! MACD crossover evaluator.
//!
//! Fires only on a strict signal-line crossover between the last two bars;
//! an already-crossed state is not an entry.

use rust_decimal::Decimal;
use sevendte_core::market::{DteWindow, Instrument, MarketSnapshot, OptionRight};
use sevendte_core::signal::{CandidateSignal, Factor, OptionLeg, SignalKind, SignalSource};
use sevendte_core::traits::Strategy;

use crate::indicators;

pub struct MacdStrategy {
    fast: usize,
    slow: usize,
    signal: usize,
    window: DteWindow,
}

impl MacdStrategy {
    #[must_use]
    pub fn new(window: DteWindow) -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
            window,
        }
    }

    fn signal_for(&self, snapshot: &MarketSnapshot) -> Option<CandidateSignal> {
        let closes = snapshot.closes();
        let points = indicators::macd(&closes, self.fast, self.slow, self.signal);
        let [prev, last] = points.last_chunk::<2>()?;
        let spot = snapshot.latest_close()?;

        let crossed_up = prev.macd <= prev.signal && last.macd > last.signal;
        let crossed_down = prev.macd >= prev.signal && last.macd < last.signal;

        let (kind, right) = if crossed_up {
            (SignalKind::LongCall, OptionRight::Call)
        } else if crossed_down {
            (SignalKind::LongPut, OptionRight::Put)
        } else {
            return None;
        };

        let quote = snapshot.find_atm(right, spot, &self.window)?;
        let (target, stop) = if crossed_up {
            (spot * Decimal::new(105, 2), spot * Decimal::new(97, 2))
        } else {
            (spot * Decimal::new(95, 2), spot * Decimal::new(103, 2))
        };

        let mut candidate = CandidateSignal::new(
            "macd",
            kind,
            SignalSource::Technical,
            0.7,
            OptionLeg::from(quote),
        )
        .ok()?
        .with_prices(Some(target), Some(stop));
        candidate.entry_price = Some(spot);

        Some(
            candidate
                .with_factor(Factor::new(
                    "macd_crossover",
                    last.macd - last.signal,
                    0.6,
                    "technical",
                    if crossed_up {
                        "MACD crossed above its signal line"
                    } else {
                        "MACD crossed below its signal line"
                    },
                ))
                .with_factor(Factor::new(
                    "histogram",
                    last.histogram,
                    0.4,
                    "technical",
                    format!("MACD histogram at {:.4}", last.histogram),
                )),
        )
    }
}

impl Strategy for MacdStrategy {
    fn name(&self) -> &str {
        "macd"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Technical
    }

    fn evaluate(&self, _instrument: &Instrument, snapshot: &MarketSnapshot) -> Vec<CandidateSignal> {
        self.signal_for(snapshot).map_or_else(Vec::new, |c| vec![c])
    }
}
