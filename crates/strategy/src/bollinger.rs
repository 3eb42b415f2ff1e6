//! Bollinger band mean-reversion evaluator.
//!
//! A close crossing out of the band on the latest bar signals reversion
//! toward the middle band, which doubles as the price target.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sevendte_core::market::{DteWindow, Instrument, MarketSnapshot, OptionRight};
use sevendte_core::signal::{CandidateSignal, Factor, OptionLeg, SignalKind, SignalSource};
use sevendte_core::traits::Strategy;

use crate::indicators;

pub struct BollingerStrategy {
    period: usize,
    k: f64,
    window: DteWindow,
}

impl BollingerStrategy {
    #[must_use]
    pub fn new(window: DteWindow) -> Self {
        Self {
            period: 20,
            k: 2.0,
            window,
        }
    }

    fn signal_for(&self, snapshot: &MarketSnapshot) -> Option<CandidateSignal> {
        let closes = snapshot.closes();
        if closes.len() < self.period + 1 {
            return None;
        }
        let band_prev = indicators::bollinger(&closes[..closes.len() - 1], self.period, self.k)?;
        let band_last = indicators::bollinger(&closes, self.period, self.k)?;
        let prev_close = closes[closes.len() - 2];
        let last_close = *closes.last()?;
        let spot = snapshot.latest_close()?;

        let crossed_below = prev_close >= band_prev.lower && last_close < band_last.lower;
        let crossed_above = prev_close <= band_prev.upper && last_close > band_last.upper;

        let (kind, right, stop) = if crossed_below {
            (
                SignalKind::LongCall,
                OptionRight::Call,
                spot * Decimal::new(97, 2),
            )
        } else if crossed_above {
            (
                SignalKind::LongPut,
                OptionRight::Put,
                spot * Decimal::new(103, 2),
            )
        } else {
            return None;
        };

        let quote = snapshot.find_atm(right, spot, &self.window)?;
        // Reversion target is the middle band.
        let target = Decimal::from_f64(band_last.middle)?;

        let percent_b = band_last.percent_b(last_close)?;
        let sigma = indicators::stddev(&closes, self.period)?;
        let volatility = if band_last.middle > 0.0 {
            sigma / band_last.middle
        } else {
            0.0
        };

        let mut candidate = CandidateSignal::new(
            "bollinger",
            kind,
            SignalSource::Technical,
            0.65,
            OptionLeg::from(quote),
        )
        .ok()?
        .with_prices(Some(target), Some(stop));
        candidate.entry_price = Some(spot);

        Some(
            candidate
                .with_factor(Factor::new(
                    "percent_b",
                    percent_b,
                    0.5,
                    "technical",
                    format!("close at {percent_b:.2} of the band range"),
                ))
                .with_factor(Factor::new(
                    "bandwidth",
                    band_last.bandwidth(),
                    0.3,
                    "technical",
                    format!("band width {:.3} of the middle band", band_last.bandwidth()),
                ))
                .with_factor(Factor::new(
                    "volatility",
                    volatility,
                    0.2,
                    "technical",
                    format!("{}-bar deviation {volatility:.3} of price", self.period),
                )),
        )
    }
}

impl Strategy for BollingerStrategy {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Technical
    }

    fn evaluate(&self, _instrument: &Instrument, snapshot: &MarketSnapshot) -> Vec<CandidateSignal> {
        self.signal_for(snapshot).map_or_else(Vec::new, |c| vec![c])
    }
}
