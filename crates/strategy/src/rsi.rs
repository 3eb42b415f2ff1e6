//! RSI mean-reversion evaluator.
//!
//! Oversold closes map to a long call, overbought closes to a long put.
//! Confidence scales linearly with how deep the RSI sits past its band.

use rust_decimal::Decimal;
use sevendte_core::market::{DteWindow, Instrument, MarketSnapshot, OptionRight};
use sevendte_core::signal::{CandidateSignal, Factor, OptionLeg, SignalKind, SignalSource};
use sevendte_core::traits::Strategy;

use crate::indicators;

pub struct RsiStrategy {
    period: usize,
    oversold: f64,
    overbought: f64,
    window: DteWindow,
}

impl RsiStrategy {
    #[must_use]
    pub fn new(window: DteWindow) -> Self {
        Self {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
            window,
        }
    }

    fn signal_for(
        &self,
        _instrument: &Instrument,
        snapshot: &MarketSnapshot,
    ) -> Option<CandidateSignal> {
        let closes = snapshot.closes();
        let rsi = indicators::rsi(&closes, self.period)?;
        let spot = snapshot.latest_close()?;

        let (kind, right, confidence) = if rsi < self.oversold {
            let conf = ((self.oversold - rsi) / self.oversold).clamp(0.0, 1.0);
            (SignalKind::LongCall, OptionRight::Call, conf)
        } else if rsi > self.overbought {
            let conf = ((rsi - self.overbought) / (100.0 - self.overbought)).clamp(0.0, 1.0);
            (SignalKind::LongPut, OptionRight::Put, conf)
        } else {
            return None;
        };

        let quote = snapshot.find_atm(right, spot, &self.window)?;
        let (target, stop) = match kind {
            SignalKind::LongCall => (spot * Decimal::new(105, 2), spot * Decimal::new(97, 2)),
            _ => (spot * Decimal::new(95, 2), spot * Decimal::new(103, 2)),
        };

        let volumes = snapshot.volumes();
        let volume_change = relative_volume_change(&volumes);

        let mut candidate = CandidateSignal::new(
            "rsi",
            kind,
            SignalSource::Technical,
            confidence,
            OptionLeg::from(quote),
        )
        .ok()?
        .with_prices(Some(target), Some(stop));
        candidate.entry_price = Some(spot);

        Some(
            candidate
                .with_factor(Factor::new(
                    "rsi",
                    rsi,
                    0.7,
                    "technical",
                    format!("{}-period RSI at {rsi:.1}", self.period),
                ))
                .with_factor(Factor::new(
                    "volume_change",
                    volume_change,
                    0.3,
                    "technical",
                    format!("volume {:+.1}% vs trailing average", volume_change * 100.0),
                )),
        )
    }
}

/// Latest volume relative to the mean of the preceding bars, as a fraction.
fn relative_volume_change(volumes: &[f64]) -> f64 {
    let Some((last, prior)) = volumes.split_last() else {
        return 0.0;
    };
    if prior.is_empty() {
        return 0.0;
    }
    let mean = prior.iter().sum::<f64>() / prior.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    (last - mean) / mean
}

impl Strategy for RsiStrategy {
    fn name(&self) -> &str {
        "rsi"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Technical
    }

    fn evaluate(&self, instrument: &Instrument, snapshot: &MarketSnapshot) -> Vec<CandidateSignal> {
        self.signal_for(instrument, snapshot)
            .map_or_else(Vec::new, |c| vec![c])
    }
}
