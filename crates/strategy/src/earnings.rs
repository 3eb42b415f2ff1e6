//! Earnings-driven evaluator with two disjoint windows.
//!
//! Ahead of a report (3 to 14 days out) it positions along the surprise
//! trend of recent quarters. Just after a report (up to 2 days) it follows
//! a large surprise directly.

use rust_decimal::Decimal;
use sevendte_core::market::{DteWindow, Fundamentals, Instrument, MarketSnapshot, OptionRight};
use sevendte_core::signal::{CandidateSignal, Factor, OptionLeg, SignalKind, SignalSource};
use sevendte_core::traits::Strategy;

const PRE_WINDOW_MIN_DAYS: i64 = 3;
const PRE_WINDOW_MAX_DAYS: i64 = 14;
const POST_WINDOW_MAX_DAYS: i64 = 2;
const TREND_THRESHOLD: f64 = 0.2;
const SURPRISE_THRESHOLD_PCT: f64 = 10.0;

pub struct EarningsStrategy {
    window: DteWindow,
}

impl EarningsStrategy {
    #[must_use]
    pub fn new(window: DteWindow) -> Self {
        Self { window }
    }

    /// Surprise trend: latest surprise relative to the mean of the prior
    /// quarters, scaled to a fraction and clamped to [-1, 1].
    fn surprise_trend(fundamentals: &Fundamentals) -> Option<f64> {
        let surprises: Vec<f64> = fundamentals
            .earnings_history
            .iter()
            .filter_map(|r| r.surprise_pct)
            .collect();
        let (recent, prior) = surprises.split_last()?;
        if prior.is_empty() {
            return None;
        }
        let prior_mean = prior.iter().sum::<f64>() / prior.len() as f64;
        Some(((recent - prior_mean) / 100.0).clamp(-1.0, 1.0))
    }

    fn pre_earnings(
        &self,
        snapshot: &MarketSnapshot,
        fundamentals: &Fundamentals,
    ) -> Option<CandidateSignal> {
        let today = snapshot.as_of.date_naive();
        let next = fundamentals.next_earnings?;
        let days_until = (next - today).num_days();
        if !(PRE_WINDOW_MIN_DAYS..=PRE_WINDOW_MAX_DAYS).contains(&days_until) {
            return None;
        }

        let trend = Self::surprise_trend(fundamentals)?;
        if trend.abs() <= TREND_THRESHOLD {
            return None;
        }
        let spot = snapshot.latest_close()?;
        let bullish = trend > 0.0;
        let (kind, right, target, stop) = if bullish {
            (
                SignalKind::LongCall,
                OptionRight::Call,
                spot * Decimal::new(107, 2),
                spot * Decimal::new(95, 2),
            )
        } else {
            (
                SignalKind::LongPut,
                OptionRight::Put,
                spot * Decimal::new(93, 2),
                spot * Decimal::new(105, 2),
            )
        };
        let quote = snapshot.find_atm(right, spot, &self.window)?;
        let confidence = (0.6 + trend.abs() * 0.3).clamp(0.0, 1.0);

        let mut candidate = CandidateSignal::new(
            "earnings",
            kind,
            SignalSource::Fundamental,
            confidence,
            OptionLeg::from(quote),
        )
        .ok()?
        .with_prices(Some(target), Some(stop));
        candidate.entry_price = Some(spot);

        Some(
            candidate
                .with_factor(Factor::new(
                    "surprise_trend",
                    trend,
                    0.7,
                    "fundamental",
                    format!("surprise trend {trend:+.2} vs prior quarters"),
                ))
                .with_factor(Factor::new(
                    "days_to_earnings",
                    days_until as f64,
                    0.3,
                    "fundamental",
                    format!("earnings report in {days_until} days"),
                )),
        )
    }

    fn post_earnings(
        &self,
        snapshot: &MarketSnapshot,
        fundamentals: &Fundamentals,
    ) -> Option<CandidateSignal> {
        let today = snapshot.as_of.date_naive();
        let report = fundamentals.earnings_history.iter().rev().find(|r| {
            let age = (today - r.earnings_date).num_days();
            (0..=POST_WINDOW_MAX_DAYS).contains(&age)
        })?;
        let surprise = report.surprise_pct?;
        if surprise.abs() <= SURPRISE_THRESHOLD_PCT {
            return None;
        }

        let spot = snapshot.latest_close()?;
        let bullish = surprise > 0.0;
        let (kind, right, target, stop) = if bullish {
            (
                SignalKind::LongCall,
                OptionRight::Call,
                spot * Decimal::new(108, 2),
                spot * Decimal::new(96, 2),
            )
        } else {
            (
                SignalKind::LongPut,
                OptionRight::Put,
                spot * Decimal::new(92, 2),
                spot * Decimal::new(104, 2),
            )
        };
        let quote = snapshot.find_atm(right, spot, &self.window)?;
        let confidence = (0.7 + surprise.abs().min(30.0) / 100.0).clamp(0.0, 1.0);

        let mut candidate = CandidateSignal::new(
            "earnings",
            kind,
            SignalSource::Fundamental,
            confidence,
            OptionLeg::from(quote),
        )
        .ok()?
        .with_prices(Some(target), Some(stop));
        candidate.entry_price = Some(spot);

        Some(candidate.with_factor(Factor::new(
            "earnings_surprise",
            surprise,
            1.0,
            "fundamental",
            format!("EPS surprise {surprise:+.1}% on {}", report.earnings_date),
        )))
    }
}

impl Strategy for EarningsStrategy {
    fn name(&self) -> &str {
        "earnings"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Fundamental
    }

    fn evaluate(&self, _instrument: &Instrument, snapshot: &MarketSnapshot) -> Vec<CandidateSignal> {
        let Some(fundamentals) = snapshot.fundamentals.as_ref() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if let Some(c) = self.pre_earnings(snapshot, fundamentals) {
            out.push(c);
        }
        if let Some(c) = self.post_earnings(snapshot, fundamentals) {
            out.push(c);
        }
        out
    }
}
