//! Relative valuation evaluator.
//!
//! Compares company ratios against sector averages; metrics deviating by at
//! least 20% vote with fixed weights, and the net score sets direction and
//! confidence.

use rust_decimal::Decimal;
use sevendte_core::market::{DteWindow, Instrument, MarketSnapshot, OptionRight, ValuationMetrics};
use sevendte_core::signal::{CandidateSignal, Factor, OptionLeg, SignalKind, SignalSource};
use sevendte_core::traits::Strategy;

const DEVIATION_THRESHOLD: f64 = 0.2;

const PE_WEIGHT: f64 = 0.3;
const PEG_WEIGHT: f64 = 0.25;
const PB_WEIGHT: f64 = 0.25;
const MARGIN_WEIGHT: f64 = 0.2;

pub struct ValuationStrategy {
    window: DteWindow,
}

impl ValuationStrategy {
    #[must_use]
    pub fn new(window: DteWindow) -> Self {
        Self { window }
    }

    /// Signed vote for one metric: positive when the company looks cheap
    /// against the sector, negative when it looks rich. `higher_is_better`
    /// flips the comparison for quality metrics like profit margin.
    fn vote(
        company: Option<f64>,
        sector: Option<f64>,
        weight: f64,
        higher_is_better: bool,
    ) -> Option<(f64, f64)> {
        let company = company?;
        let sector = sector?;
        if sector <= 0.0 || company <= 0.0 {
            return None;
        }
        let deviation = (company - sector) / sector;
        if deviation.abs() < DEVIATION_THRESHOLD {
            return None;
        }
        let bullish = (deviation > 0.0) == higher_is_better;
        let signed = if bullish { weight } else { -weight };
        Some((signed, deviation))
    }

    fn signal_for(&self, snapshot: &MarketSnapshot) -> Option<CandidateSignal> {
        let fundamentals = snapshot.fundamentals.as_ref()?;
        let company = &fundamentals.metrics;
        let sector = &fundamentals.sector_metrics;

        let votes = [
            ("pe_ratio", Self::vote(company.pe_ratio, sector.pe_ratio, PE_WEIGHT, false)),
            ("peg_ratio", Self::vote(company.peg_ratio, sector.peg_ratio, PEG_WEIGHT, false)),
            (
                "price_to_book",
                Self::vote(company.price_to_book, sector.price_to_book, PB_WEIGHT, false),
            ),
            (
                "profit_margin",
                Self::vote(company.profit_margin, sector.profit_margin, MARGIN_WEIGHT, true),
            ),
        ];

        let score: f64 = votes.iter().filter_map(|(_, v)| v.map(|(s, _)| s)).sum();
        if score == 0.0 {
            return None;
        }

        let spot = snapshot.latest_close()?;
        let bullish = score > 0.0;
        let (kind, right, target, stop) = if bullish {
            (
                SignalKind::LongCall,
                OptionRight::Call,
                spot * Decimal::new(105, 2),
                spot * Decimal::new(97, 2),
            )
        } else {
            (
                SignalKind::LongPut,
                OptionRight::Put,
                spot * Decimal::new(95, 2),
                spot * Decimal::new(103, 2),
            )
        };
        let quote = snapshot.find_atm(right, spot, &self.window)?;
        let confidence = (0.6 + score.abs() * 0.3).min(0.9);

        let mut candidate = CandidateSignal::new(
            "valuation",
            kind,
            SignalSource::Fundamental,
            confidence,
            OptionLeg::from(quote),
        )
        .ok()?
        .with_prices(Some(target), Some(stop));
        candidate.entry_price = Some(spot);

        for (name, vote) in votes {
            if let Some((signed, deviation)) = vote {
                candidate = candidate.with_factor(Factor::new(
                    name,
                    deviation,
                    signed.abs(),
                    "fundamental",
                    format!("{name} deviates {:+.0}% from sector", deviation * 100.0),
                ));
            }
        }
        Some(candidate)
    }
}

impl Strategy for ValuationStrategy {
    fn name(&self) -> &str {
        "valuation"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Fundamental
    }

    fn evaluate(&self, _instrument: &Instrument, snapshot: &MarketSnapshot) -> Vec<CandidateSignal> {
        self.signal_for(snapshot).map_or_else(Vec::new, |c| vec![c])
    }
}
