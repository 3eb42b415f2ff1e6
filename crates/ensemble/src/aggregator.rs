//! Direction-bucketed consensus over strategy candidates.
//!
//! Candidates are grouped by directional bias; a bucket that meets the
//! quorum and the confidence threshold collapses into one ensemble
//! candidate. Failed buckets are reported as typed outcomes rather than
//! errors so callers can log and persist the reason.

use rust_decimal::Decimal;
use sevendte_core::config::{CombineMethod, EnsembleConfig};
use sevendte_core::market::{DteWindow, MarketSnapshot, OptionRight};
use sevendte_core::signal::{
    CandidateSignal, Direction, Factor, OptionLeg, SignalKind, SignalSource,
};
use tracing::debug;

use crate::weights::WeightTable;

/// Why a direction bucket produced no ensemble signal.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsensusFailure {
    QuorumNotMet {
        direction: Direction,
        count: usize,
        quorum: usize,
    },
    BelowMinConfidence {
        direction: Direction,
        confidence: f64,
        min_confidence: f64,
    },
    /// Consensus held but no contract inside the expiry window could carry it.
    NoQualifyingOption { direction: Direction },
}

/// Outcome for one direction bucket.
#[derive(Debug, Clone)]
pub enum BucketDecision {
    Emit(CandidateSignal),
    NoConsensus(ConsensusFailure),
}

pub struct Aggregator {
    quorum: usize,
    min_confidence: f64,
    combine: CombineMethod,
    weights: WeightTable,
    window: DteWindow,
}

impl Aggregator {
    #[must_use]
    pub fn new(config: &EnsembleConfig, weights: WeightTable, window: DteWindow) -> Self {
        Self {
            quorum: config.quorum,
            min_confidence: config.min_confidence,
            combine: config.combine,
            weights,
            window,
        }
    }

    /// Aggregates candidates for one instrument. Ensemble-sourced
    /// candidates are never re-consumed; neutral structures are never
    /// bucketed. Returns one decision per non-empty direction bucket.
    #[must_use]
    pub fn aggregate(
        &self,
        candidates: &[CandidateSignal],
        snapshot: &MarketSnapshot,
    ) -> Vec<BucketDecision> {
        let mut decisions = Vec::new();
        for direction in [Direction::Bullish, Direction::Bearish] {
            let members: Vec<&CandidateSignal> = candidates
                .iter()
                .filter(|c| c.source != SignalSource::Ensemble)
                .filter(|c| c.direction() == direction)
                .collect();
            if members.is_empty() {
                continue;
            }
            decisions.push(self.decide_bucket(direction, &members, snapshot));
        }
        decisions
    }

    fn decide_bucket(
        &self,
        direction: Direction,
        members: &[&CandidateSignal],
        snapshot: &MarketSnapshot,
    ) -> BucketDecision {
        if members.len() < self.quorum {
            debug!(?direction, count = members.len(), quorum = self.quorum, "quorum not met");
            return BucketDecision::NoConsensus(ConsensusFailure::QuorumNotMet {
                direction,
                count: members.len(),
                quorum: self.quorum,
            });
        }

        let confidence = self.combined_confidence(members);
        if confidence < self.min_confidence {
            debug!(?direction, confidence, "combined confidence below threshold");
            return BucketDecision::NoConsensus(ConsensusFailure::BelowMinConfidence {
                direction,
                confidence,
                min_confidence: self.min_confidence,
            });
        }

        match self.build_candidate(direction, members, confidence, snapshot) {
            Some(candidate) => BucketDecision::Emit(candidate),
            None => {
                BucketDecision::NoConsensus(ConsensusFailure::NoQualifyingOption { direction })
            }
        }
    }

    fn combined_confidence(&self, members: &[&CandidateSignal]) -> f64 {
        match self.combine {
            CombineMethod::Simple => {
                members.iter().map(|m| m.confidence).sum::<f64>() / members.len() as f64
            }
            CombineMethod::Weighted => {
                let mut weighted = 0.0;
                let mut total = 0.0;
                for m in members {
                    let w = self.weights.weight_for(m);
                    weighted += w * m.confidence;
                    total += w;
                }
                if total == 0.0 {
                    return 0.0;
                }
                weighted / total
            }
        }
    }

    fn build_candidate(
        &self,
        direction: Direction,
        members: &[&CandidateSignal],
        confidence: f64,
        snapshot: &MarketSnapshot,
    ) -> Option<CandidateSignal> {
        let spot = snapshot.latest_close()?;
        let (kind, right) = match direction {
            Direction::Bullish => (SignalKind::LongCall, OptionRight::Call),
            _ => (SignalKind::LongPut, OptionRight::Put),
        };
        let quote = snapshot.find_atm(right, spot, &self.window)?;

        let target = mean_price(members, |m| m.target_price).unwrap_or_else(|| {
            match direction {
                Direction::Bullish => spot * Decimal::new(105, 2),
                _ => spot * Decimal::new(95, 2),
            }
        });
        let stop = mean_price(members, |m| m.stop_price).unwrap_or_else(|| match direction {
            Direction::Bullish => spot * Decimal::new(97, 2),
            _ => spot * Decimal::new(103, 2),
        });

        let mut candidate = CandidateSignal::new(
            "ensemble",
            kind,
            SignalSource::Ensemble,
            confidence.clamp(0.0, 1.0),
            OptionLeg::from(quote),
        )
        .ok()?
        .with_prices(Some(target), Some(stop));
        candidate.entry_price = Some(spot);

        for m in members {
            candidate = candidate.with_factor(Factor::new(
                m.strategy.clone(),
                m.confidence,
                self.weights.weight_for(m),
                "ensemble",
                format!("{} agreed with confidence {:.2}", m.strategy, m.confidence),
            ));
        }
        Some(candidate)
    }
}

/// Mean of the member prices a selector yields, if any member carries one.
fn mean_price<F>(members: &[&CandidateSignal], select: F) -> Option<Decimal>
where
    F: Fn(&CandidateSignal) -> Option<Decimal>,
{
    let prices: Vec<Decimal> = members.iter().filter_map(|m| select(*m)).collect();
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<Decimal>() / Decimal::from(prices.len() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use sevendte_core::market::{Candle, Greeks, OptionQuote};

    fn snapshot(spot: Decimal) -> MarketSnapshot {
        let as_of = Utc.with_ymd_and_hms(2025, 6, 2, 15, 0, 0).unwrap();
        let expiry = as_of.date_naive() + Duration::days(7);
        let chain = [OptionRight::Call, OptionRight::Put]
            .into_iter()
            .map(|right| OptionQuote {
                symbol: format!("AAPL250609{right}"),
                right,
                strike: spot,
                expiry,
                bid: dec!(2.40),
                ask: dec!(2.60),
                implied_volatility: 0.4,
                greeks: Greeks::default(),
            })
            .collect();
        MarketSnapshot {
            as_of,
            candles: vec![Candle {
                timestamp: as_of - Duration::days(1),
                open: spot,
                high: spot,
                low: spot,
                close: spot,
                volume: 1_000_000,
            }],
            chain,
            fundamentals: None,
            volatility: None,
        }
    }

    fn member(strategy: &str, source: SignalSource, kind: SignalKind, conf: f64) -> CandidateSignal {
        CandidateSignal::new(
            strategy,
            kind,
            source,
            conf,
            OptionLeg {
                symbol: "AAPL250609C".to_string(),
                right: OptionRight::Call,
                strike: dec!(100),
                expiry: chrono::NaiveDate::from_ymd_opt(2025, 6, 9).unwrap(),
            },
        )
        .unwrap()
    }

    fn aggregator(combine: CombineMethod) -> Aggregator {
        let config = EnsembleConfig {
            quorum: 2,
            min_confidence: 0.6,
            combine,
        };
        Aggregator::new(&config, WeightTable::default(), DteWindow::default())
    }

    #[test]
    fn weighted_consensus_emits_ensemble_candidate() {
        let candidates = vec![
            member("rsi", SignalSource::Technical, SignalKind::LongCall, 0.8),
            member("macd", SignalSource::Technical, SignalKind::LongCall, 0.7),
            member("earnings", SignalSource::Fundamental, SignalKind::LongCall, 0.9),
        ];
        let decisions = aggregator(CombineMethod::Weighted).aggregate(&candidates, &snapshot(dec!(100)));
        assert_eq!(decisions.len(), 1);
        let BucketDecision::Emit(signal) = &decisions[0] else {
            panic!("expected emission");
        };
        assert_eq!(signal.strategy, "ensemble");
        assert_eq!(signal.source, SignalSource::Ensemble);
        assert_eq!(signal.kind, SignalKind::LongCall);
        // (0.7*0.8 + 0.75*0.7 + 0.9*0.9) / (0.7 + 0.75 + 0.9)
        assert!((signal.confidence - 1.895 / 2.35).abs() < 1e-9);
        assert_eq!(signal.factors.len(), 3);
    }

    #[test]
    fn simple_average_is_the_arithmetic_mean() {
        let candidates = vec![
            member("rsi", SignalSource::Technical, SignalKind::LongCall, 0.7),
            member("macd", SignalSource::Technical, SignalKind::LongCall, 0.8),
        ];
        let decisions = aggregator(CombineMethod::Simple).aggregate(&candidates, &snapshot(dec!(100)));
        let BucketDecision::Emit(signal) = &decisions[0] else {
            panic!("expected emission");
        };
        assert_eq!(signal.kind, SignalKind::LongCall);
        assert!((signal.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn single_voice_fails_quorum() {
        let candidates = vec![member(
            "rsi",
            SignalSource::Technical,
            SignalKind::LongCall,
            0.9,
        )];
        let decisions = aggregator(CombineMethod::Simple).aggregate(&candidates, &snapshot(dec!(100)));
        assert_eq!(decisions.len(), 1);
        let BucketDecision::NoConsensus(failure) = &decisions[0] else {
            panic!("expected no consensus");
        };
        assert_eq!(
            *failure,
            ConsensusFailure::QuorumNotMet {
                direction: Direction::Bullish,
                count: 1,
                quorum: 2,
            }
        );
    }

    #[test]
    fn lukewarm_agreement_fails_confidence_threshold() {
        let candidates = vec![
            member("rsi", SignalSource::Technical, SignalKind::LongCall, 0.55),
            member("macd", SignalSource::Technical, SignalKind::LongCall, 0.55),
        ];
        let decisions = aggregator(CombineMethod::Simple).aggregate(&candidates, &snapshot(dec!(100)));
        let BucketDecision::NoConsensus(ConsensusFailure::BelowMinConfidence {
            confidence, ..
        }) = &decisions[0]
        else {
            panic!("expected confidence failure");
        };
        assert!((confidence - 0.55).abs() < 1e-9);
    }

    #[test]
    fn equal_weights_reduce_weighted_to_simple_mean() {
        // Two members of the same strategy and source carry the same weight,
        // so the weighted mean collapses to the arithmetic mean.
        let candidates = vec![
            member("rsi", SignalSource::Technical, SignalKind::LongCall, 0.7),
            member("rsi", SignalSource::Technical, SignalKind::LongCall, 0.9),
        ];
        let snap = snapshot(dec!(100));
        let weighted = aggregator(CombineMethod::Weighted).aggregate(&candidates, &snap);
        let simple = aggregator(CombineMethod::Simple).aggregate(&candidates, &snap);
        let (BucketDecision::Emit(w), BucketDecision::Emit(s)) = (&weighted[0], &simple[0]) else {
            panic!("expected emissions");
        };
        assert!((w.confidence - s.confidence).abs() < 1e-9);
        assert!((w.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn buckets_are_independent_per_direction() {
        let candidates = vec![
            member("rsi", SignalSource::Technical, SignalKind::LongCall, 0.8),
            member("macd", SignalSource::Technical, SignalKind::LongCall, 0.8),
            member("valuation", SignalSource::Fundamental, SignalKind::LongPut, 0.9),
        ];
        let decisions = aggregator(CombineMethod::Simple).aggregate(&candidates, &snapshot(dec!(100)));
        assert_eq!(decisions.len(), 2);
        assert!(matches!(&decisions[0], BucketDecision::Emit(s) if s.kind == SignalKind::LongCall));
        assert!(matches!(
            &decisions[1],
            BucketDecision::NoConsensus(ConsensusFailure::QuorumNotMet {
                direction: Direction::Bearish,
                ..
            })
        ));
    }

    #[test]
    fn ensemble_candidates_are_never_re_consumed() {
        let candidates = vec![
            member("ensemble", SignalSource::Ensemble, SignalKind::LongCall, 0.9),
            member("rsi", SignalSource::Technical, SignalKind::LongCall, 0.9),
        ];
        let decisions = aggregator(CombineMethod::Simple).aggregate(&candidates, &snapshot(dec!(100)));
        // Only the rsi member counts, so the bucket fails quorum.
        assert!(matches!(
            &decisions[0],
            BucketDecision::NoConsensus(ConsensusFailure::QuorumNotMet { count: 1, .. })
        ));
    }

    #[test]
    fn neutral_structures_are_not_bucketed() {
        let candidates = vec![
            member("a", SignalSource::Volatility, SignalKind::IronCondor, 0.9),
            member("b", SignalSource::Volatility, SignalKind::Butterfly, 0.9),
        ];
        let decisions = aggregator(CombineMethod::Simple).aggregate(&candidates, &snapshot(dec!(100)));
        assert!(decisions.is_empty());
    }

    #[test]
    fn member_prices_average_into_ensemble_prices() {
        let mut a = member("rsi", SignalSource::Technical, SignalKind::LongCall, 0.8);
        a = a.with_prices(Some(dec!(110)), Some(dec!(95)));
        let mut b = member("macd", SignalSource::Technical, SignalKind::LongCall, 0.8);
        b = b.with_prices(Some(dec!(106)), Some(dec!(97)));
        let decisions =
            aggregator(CombineMethod::Simple).aggregate(&[a, b], &snapshot(dec!(100)));
        let BucketDecision::Emit(signal) = &decisions[0] else {
            panic!("expected emission");
        };
        assert_eq!(signal.target_price, Some(dec!(108)));
        assert_eq!(signal.stop_price, Some(dec!(96)));
    }

    #[test]
    fn missing_member_prices_fall_back_to_spot_offsets() {
        let candidates = vec![
            member("rsi", SignalSource::Technical, SignalKind::LongPut, 0.8),
            member("macd", SignalSource::Technical, SignalKind::LongPut, 0.8),
        ];
        let decisions = aggregator(CombineMethod::Simple).aggregate(&candidates, &snapshot(dec!(100)));
        let BucketDecision::Emit(signal) = &decisions[0] else {
            panic!("expected emission");
        };
        // Bearish fallback: target 5% below spot, stop 3% above.
        assert_eq!(signal.target_price, Some(dec!(95)));
        assert_eq!(signal.stop_price, Some(dec!(103)));
    }

    #[test]
    fn empty_chain_reports_no_qualifying_option() {
        let candidates = vec![
            member("rsi", SignalSource::Technical, SignalKind::LongCall, 0.8),
            member("macd", SignalSource::Technical, SignalKind::LongCall, 0.8),
        ];
        let mut snap = snapshot(dec!(100));
        snap.chain.clear();
        let decisions = aggregator(CombineMethod::Simple).aggregate(&candidates, &snap);
        assert!(matches!(
            &decisions[0],
            BucketDecision::NoConsensus(ConsensusFailure::NoQualifyingOption {
                direction: Direction::Bullish
            })
        ));
    }
}
