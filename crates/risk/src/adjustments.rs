//! Position-size adjustment factors.
//!
//! Fundamental strength scales a position up, crowding via correlated
//! positions scales it down. Both are pure functions; data access stays in
//! the sizing service.

use sevendte_core::market::Fundamentals;

/// Fundamental scaling factor, nominally in [1.0, 2.0].
///
/// Starts from a neutral score of 0.5, votes on earnings surprise, analyst
/// consensus, and P/E against the sector, then folds in signal confidence.
/// Missing fundamentals mean no adjustment.
#[must_use]
pub fn fundamental_adjustment(fundamentals: Option<&Fundamentals>, confidence: f64) -> f64 {
    let Some(fundamentals) = fundamentals else {
        return 1.0;
    };

    let mut score: f64 = 0.5;

    if let Some(surprise) = fundamentals.latest_surprise_pct() {
        if surprise > 10.0 {
            score += 0.2;
        } else if surprise > 5.0 {
            score += 0.1;
        } else if surprise < -10.0 {
            score -= 0.2;
        } else if surprise < -5.0 {
            score -= 0.1;
        }
    }

    if let Some(ratings) = fundamentals.ratings {
        if ratings.buy_pct > 70.0 {
            score += 0.1;
        } else if ratings.sell_pct > 50.0 {
            score -= 0.1;
        }
    }

    if let (Some(pe), Some(sector_pe)) = (
        fundamentals.metrics.pe_ratio,
        fundamentals.sector_metrics.pe_ratio,
    ) {
        if pe < sector_pe * 0.7 {
            score += 0.1;
        } else if pe > sector_pe * 1.5 {
            score -= 0.1;
        }
    }

    let score = score.clamp(0.0, 1.0);
    let adjustment_factor = 0.5 + score;
    let combined = (adjustment_factor + confidence) / 2.0;
    1.0 + combined
}

/// Correlation scaling factor from pairwise correlations against open
/// positions. Empty input means nothing to be crowded by.
#[must_use]
pub fn correlation_adjustment(correlations: &[f64]) -> f64 {
    if correlations.is_empty() {
        return 1.0;
    }
    let mean_abs =
        correlations.iter().map(|c| c.abs()).sum::<f64>() / correlations.len() as f64;
    correlation_tier(mean_abs)
}

fn correlation_tier(mean_abs: f64) -> f64 {
    if mean_abs > 0.8 {
        0.5
    } else if mean_abs > 0.6 {
        0.75
    } else if mean_abs < 0.3 {
        1.2
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sevendte_core::market::{AnalystRatings, EarningsReport, ValuationMetrics};

    fn fundamentals(surprise: Option<f64>) -> Fundamentals {
        Fundamentals {
            earnings_history: vec![EarningsReport {
                earnings_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                eps_actual: 1.0,
                eps_estimate: 1.0,
                surprise_pct: surprise,
            }],
            ..Fundamentals::default()
        }
    }

    #[test]
    fn no_fundamentals_is_no_adjustment() {
        assert!((fundamental_adjustment(None, 0.9) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn neutral_fundamentals_track_confidence_only() {
        let f = fundamentals(None);
        // score 0.5 -> factor 1.0, combined (1.0 + 0.8) / 2 = 0.9
        assert!((fundamental_adjustment(Some(&f), 0.8) - 1.9).abs() < 1e-9);
    }

    #[test]
    fn strong_surprise_and_ratings_push_score_up() {
        let mut f = fundamentals(Some(15.0));
        f.ratings = Some(AnalystRatings {
            buy_pct: 80.0,
            hold_pct: 15.0,
            sell_pct: 5.0,
        });
        // score 0.5 + 0.2 + 0.1 = 0.8 -> factor 1.3, combined (1.3 + 0.8) / 2
        assert!((fundamental_adjustment(Some(&f), 0.8) - 2.05).abs() < 1e-9);
    }

    #[test]
    fn weak_fundamentals_pull_score_down() {
        let mut f = fundamentals(Some(-12.0));
        f.ratings = Some(AnalystRatings {
            buy_pct: 10.0,
            hold_pct: 30.0,
            sell_pct: 60.0,
        });
        f.metrics = ValuationMetrics {
            pe_ratio: Some(45.0),
            ..ValuationMetrics::default()
        };
        f.sector_metrics = ValuationMetrics {
            pe_ratio: Some(20.0),
            ..ValuationMetrics::default()
        };
        // score 0.5 - 0.2 - 0.1 - 0.1 = 0.1 -> factor 0.6, combined (0.6 + 0.6) / 2
        assert!((fundamental_adjustment(Some(&f), 0.6) - 1.6).abs() < 1e-9);
    }

    #[test]
    fn all_positive_votes_hit_the_ceiling() {
        let mut f = fundamentals(Some(50.0));
        f.ratings = Some(AnalystRatings {
            buy_pct: 90.0,
            hold_pct: 5.0,
            sell_pct: 5.0,
        });
        f.metrics = ValuationMetrics {
            pe_ratio: Some(5.0),
            ..ValuationMetrics::default()
        };
        f.sector_metrics = ValuationMetrics {
            pe_ratio: Some(20.0),
            ..ValuationMetrics::default()
        };
        // All votes positive: score 0.9 -> factor 1.4, combined (1.4 + 1.0) / 2
        let adj = fundamental_adjustment(Some(&f), 1.0);
        assert!((adj - 2.2).abs() < 1e-9);
    }

    #[test]
    fn empty_correlations_mean_no_crowding() {
        assert!((correlation_adjustment(&[]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn correlation_tiers() {
        assert!((correlation_adjustment(&[0.9, 0.85]) - 0.5).abs() < 1e-9);
        assert!((correlation_adjustment(&[0.7, 0.6]) - 0.75).abs() < 1e-9);
        assert!((correlation_adjustment(&[0.1, 0.2]) - 1.2).abs() < 1e-9);
        assert!((correlation_adjustment(&[0.5]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn negative_correlations_count_by_magnitude() {
        assert!((correlation_adjustment(&[-0.9, -0.9]) - 0.5).abs() < 1e-9);
    }
}
