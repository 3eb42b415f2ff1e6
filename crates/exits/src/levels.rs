//! Stop and target levels.
//!
//! Stops tighten as expiry approaches: the full risk distance applies at
//! seven or more days out and shrinks linearly below that. Targets are set
//! from the stop distance at a risk-reward ratio that re-tiers as
//! unrealized profit grows, so a winner is given room to run.

use rust_decimal::Decimal;
use sevendte_core::config::RiskLevel;

/// Fraction of entry price risked at full distance.
#[must_use]
pub fn risk_fraction(level: RiskLevel) -> Decimal {
    match level {
        RiskLevel::Low => Decimal::new(10, 2),
        RiskLevel::Normal => Decimal::new(15, 2),
        RiskLevel::High => Decimal::new(20, 2),
    }
}

/// Time scaling for the stop distance: `min(1, dte / 7)`, floored at zero
/// for already-expired legs.
#[must_use]
pub fn dte_factor(days_to_expiry: i64) -> Decimal {
    if days_to_expiry >= 7 {
        return Decimal::ONE;
    }
    if days_to_expiry <= 0 {
        return Decimal::ZERO;
    }
    Decimal::from(days_to_expiry) / Decimal::from(7)
}

/// Initial stop for a long premium position.
#[must_use]
pub fn initial_stop(entry: Decimal, level: RiskLevel, days_to_expiry: i64) -> Decimal {
    entry * (Decimal::ONE - risk_fraction(level) * dte_factor(days_to_expiry))
}

/// Risk-reward ratio tiered by current unrealized profit: a fresh position
/// aims for 1.5x the risk, a runner past 30% profit aims for 3x.
#[must_use]
pub fn risk_reward_tier(profit_pct: Decimal) -> Decimal {
    if profit_pct < Decimal::new(15, 2) {
        Decimal::new(15, 1)
    } else if profit_pct < Decimal::new(30, 2) {
        Decimal::TWO
    } else {
        Decimal::from(3)
    }
}

/// Take-profit level: entry plus the initial risk distance times the ratio
/// for the current profit tier. Recomputed on every check so the target
/// recedes as the position climbs through the tiers.
#[must_use]
pub fn take_profit(entry: Decimal, stop: Decimal, profit_pct: Decimal) -> Decimal {
    entry + (entry - stop) * risk_reward_tier(profit_pct)
}

/// Trailing stop that locks in a share of unrealized gains: a quarter of
/// the gain at 15% profit, half at 30%. None below the first lock level.
#[must_use]
pub fn trailing_stop(entry: Decimal, current: Decimal) -> Option<Decimal> {
    if entry.is_zero() {
        return None;
    }
    let profit = (current - entry) / entry;
    let locked_share = if profit >= Decimal::new(30, 2) {
        Decimal::new(50, 2)
    } else if profit >= Decimal::new(15, 2) {
        Decimal::new(25, 2)
    } else {
        return None;
    };
    Some(entry * (Decimal::ONE + profit * locked_share))
}

/// Effective stop: the base stop ratcheted up by any trailing lock. Never
/// lower than the base, so the level is monotone non-decreasing as profit
/// grows.
#[must_use]
pub fn effective_stop(base: Decimal, entry: Decimal, current: Decimal) -> Decimal {
    match trailing_stop(entry, current) {
        Some(trailing) => base.max(trailing),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn stop_distance_scales_with_dte() {
        // Full distance at 7+ days.
        assert_eq!(initial_stop(dec!(2.00), RiskLevel::Normal, 7), dec!(1.70));
        assert_eq!(initial_stop(dec!(2.00), RiskLevel::Normal, 10), dec!(1.70));
        // Half-ish distance at 3 days: 0.15 * 3/7.
        let stop = initial_stop(dec!(2.00), RiskLevel::Normal, 3);
        assert!(stop > dec!(1.70) && stop < dec!(2.00));
        // At expiry the stop collapses onto entry.
        assert_eq!(initial_stop(dec!(2.00), RiskLevel::Normal, 0), dec!(2.00));
    }

    #[test]
    fn risk_levels_widen_the_stop() {
        let entry = dec!(2.00);
        assert_eq!(initial_stop(entry, RiskLevel::Low, 7), dec!(1.80));
        assert_eq!(initial_stop(entry, RiskLevel::Normal, 7), dec!(1.70));
        assert_eq!(initial_stop(entry, RiskLevel::High, 7), dec!(1.60));
    }

    #[test]
    fn reward_tiers_by_unrealized_profit() {
        assert_eq!(risk_reward_tier(dec!(0.00)), dec!(1.5));
        assert_eq!(risk_reward_tier(dec!(0.10)), dec!(1.5));
        assert_eq!(risk_reward_tier(dec!(0.15)), dec!(2));
        assert_eq!(risk_reward_tier(dec!(0.29)), dec!(2));
        assert_eq!(risk_reward_tier(dec!(0.30)), dec!(3));
    }

    #[test]
    fn take_profit_climbs_with_the_profit_tier() {
        // Entry 2.00, stop 1.70: risk distance 0.30.
        let entry = dec!(2.00);
        let stop = dec!(1.70);
        assert_eq!(take_profit(entry, stop, dec!(0.00)), dec!(2.45));
        assert_eq!(take_profit(entry, stop, dec!(0.20)), dec!(2.60));
        assert_eq!(take_profit(entry, stop, dec!(0.35)), dec!(2.90));
    }

    #[test]
    fn trailing_locks_engage_at_profit_bands() {
        let entry = dec!(2.00);
        assert_eq!(trailing_stop(entry, dec!(2.10)), None);
        // +20% profit locks a quarter of the gain: 2.00 * 1.05.
        assert_eq!(trailing_stop(entry, dec!(2.40)), Some(dec!(2.10)));
        // +50% profit locks half the gain: 2.00 * 1.25.
        assert_eq!(trailing_stop(entry, dec!(3.00)), Some(dec!(2.50)));
    }

    #[test]
    fn effective_stop_is_monotone_in_price() {
        let entry = dec!(2.00);
        let base = dec!(1.70);
        let prices = [
            dec!(1.90),
            dec!(2.20),
            dec!(2.30),
            dec!(2.40),
            dec!(2.60),
            dec!(2.80),
            dec!(3.00),
            dec!(3.50),
        ];
        let mut last = Decimal::ZERO;
        for price in prices {
            let stop = effective_stop(base, entry, price);
            assert!(stop >= base);
            assert!(stop >= last, "stop regressed at price {price}");
            last = stop;
        }
    }

    #[test]
    fn trailing_never_undercuts_the_base_stop() {
        // A wide base stop stays in force even when the lock level is lower.
        let stop = effective_stop(dec!(2.35), dec!(2.00), dec!(2.40));
        assert_eq!(stop, dec!(2.35));
    }
}
