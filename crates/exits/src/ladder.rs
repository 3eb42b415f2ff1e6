//! Laddered partial profit-taking.
//!
//! Rungs release fixed fractions of the original position as profit climbs.
//! Close to expiry the profit thresholds de-rate so gains are harvested
//! before theta takes them back. Release math is idempotent: it returns
//! only the increment still owed given what the ledger already shows.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One rung: release `fraction` of the original size once unrealized
/// profit reaches `profit_threshold`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LadderRung {
    pub profit_threshold: Decimal,
    pub fraction: Decimal,
}

/// Standard three-rung ladder: a quarter of the position at +20%, +35%,
/// and +50% profit.
#[must_use]
pub fn default_ladder() -> Vec<LadderRung> {
    vec![
        LadderRung {
            profit_threshold: Decimal::new(20, 2),
            fraction: Decimal::new(25, 2),
        },
        LadderRung {
            profit_threshold: Decimal::new(35, 2),
            fraction: Decimal::new(25, 2),
        },
        LadderRung {
            profit_threshold: Decimal::new(50, 2),
            fraction: Decimal::new(25, 2),
        },
    ]
}

/// Threshold de-rating by days to expiry. Short-dated gains are taken at
/// shallower profit levels.
#[must_use]
pub fn dte_derating(days_to_expiry: i64) -> Decimal {
    if days_to_expiry <= 1 {
        Decimal::new(40, 2)
    } else if days_to_expiry <= 2 {
        Decimal::new(60, 2)
    } else if days_to_expiry <= 3 {
        Decimal::new(75, 2)
    } else if days_to_expiry <= 5 {
        Decimal::new(90, 2)
    } else {
        Decimal::ONE
    }
}

/// Fraction of the original position still owed to the ladder at the given
/// profit, after subtracting what the ledger already released. Cumulative
/// releases never exceed the whole position.
#[must_use]
pub fn ladder_release(
    ladder: &[LadderRung],
    profit_pct: Decimal,
    days_to_expiry: i64,
    already_released: Decimal,
) -> Decimal {
    let derate = dte_derating(days_to_expiry);
    let target: Decimal = ladder
        .iter()
        .filter(|rung| profit_pct >= rung.profit_threshold * derate)
        .map(|rung| rung.fraction)
        .sum();
    let target = target.min(Decimal::ONE);
    (target - already_released).max(Decimal::ZERO)
}
