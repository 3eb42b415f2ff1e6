//! Pure exit evaluation over an open position.
//!
//! `check` reads the position and the latest price and recommends an
//! action; it never mutates the position or touches I/O. Applying the
//! recommendation (and appending to the partial-close ledger) is the
//! engine's job.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sevendte_core::config::ExitConfig;
use sevendte_core::position::Position;

use crate::ladder::{default_ladder, ladder_release, LadderRung};
use crate::levels::{effective_stop, initial_stop, take_profit};

/// Why a close is recommended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    StopLoss,
    TakeProfit,
    Expiring,
    ProfitLadder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RecommendedAction {
    Hold,
    CloseAll {
        reason: CloseReason,
    },
    ClosePartial {
        /// Fraction of the original position to release now.
        fraction: Decimal,
        reason: CloseReason,
    },
}

/// Result of one exit check, with the levels that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ExitCheck {
    pub position_id: i64,
    pub profit_pct: Decimal,
    pub effective_stop: Decimal,
    pub take_profit: Decimal,
    pub stop_hit: bool,
    pub take_profit_hit: bool,
    pub days_to_expiry: i64,
    pub action: RecommendedAction,
}

pub struct ExitPlanner {
    config: ExitConfig,
    ladder: Vec<LadderRung>,
}

impl ExitPlanner {
    #[must_use]
    pub fn new(config: ExitConfig) -> Self {
        Self {
            config,
            ladder: default_ladder(),
        }
    }

    #[must_use]
    pub fn with_ladder(config: ExitConfig, ladder: Vec<LadderRung>) -> Self {
        Self { config, ladder }
    }

    /// Evaluates exit conditions in priority order: stop, target, expiry,
    /// then the profit ladder.
    #[must_use]
    pub fn check(&self, position: &Position, current: Decimal, today: NaiveDate) -> ExitCheck {
        let dte = position.days_to_expiry(today);
        let entry = position.entry_price;

        let base_stop = position
            .stop_loss
            .unwrap_or_else(|| initial_stop(entry, self.config.risk_level, dte));
        let stop = if self.config.trailing_enabled {
            effective_stop(base_stop, entry, current)
        } else {
            base_stop
        };
        let profit = position.profit_pct(current);
        // The target re-tiers with profit, so the stored initial level is
        // ignored and the level is derived fresh on every check.
        let target = take_profit(entry, base_stop, profit);

        let stop_hit = current <= stop;
        let take_profit_hit = current >= target;
        let action = if stop_hit {
            RecommendedAction::CloseAll {
                reason: CloseReason::StopLoss,
            }
        } else if take_profit_hit {
            RecommendedAction::CloseAll {
                reason: CloseReason::TakeProfit,
            }
        } else if dte <= 0 {
            RecommendedAction::CloseAll {
                reason: CloseReason::Expiring,
            }
        } else if self.config.ladder_enabled {
            let owed =
                ladder_release(&self.ladder, profit, dte, position.released_fraction());
            if owed > Decimal::ZERO {
                RecommendedAction::ClosePartial {
                    fraction: owed,
                    reason: CloseReason::ProfitLadder,
                }
            } else {
                RecommendedAction::Hold
            }
        } else {
            RecommendedAction::Hold
        };

        ExitCheck {
            position_id: position.id,
            profit_pct: profit,
            effective_stop: stop,
            take_profit: target,
            stop_hit,
            take_profit_hit,
            days_to_expiry: dte,
            action,
        }
    }
}
