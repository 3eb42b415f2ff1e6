//! Open option positions, account risk profiles, and the append-only
//! partial-close ledger.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::signal::OptionLeg;

/// Shares per option contract.
pub const CONTRACT_MULTIPLIER: u32 = 100;

/// Lifecycle status of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    PartiallyClosed,
    Closed,
}

/// One partial profit-taking event in a position's ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialProfitEvent {
    pub position_id: i64,
    /// Fraction of the original position closed by this event, in (0, 1].
    pub percentage_closed: Decimal,
    pub price: Decimal,
    /// Unrealized profit fraction at the time of the close.
    pub profit_percentage: Decimal,
    pub triggered_at: DateTime<Utc>,
}

/// An open options position managed by the exit planner.
///
/// `quantity` is the original contract count; the partial-close ledger
/// tracks how much of it has been released. The ledger is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: i64,
    pub symbol: String,
    pub leg: OptionLeg,
    pub entry_price: Decimal,
    pub current_price: Decimal,
    pub quantity: u32,
    pub status: PositionStatus,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub opened_at: DateTime<Utc>,
    pub partial_closes: Vec<PartialProfitEvent>,
}

impl Position {
    #[must_use]
    pub fn expiry(&self) -> NaiveDate {
        self.leg.expiry
    }

    /// Days until the option leg expires relative to `today`.
    #[must_use]
    pub fn days_to_expiry(&self, today: NaiveDate) -> i64 {
        (self.leg.expiry - today).num_days()
    }

    /// Unrealized profit as a fraction of entry price at `current`.
    /// A zero entry price resolves to zero rather than dividing.
    #[must_use]
    pub fn profit_pct(&self, current: Decimal) -> Decimal {
        if self.entry_price.is_zero() {
            return Decimal::ZERO;
        }
        (current - self.entry_price) / self.entry_price
    }

    /// Current notional value of the remaining contracts.
    #[must_use]
    pub fn current_value(&self) -> Decimal {
        let remaining = Decimal::from(self.quantity) * (Decimal::ONE - self.released_fraction());
        self.current_price * Decimal::from(CONTRACT_MULTIPLIER) * remaining
    }

    /// Total fraction of the original position already released, in [0, 1].
    #[must_use]
    pub fn released_fraction(&self) -> Decimal {
        self.partial_closes
            .iter()
            .map(|e| e.percentage_closed)
            .sum()
    }

    /// Appends a partial close to the ledger, enforcing that cumulative
    /// releases never exceed the whole position.
    ///
    /// # Errors
    /// Rejects non-positive releases and releases that would push the
    /// cumulative total past 1.0.
    pub fn record_partial_close(&mut self, event: PartialProfitEvent) -> Result<()> {
        if event.percentage_closed <= Decimal::ZERO {
            anyhow::bail!(
                "partial close must be positive, got {}",
                event.percentage_closed
            );
        }
        let total = self.released_fraction() + event.percentage_closed;
        if total > Decimal::ONE {
            anyhow::bail!(
                "partial close of {} would release {} of position {}, exceeding 1.0",
                event.percentage_closed,
                total,
                self.id
            );
        }
        self.partial_closes.push(event);
        self.status = if total == Decimal::ONE {
            PositionStatus::Closed
        } else {
            PositionStatus::PartiallyClosed
        };
        Ok(())
    }
}

/// Per-account risk limits. Percentages are whole numbers, e.g. 2.0 = 2%.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Max % of portfolio to risk on one trade.
    pub max_portfolio_risk_pct: Decimal,
    /// Max % of portfolio in options overall.
    pub max_portfolio_exposure_pct: Decimal,
    /// Max % of portfolio allocated to a single underlying.
    pub max_stock_allocation_pct: Decimal,
    /// Max % loss tolerated on one trade.
    pub max_loss_per_trade_pct: Decimal,
    /// Target risk-reward ratio for exits.
    pub risk_reward_ratio: Decimal,
}

impl Default for RiskProfile {
    fn default() -> Self {
        Self {
            max_portfolio_risk_pct: Decimal::TWO,
            max_portfolio_exposure_pct: Decimal::from(50),
            max_stock_allocation_pct: Decimal::TEN,
            max_loss_per_trade_pct: Decimal::from(25),
            risk_reward_ratio: Decimal::TWO,
        }
    }
}
