//! Reference data and market snapshot types consumed by strategy evaluators.
//!
//! A [`MarketSnapshot`] is an immutable view of everything a strategy needs
//! for one instrument: price history, the short-dated option chain,
//! fundamentals, and volatility statistics. Evaluators never touch I/O; the
//! snapshot is assembled upstream by a [`crate::traits::MarketSnapshotProvider`].

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A tradable underlying in the fixed basket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub last_price: Decimal,
    pub beta: f64,
}

/// One OHLCV bar, daily resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// Option right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionRight {
    Call,
    Put,
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

/// Option price sensitivities, consumed as externally supplied inputs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
}

/// A quoted option contract in the snapshot chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionQuote {
    /// OCC-style contract symbol.
    pub symbol: String,
    pub right: OptionRight,
    pub strike: Decimal,
    pub expiry: NaiveDate,
    pub bid: Decimal,
    pub ask: Decimal,
    pub implied_volatility: f64,
    pub greeks: Greeks,
}

impl OptionQuote {
    /// Mid price between bid and ask.
    #[must_use]
    pub fn mid_price(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }

    /// Days until expiration relative to `today`.
    #[must_use]
    pub fn days_to_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry - today).num_days()
    }
}

/// Target days-to-expiration window for option leg selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DteWindow {
    pub target_days: i64,
    pub tolerance_days: i64,
}

impl Default for DteWindow {
    fn default() -> Self {
        Self {
            target_days: 7,
            tolerance_days: 2,
        }
    }
}

impl DteWindow {
    /// Returns true if `dte` falls within `target ± tolerance`.
    #[must_use]
    pub fn contains(&self, dte: i64) -> bool {
        (dte - self.target_days).abs() <= self.tolerance_days
    }
}

/// Valuation ratios for one company. A missing metric means the upstream
/// feed had no figure; comparisons against it abstain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValuationMetrics {
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    pub profit_margin: Option<f64>,
}

/// One historical earnings report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsReport {
    pub earnings_date: NaiveDate,
    pub eps_actual: f64,
    pub eps_estimate: f64,
    /// Surprise as a percentage, e.g. 12.5 for a 12.5% beat.
    pub surprise_pct: Option<f64>,
}

/// Aggregated analyst consensus, each field a percentage of ratings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalystRatings {
    pub buy_pct: f64,
    pub hold_pct: f64,
    pub sell_pct: f64,
}

/// Fundamental data block for one instrument.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fundamentals {
    pub next_earnings: Option<NaiveDate>,
    /// Trailing quarters, oldest first. Typically 4-8 entries.
    pub earnings_history: Vec<EarningsReport>,
    pub metrics: ValuationMetrics,
    /// Sector peer averages, supplied by the fundamentals feed.
    pub sector_metrics: ValuationMetrics,
    pub ratings: Option<AnalystRatings>,
}

impl Fundamentals {
    /// Most recent earnings surprise percentage, if any report carries one.
    #[must_use]
    pub fn latest_surprise_pct(&self) -> Option<f64> {
        self.earnings_history.iter().rev().find_map(|r| r.surprise_pct)
    }
}

/// Implied volatility statistics over the trailing year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityMetrics {
    /// Percentile rank of current IV in its trailing distribution, 0-100.
    pub iv_percentile: f64,
    pub iv_rank: Option<f64>,
    pub iv_mean: f64,
    pub iv_min: f64,
    pub iv_max: f64,
}

/// Immutable market view for one instrument at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub as_of: DateTime<Utc>,
    /// Daily candles, oldest first.
    pub candles: Vec<Candle>,
    pub chain: Vec<OptionQuote>,
    pub fundamentals: Option<Fundamentals>,
    pub volatility: Option<VolatilityMetrics>,
}

impl MarketSnapshot {
    /// Latest close, if any candles are present.
    #[must_use]
    pub fn latest_close(&self) -> Option<Decimal> {
        self.candles.last().map(|c| c.close)
    }

    /// Close series as f64 for indicator math, oldest first.
    #[must_use]
    pub fn closes(&self) -> Vec<f64> {
        self.candles
            .iter()
            .filter_map(|c| c.close.to_f64())
            .collect()
    }

    /// Volume series as f64, oldest first.
    #[must_use]
    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume as f64).collect()
    }

    /// Finds the at-the-money contract of the given right: nearest strike to
    /// `spot` among contracts whose DTE falls inside `window`. Returns None
    /// when no contract qualifies; evaluators treat that as an abstention.
    #[must_use]
    pub fn find_atm(
        &self,
        right: OptionRight,
        spot: Decimal,
        window: &DteWindow,
    ) -> Option<&OptionQuote> {
        let today = self.as_of.date_naive();
        self.chain
            .iter()
            .filter(|o| o.right == right)
            .filter(|o| window.contains(o.days_to_expiry(today)))
            .min_by_key(|o| (o.strike - spot).abs())
    }
}
