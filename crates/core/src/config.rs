use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub evaluation: EvaluationConfig,
    pub ensemble: EnsembleConfig,
    pub sizing: SizingConfig,
    pub exits: ExitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Target days-to-expiration for option leg selection.
    pub target_dte_days: i64,
    /// Accepted deviation around the target, in days.
    pub dte_tolerance_days: i64,
    /// Signal validity horizon, in days.
    pub time_frame_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Minimum number of agreeing strategies per direction bucket.
    pub quorum: usize,
    /// Minimum combined confidence for an ensemble signal to be emitted.
    pub min_confidence: f64,
    pub combine: CombineMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMethod {
    /// Unweighted mean of member confidences.
    Simple,
    /// Mean weighted by strategy and source reliability.
    Weighted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    pub policy: SizingMethod,
    /// Absolute floor on position notional, in dollars.
    pub minimum_bet_usd: Decimal,
    /// Floor as a fraction of portfolio value; the larger of the two wins.
    pub minimum_bet_portfolio_fraction: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMethod {
    /// Sizes up from a minimum-bet floor by confidence tier.
    MinimumBet,
    /// Sizes down from the per-trade risk budget alone, no floor.
    RiskBudget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitConfig {
    pub risk_level: RiskLevel,
    /// Enables trailing stop ratcheting on profitable positions.
    pub trailing_enabled: bool,
    /// Enables laddered partial profit-taking.
    pub ladder_enabled: bool,
}

/// Stop-distance regime for initial exit levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Normal,
    High,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            target_dte_days: 7,
            dte_tolerance_days: 2,
            time_frame_days: 7,
        }
    }
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            quorum: 2,
            min_confidence: 0.6,
            combine: CombineMethod::Weighted,
        }
    }
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            policy: SizingMethod::MinimumBet,
            minimum_bet_usd: Decimal::from(33_000),
            minimum_bet_portfolio_fraction: Decimal::new(33, 2),
        }
    }
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            risk_level: RiskLevel::Normal,
            trailing_enabled: true,
            ladder_enabled: true,
        }
    }
}
