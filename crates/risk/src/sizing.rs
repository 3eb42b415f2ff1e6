//! Contract-count sizing policies.
//!
//! [`MinimumBetPolicy`] sizes up from a minimum-bet floor by confidence
//! tier; [`RiskBudgetPolicy`] sizes down from the per-trade risk budget
//! with no floor. Every intermediate figure is kept on the result for
//! auditability.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Serialize;
use sevendte_core::config::SizingConfig;
use sevendte_core::error::EngineError;
use sevendte_core::position::{RiskProfile, CONTRACT_MULTIPLIER};

/// Inputs to a sizing decision, assembled by the sizing service.
#[derive(Debug, Clone)]
pub struct SizingRequest {
    pub symbol: String,
    /// Premium per share of the option leg.
    pub option_price: Decimal,
    pub confidence: f64,
    pub portfolio_value: Decimal,
    pub risk_profile: RiskProfile,
    /// Notional already allocated to this underlying.
    pub current_allocation: Decimal,
    pub fundamental_adjustment: f64,
    pub correlation_adjustment: f64,
}

/// A sizing decision with its full audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct PositionSize {
    pub symbol: String,
    pub contracts: u32,
    pub min_contracts: u32,
    pub contract_value: Decimal,
    pub position_value: Decimal,
    pub min_position_size: Decimal,
    /// Risk budget after the confidence multiplier.
    pub adjusted_risk: Decimal,
    pub confidence_multiplier: f64,
    pub max_scaling: f64,
    pub fundamental_adjustment: f64,
    pub correlation_adjustment: f64,
    pub available_allocation: Decimal,
}

pub trait SizingPolicy: Send + Sync {
    fn name(&self) -> &str;

    /// Computes a contract count for the request.
    ///
    /// # Errors
    /// [`EngineError::AllocationExhausted`] when the underlying's headroom
    /// cannot hold the smallest position the policy is willing to place.
    fn size(&self, request: &SizingRequest) -> Result<PositionSize, EngineError>;
}

/// Confidence tier multiplier over the minimum bet.
fn max_scaling(confidence: f64) -> f64 {
    if confidence >= 0.9 {
        2.0
    } else if confidence >= 0.8 {
        1.5
    } else if confidence >= 0.7 {
        1.25
    } else {
        1.0
    }
}

fn contract_value(option_price: Decimal) -> Decimal {
    option_price * Decimal::from(CONTRACT_MULTIPLIER)
}

fn headroom(request: &SizingRequest) -> Decimal {
    let max_stock_capital =
        request.portfolio_value * request.risk_profile.max_stock_allocation_pct / Decimal::ONE_HUNDRED;
    max_stock_capital - request.current_allocation
}

fn adjusted_risk_budget(request: &SizingRequest) -> (Decimal, f64) {
    let base_risk = request.portfolio_value * request.risk_profile.max_portfolio_risk_pct
        / Decimal::ONE_HUNDRED;
    let confidence_multiplier = 0.5 + request.confidence;
    let multiplier =
        Decimal::from_f64(confidence_multiplier).unwrap_or(Decimal::ONE);
    (base_risk * multiplier, confidence_multiplier)
}

/// Sizes every position at or above a minimum bet, scaled up with
/// confidence and the fundamental and correlation factors, capped by the
/// per-underlying headroom.
pub struct MinimumBetPolicy {
    config: SizingConfig,
}

impl MinimumBetPolicy {
    #[must_use]
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }
}

impl SizingPolicy for MinimumBetPolicy {
    fn name(&self) -> &str {
        "minimum_bet"
    }

    fn size(&self, request: &SizingRequest) -> Result<PositionSize, EngineError> {
        let cv = contract_value(request.option_price);
        if cv <= Decimal::ZERO {
            return Err(EngineError::Input {
                symbol: request.symbol.clone(),
                reason: format!("non-positive option price {}", request.option_price),
            });
        }

        let min_position_size = self
            .config
            .minimum_bet_usd
            .max(request.portfolio_value * self.config.minimum_bet_portfolio_fraction);
        let min_contracts_dec = (min_position_size / cv).ceil();
        let min_contracts = min_contracts_dec.to_u32().unwrap_or(u32::MAX);

        let available = headroom(request);
        // The smallest placeable position is min_contracts whole contracts;
        // anything less would break the floor.
        let minimum_notional = min_contracts_dec * cv;
        if available < minimum_notional {
            return Err(EngineError::AllocationExhausted {
                symbol: request.symbol.clone(),
                headroom: available,
                minimum: minimum_notional,
            });
        }

        let (adjusted_risk, confidence_multiplier) = adjusted_risk_budget(request);
        let scaling = max_scaling(request.confidence);
        let tiered = (min_contracts_dec
            * Decimal::from_f64(scaling).unwrap_or(Decimal::ONE))
        .floor();
        let budget_cap = (adjusted_risk / cv).floor();
        let scaled = tiered.min(budget_cap).max(min_contracts_dec);

        let combined = request.fundamental_adjustment * request.correlation_adjustment;
        let adjusted = (scaled * Decimal::from_f64(combined).unwrap_or(Decimal::ONE)).floor();
        let mut contracts = adjusted.max(min_contracts_dec);

        // Clamp to headroom; the floor check above guarantees this never
        // drops below min_contracts.
        let max_affordable = (available / cv).floor();
        contracts = contracts.min(max_affordable);

        let contracts = contracts.to_u32().unwrap_or(u32::MAX);
        Ok(PositionSize {
            symbol: request.symbol.clone(),
            contracts,
            min_contracts,
            contract_value: cv,
            position_value: Decimal::from(contracts) * cv,
            min_position_size,
            adjusted_risk,
            confidence_multiplier,
            max_scaling: scaling,
            fundamental_adjustment: request.fundamental_adjustment,
            correlation_adjustment: request.correlation_adjustment,
            available_allocation: available,
        })
    }
}

/// Sizes strictly within the per-trade risk budget, with no minimum bet.
pub struct RiskBudgetPolicy;

impl SizingPolicy for RiskBudgetPolicy {
    fn name(&self) -> &str {
        "risk_budget"
    }

    fn size(&self, request: &SizingRequest) -> Result<PositionSize, EngineError> {
        let cv = contract_value(request.option_price);
        if cv <= Decimal::ZERO {
            return Err(EngineError::Input {
                symbol: request.symbol.clone(),
                reason: format!("non-positive option price {}", request.option_price),
            });
        }

        let available = headroom(request);
        if available < cv {
            return Err(EngineError::AllocationExhausted {
                symbol: request.symbol.clone(),
                headroom: available,
                minimum: cv,
            });
        }

        let (adjusted_risk, confidence_multiplier) = adjusted_risk_budget(request);
        let combined = request.fundamental_adjustment * request.correlation_adjustment;
        let budget =
            adjusted_risk * Decimal::from_f64(combined).unwrap_or(Decimal::ONE);
        let contracts = (budget / cv).floor().min((available / cv).floor());
        let contracts = contracts.max(Decimal::ZERO).to_u32().unwrap_or(u32::MAX);

        Ok(PositionSize {
            symbol: request.symbol.clone(),
            contracts,
            min_contracts: 0,
            contract_value: cv,
            position_value: Decimal::from(contracts) * cv,
            min_position_size: Decimal::ZERO,
            adjusted_risk,
            confidence_multiplier,
            max_scaling: 1.0,
            fundamental_adjustment: request.fundamental_adjustment,
            correlation_adjustment: request.correlation_adjustment,
            available_allocation: available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn profile(risk_pct: Decimal, stock_pct: Decimal) -> RiskProfile {
        RiskProfile {
            max_portfolio_risk_pct: risk_pct,
            max_stock_allocation_pct: stock_pct,
            ..RiskProfile::default()
        }
    }

    fn request(confidence: f64) -> SizingRequest {
        SizingRequest {
            symbol: "NVDA".to_string(),
            option_price: dec!(2.50),
            confidence,
            portfolio_value: dec!(100000),
            risk_profile: profile(dec!(60), dec!(60)),
            current_allocation: Decimal::ZERO,
            fundamental_adjustment: 1.0,
            correlation_adjustment: 1.0,
        }
    }

    fn policy() -> MinimumBetPolicy {
        MinimumBetPolicy::new(SizingConfig::default())
    }

    #[test]
    fn minimum_bet_floor_sets_contract_count() {
        // $33,000 floor at $250 per contract: ceil -> 132 contracts.
        let size = policy().size(&request(0.65)).unwrap();
        assert_eq!(size.min_contracts, 132);
        assert_eq!(size.contracts, 132);
        assert_eq!(size.position_value, dec!(33000));
        assert!((size.max_scaling - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn high_confidence_scales_past_the_floor() {
        // Tier 1.5 at confidence 0.85: 132 * 1.5 = 198 contracts, inside
        // the 60% risk budget of 60,000 * 1.35 = 81,000.
        let size = policy().size(&request(0.85)).unwrap();
        assert_eq!(size.contracts, 198);
        assert_eq!(size.position_value, dec!(49500));
        assert!((size.confidence_multiplier - 1.35).abs() < 1e-9);
    }

    #[test]
    fn very_high_confidence_doubles_the_floor() {
        let mut req = request(0.95);
        // Lift the per-stock cap so the tier alone decides.
        req.risk_profile = profile(dec!(60), dec!(100));
        let size = policy().size(&req).unwrap();
        assert_eq!(size.contracts, 264);
    }

    #[test]
    fn per_stock_cap_clamps_the_tier() {
        // Tier 2.0 wants 264 contracts = $66,000, over the $60,000 cap.
        let size = policy().size(&request(0.95)).unwrap();
        assert_eq!(size.contracts, 240);
        assert_eq!(size.position_value, dec!(60000));
    }

    #[test]
    fn risk_budget_caps_the_tier_scaling() {
        // 2% risk: 2,000 * 1.45 = 2,900 budget caps far below the floor,
        // but the floor always wins.
        let mut req = request(0.95);
        req.risk_profile = profile(dec!(2), dec!(60));
        let size = policy().size(&req).unwrap();
        assert_eq!(size.contracts, 132);
    }

    #[test]
    fn adjustments_scale_contracts_up() {
        let mut req = request(0.65);
        req.fundamental_adjustment = 1.9;
        req.correlation_adjustment = 1.0;
        let size = policy().size(&req).unwrap();
        // floor(132 * 1.9) = 250, still inside headroom of 60,000 / 250 = 240?
        // 250 contracts would be 62,500; clamped to 240.
        assert_eq!(size.contracts, 240);
        assert_eq!(size.position_value, dec!(60000));
    }

    #[test]
    fn correlation_crowding_scales_down_but_never_below_floor() {
        let mut req = request(0.85);
        req.correlation_adjustment = 0.5;
        let size = policy().size(&req).unwrap();
        // floor(198 * 0.5) = 99, raised back to the 132-contract floor.
        assert_eq!(size.contracts, 132);
    }

    #[test]
    fn exhausted_headroom_is_an_error() {
        let mut req = request(0.85);
        req.current_allocation = dec!(40000);
        // Headroom 20,000 cannot hold the 33,000 minimum position.
        let err = policy().size(&req).unwrap_err();
        assert!(matches!(
            err,
            EngineError::AllocationExhausted { headroom, minimum, .. }
                if headroom == dec!(20000) && minimum == dec!(33000)
        ));
    }

    #[test]
    fn headroom_at_least_minimum_always_covers_the_floor() {
        // Floor not a multiple of the contract value: $33,000 over $700
        // contracts needs 48 contracts = $33,600 of headroom.
        let mut req = request(0.65);
        req.option_price = dec!(7);
        req.current_allocation = dec!(26500); // headroom 33,500 < 33,600
        let err = policy().size(&req).unwrap_err();
        assert!(matches!(err, EngineError::AllocationExhausted { .. }));

        req.current_allocation = dec!(26400); // headroom 33,600
        let size = policy().size(&req).unwrap();
        assert_eq!(size.contracts, 48);
        assert!(size.position_value >= size.min_position_size);
    }

    #[test]
    fn zero_option_price_is_invalid_input() {
        let mut req = request(0.65);
        req.option_price = Decimal::ZERO;
        assert!(matches!(
            policy().size(&req).unwrap_err(),
            EngineError::Input { .. }
        ));
    }

    #[test]
    fn risk_budget_policy_has_no_floor() {
        let mut req = request(0.65);
        req.risk_profile = profile(dec!(2), dec!(60));
        let size = RiskBudgetPolicy.size(&req).unwrap();
        // 2,000 * 1.15 = 2,300 budget -> 9 contracts at $250.
        assert_eq!(size.contracts, 9);
        assert_eq!(size.min_contracts, 0);
    }

    #[test]
    fn risk_budget_policy_errors_when_one_contract_cannot_fit() {
        let mut req = request(0.65);
        req.current_allocation = dec!(59900);
        let err = RiskBudgetPolicy.size(&req).unwrap_err();
        assert!(matches!(err, EngineError::AllocationExhausted { .. }));
    }
}
