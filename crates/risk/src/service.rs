//! Async sizing service: gathers account state, computes adjustment
//! factors, runs the policy, and reserves the allocation atomically.

use std::collections::BTreeSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use sevendte_core::error::EngineError;
use sevendte_core::market::Fundamentals;
use sevendte_core::signal::Signal;
use sevendte_core::traits::{AccountRepository, CorrelationProvider};
use tracing::{info, warn};

use crate::adjustments::{correlation_adjustment, fundamental_adjustment};
use crate::sizing::{PositionSize, SizingPolicy, SizingRequest};

pub struct Sizer {
    account: Arc<dyn AccountRepository>,
    correlation: Arc<dyn CorrelationProvider>,
    policy: Box<dyn SizingPolicy>,
}

impl Sizer {
    #[must_use]
    pub fn new(
        account: Arc<dyn AccountRepository>,
        correlation: Arc<dyn CorrelationProvider>,
        policy: Box<dyn SizingPolicy>,
    ) -> Self {
        Self {
            account,
            correlation,
            policy,
        }
    }

    /// Sizes a signal against the account and reserves the notional.
    ///
    /// The policy works from a snapshot of the account; the reservation at
    /// the end is the atomic check that makes concurrent sizing requests
    /// against the same underlying safe.
    ///
    /// # Errors
    /// Repository failures, invalid signal input, and
    /// [`EngineError::AllocationExhausted`] when the underlying has no
    /// headroom left for the smallest placeable position.
    pub async fn size_signal(
        &self,
        account_id: i64,
        signal: &Signal,
        option_price: Decimal,
        fundamentals: Option<&Fundamentals>,
    ) -> Result<PositionSize, EngineError> {
        let risk_profile = self
            .account
            .get_risk_profile(account_id)
            .await
            .map_err(EngineError::repository)?;
        let portfolio_value = self
            .account
            .get_portfolio_value(account_id)
            .await
            .map_err(EngineError::repository)?;
        let open_positions = self
            .account
            .get_open_positions(account_id)
            .await
            .map_err(EngineError::repository)?;

        let current_allocation: Decimal = open_positions
            .iter()
            .filter(|p| p.symbol == signal.symbol)
            .map(sevendte_core::position::Position::current_value)
            .sum();

        let other_symbols: BTreeSet<&str> = open_positions
            .iter()
            .filter(|p| p.symbol != signal.symbol)
            .map(|p| p.symbol.as_str())
            .collect();
        let mut correlations = Vec::with_capacity(other_symbols.len());
        for other in other_symbols {
            let pair = self
                .correlation
                .get_correlation(&signal.symbol, other)
                .await
                .map_err(EngineError::repository)?;
            if let Some(c) = pair {
                correlations.push(c);
            }
        }

        let request = SizingRequest {
            symbol: signal.symbol.clone(),
            option_price,
            confidence: signal.confidence,
            portfolio_value,
            risk_profile,
            current_allocation,
            fundamental_adjustment: fundamental_adjustment(fundamentals, signal.confidence),
            correlation_adjustment: correlation_adjustment(&correlations),
        };
        let size = self.policy.size(&request)?;

        let reserved = self
            .account
            .reserve_allocation(account_id, &signal.symbol, size.position_value)
            .await
            .map_err(EngineError::repository)?;
        if !reserved {
            warn!(symbol = %signal.symbol, value = %size.position_value, "allocation reservation rejected");
            return Err(EngineError::AllocationExhausted {
                symbol: signal.symbol.clone(),
                headroom: size.available_allocation,
                minimum: size.position_value,
            });
        }

        info!(
            symbol = %signal.symbol,
            policy = self.policy.name(),
            contracts = size.contracts,
            position_value = %size.position_value,
            "position sized"
        );
        Ok(size)
    }
}
