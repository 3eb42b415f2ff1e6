pub mod bollinger;
pub mod earnings;
pub mod indicators;
pub mod iv_percentile;
pub mod macd;
pub mod registry;
pub mod rsi;
pub mod valuation;

#[cfg(test)]
pub(crate) mod testutil;

pub use bollinger::BollingerStrategy;
pub use earnings::EarningsStrategy;
pub use iv_percentile::IvPercentileStrategy;
pub use macd::MacdStrategy;
pub use registry::StrategyRegistry;
pub use rsi::RsiStrategy;
pub use valuation::ValuationStrategy;
