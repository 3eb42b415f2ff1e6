pub mod config;
pub mod config_loader;
pub mod error;
pub mod market;
pub mod position;
pub mod signal;
pub mod traits;

pub use config::{
    CombineMethod, EngineConfig, EnsembleConfig, EvaluationConfig, ExitConfig, RiskLevel,
    SizingConfig, SizingMethod,
};
pub use config_loader::ConfigLoader;
pub use error::EngineError;
pub use market::{
    AnalystRatings, Candle, DteWindow, EarningsReport, Fundamentals, Greeks, Instrument,
    MarketSnapshot, OptionQuote, OptionRight, ValuationMetrics, VolatilityMetrics,
};
pub use position::{
    PartialProfitEvent, Position, PositionStatus, RiskProfile, CONTRACT_MULTIPLIER,
};
pub use signal::{
    CandidateSignal, Direction, Factor, OptionLeg, Signal, SignalKind, SignalSource, SignalStatus,
    TimeFrame,
};
pub use traits::{
    AccountRepository, CorrelationProvider, MarketSnapshotProvider, SignalRepository, Strategy,
};
