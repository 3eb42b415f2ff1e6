pub mod adjustments;
pub mod service;
pub mod sizing;

pub use adjustments::{correlation_adjustment, fundamental_adjustment};
pub use service::Sizer;
pub use sizing::{MinimumBetPolicy, PositionSize, RiskBudgetPolicy, SizingPolicy, SizingRequest};
