pub mod ladder;
pub mod levels;
pub mod planner;

pub use ladder::{default_ladder, dte_derating, ladder_release, LadderRung};
pub use levels::{
    dte_factor, effective_stop, initial_stop, risk_fraction, risk_reward_tier, take_profit,
    trailing_stop,
};
pub use planner::{CloseReason, ExitCheck, ExitPlanner, RecommendedAction};
