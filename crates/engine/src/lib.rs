pub mod engine;

pub use engine::{CycleFailure, CycleReport, DecisionEngine, InstrumentOutcome};
