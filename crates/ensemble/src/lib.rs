pub mod aggregator;
pub mod weights;

pub use aggregator::{Aggregator, BucketDecision, ConsensusFailure};
pub use weights::WeightTable;
