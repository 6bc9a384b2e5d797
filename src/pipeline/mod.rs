//! Pipeline stages: train/test splitting, training, and evaluation

pub mod evaluator;
pub mod split;
pub mod trainer;

pub use evaluator::evaluate;
pub use split::{train_test_split, SplitConfig};
pub use trainer::Trainer;
