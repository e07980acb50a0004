//! Data preprocessing
//!
//! - Seeded train/test partitioning
//! - Standard scaling fitted on the training partition only

mod scaler;
mod split;

pub use scaler::{ScalerParams, StandardScaler};
pub use split::{train_test_split, TrainTestSplit};
