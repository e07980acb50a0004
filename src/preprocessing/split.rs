//! Seeded train/test partitioning

use crate::error::{Result, XaiError};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Disjoint train/test row indices covering the whole table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

impl TrainTestSplit {
    pub fn n_train(&self) -> usize {
        self.train_indices.len()
    }

    pub fn n_test(&self) -> usize {
        self.test_indices.len()
    }

    /// Select the train and test rows of `x` and `y`
    pub fn apply(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>)> {
        let n = self.n_train() + self.n_test();
        if x.nrows() != n || y.len() != n {
            return Err(XaiError::ShapeError {
                expected: format!("{} rows", n),
                actual: format!("x has {} rows, y has {}", x.nrows(), y.len()),
            });
        }

        Ok((
            x.select(Axis(0), &self.train_indices),
            x.select(Axis(0), &self.test_indices),
            y.select(Axis(0), &self.train_indices),
            y.select(Axis(0), &self.test_indices),
        ))
    }
}

/// Shuffle `0..n_samples` with `seed` and hold out `ceil(test_size * n)` rows.
///
/// Both partitions are non-empty; fewer than two rows cannot be split.
pub fn train_test_split(n_samples: usize, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if n_samples < 2 {
        return Err(XaiError::InsufficientDataError {
            required: 2,
            actual: n_samples,
        });
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(XaiError::ConfigError(format!(
            "test_size must lie in (0, 1), got {}",
            test_size
        )));
    }

    let n_test = ((n_samples as f64 * test_size).ceil() as usize).clamp(1, n_samples - 1);

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train_indices = indices.split_off(n_test);
    Ok(TrainTestSplit {
        train_indices,
        test_indices: indices,
    })
}
