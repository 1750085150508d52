//! Seeded train/test partitioning

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{PipelineError, Result, Stage};

/// Default share of rows used for training
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

/// Disjoint train/test subsets of one dataset
#[derive(Debug, Clone)]
pub struct Split {
    pub train: DataFrame,
    pub test: DataFrame,
    /// Original row positions of the training rows, ascending
    pub train_indices: Vec<usize>,
    /// Original row positions of the test rows, ascending
    pub test_indices: Vec<usize>,
}

/// Sample `floor(proportion * N)` rows without replacement as the training
/// set; every other row goes to the test set.
///
/// The same `(df, seed, proportion)` always produces the same split.
pub fn train_test_split(df: &DataFrame, seed: u64, proportion: f64) -> Result<Split> {
    validate_proportion(proportion)?;

    let n = df.height();
    if n == 0 {
        return Err(PipelineError::data(
            Stage::Splitter,
            "dataset",
            "cannot split an empty dataset",
        ));
    }

    let (train_indices, test_indices) = split_indices(n, seed, proportion);

    Ok(Split {
        train: take_rows(df, &train_indices)?,
        test: take_rows(df, &test_indices)?,
        train_indices,
        test_indices,
    })
}

pub fn validate_proportion(proportion: f64) -> Result<()> {
    if proportion.is_finite() && proportion > 0.0 && proportion < 1.0 {
        Ok(())
    } else {
        Err(PipelineError::configuration(
            Stage::Splitter,
            "proportion",
            format!("must lie strictly between 0 and 1, got {}", proportion),
        ))
    }
}

/// Index-level split: `(train, test)`, both ascending.
pub fn split_indices(n: usize, seed: u64, proportion: f64) -> (Vec<usize>, Vec<usize>) {
    let train_size = (proportion * n as f64).floor() as usize;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut train = rand::seq::index::sample(&mut rng, n, train_size.min(n)).into_vec();
    train.sort_unstable();

    let mut in_train = vec![false; n];
    for &i in &train {
        in_train[i] = true;
    }
    let test = (0..n).filter(|&i| !in_train[i]).collect();

    (train, test)
}

/// Select rows by position, keeping the given order
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = indices.iter().map(|&i| i as IdxSize).collect();
    let idx = IdxCa::from_vec("row".into(), idx);
    Ok(df.take(&idx)?)
}
