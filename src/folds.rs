//! Random fold assignment and per-fold train/test index selection.
//!
//! Every observation independently receives a fold id drawn uniformly from
//! `1..=V` (with replacement across fold ids). Fold sizes are therefore random
//! and a fold may end up empty; the split helpers report that case instead of
//! producing a degenerate partition.
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, ValidationError};

/// Build the random source for fold draws.
///
/// A fixed seed reproduces the same assignment; `None` seeds from entropy.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Draw a fold id in `[1, n_folds]` for each of `n_samples` observations.
///
/// # Arguments
///
/// * `n_samples` - Number of observations (N)
/// * `n_folds` - Number of folds (V), at least 2
/// * `rng` - Random source, see [`rng_from_seed`]
///
/// # Returns
///
/// A length-N array of fold ids
pub fn assign_folds<R: Rng + ?Sized>(
    n_samples: usize,
    n_folds: usize,
    rng: &mut R,
) -> Result<Array1<usize>> {
    if n_folds < 2 {
        return Err(ValidationError::invalid_argument(format!(
            "number of folds must be at least 2, got {}",
            n_folds
        )));
    }

    let folds: Array1<usize> = (0..n_samples)
        .map(|_| rng.gen_range(1..=n_folds))
        .collect();

    log::trace!(
        "Assigned {} observations to {} folds, sizes {:?}",
        n_samples,
        n_folds,
        fold_sizes(&folds, n_folds)
    );

    Ok(folds)
}

/// Check that every label lies in `[1, n_folds]`.
pub fn validate_assignment(folds: &Array1<usize>, n_folds: usize) -> Result<()> {
    if n_folds < 2 {
        return Err(ValidationError::invalid_argument(format!(
            "number of folds must be at least 2, got {}",
            n_folds
        )));
    }
    if let Some((row, &label)) = folds
        .iter()
        .enumerate()
        .find(|&(_, &f)| f == 0 || f > n_folds)
    {
        return Err(ValidationError::invalid_argument(format!(
            "fold label {} at row {} is outside 1..={}",
            label, row, n_folds
        )));
    }
    Ok(())
}

/// Number of rows per fold; entry `f - 1` holds the size of fold `f`.
pub fn fold_sizes(folds: &Array1<usize>, n_folds: usize) -> Vec<usize> {
    let mut sizes = vec![0usize; n_folds];
    for &f in folds.iter() {
        if f >= 1 && f <= n_folds {
            sizes[f - 1] += 1;
        }
    }
    sizes
}

/// Row indices of the training (fold != `fold`) and test (fold == `fold`) partitions.
pub fn split_indices(folds: &Array1<usize>, fold: usize) -> (Vec<usize>, Vec<usize>) {
    let (test, train): (Vec<usize>, Vec<usize>) = (0..folds.len()).partition(|&i| folds[i] == fold);
    (train, test)
}

/// Reject partitions that leave nothing to fit on or nothing to evaluate.
pub fn check_partition(fold: usize, train_rows: usize, test_rows: usize) -> Result<()> {
    if train_rows == 0 || test_rows == 0 {
        log::warn!(
            "Fold {} has {} training rows and {} test rows",
            fold,
            train_rows,
            test_rows
        );
        return Err(ValidationError::InsufficientData {
            fold,
            train_rows,
            test_rows,
        });
    }
    Ok(())
}
