//! Deterministic train/test partitions.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// One train/test partition of a dataset, expressed as example indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Fold index within the run.
    pub index: usize,
    /// Seed used for the shuffle (`base_seed + index`).
    pub seed: u64,
    /// Indices of the training examples, ascending.
    pub train: Vec<usize>,
    /// Indices of the held-out examples, ascending.
    pub test: Vec<usize>,
}

impl Fold {
    /// Split `len` examples for fold `index`.
    ///
    /// The held-out share is `ceil(test_size * len)` examples chosen by a
    /// shuffle seeded with `base_seed + index`, so the same arguments always
    /// produce the same partition.
    pub fn split(len: usize, test_size: f64, base_seed: u64, index: usize) -> Self {
        let seed = base_seed.wrapping_add(index as u64);
        let n_test = ((test_size.clamp(0.0, 1.0) * len as f64).ceil() as usize).min(len);

        let mut indices: Vec<usize> = (0..len).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let mut test = indices[..n_test].to_vec();
        let mut train = indices[n_test..].to_vec();
        test.sort_unstable();
        train.sort_unstable();

        Fold {
            index,
            seed,
            train,
            test,
        }
    }
}
