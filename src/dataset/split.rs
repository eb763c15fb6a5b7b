use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{KwsError, Result};

/// Row indices for each partition, in shuffled order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

pub fn validate_fraction(test_split_fraction: f64) -> Result<()> {
    if test_split_fraction > 0.0 && test_split_fraction < 1.0 {
        Ok(())
    } else {
        Err(KwsError::Value(format!(
            "test split fraction must be within (0, 1), got {test_split_fraction}"
        )))
    }
}

/// Shuffles `0..total` with a seeded RNG and cuts off
/// `ceil(total * test_split_fraction)` rows for the test partition.
pub fn train_test_indices(
    total: usize,
    test_split_fraction: f64,
    seed: u64,
) -> Result<SplitIndices> {
    validate_fraction(test_split_fraction)?;
    // Epsilon keeps products like 3 * 0.1 from rounding up an extra row.
    let n_test = (total as f64 * test_split_fraction - 1e-9).ceil() as usize;
    if n_test == 0 || n_test >= total {
        return Err(KwsError::Value(format!(
            "splitting {total} samples with fraction {test_split_fraction} \
             leaves an empty partition"
        )));
    }

    let mut indices: Vec<usize> = (0..total).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: indices,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let split = train_test_indices(20, 0.2, 7).unwrap();
        assert_eq!(split.train.len(), 16);
        assert_eq!(split.test.len(), 4);
        let train: HashSet<_> = split.train.iter().collect();
        assert!(split.test.iter().all(|i| !train.contains(i)));
        let mut all: Vec<_> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_split() {
        let first = train_test_indices(50, 0.3, 42).unwrap();
        let second = train_test_indices(50, 0.3, 42).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_partition_rounds_up() {
        let split = train_test_indices(7, 0.2, 1).unwrap();
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 5);
    }

    #[test]
    fn rejects_out_of_range_fractions() {
        for fraction in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            assert!(
                matches!(train_test_indices(10, fraction, 0), Err(KwsError::Value(_))),
                "fraction {fraction} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_split_with_empty_train_side() {
        assert!(train_test_indices(1, 0.5, 0).is_err());
    }
}
