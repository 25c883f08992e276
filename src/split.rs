//! Training/test splits of labelled probes.
//!
//! Each splitter turns unsplit `ProbesByClass` into one or more
//! `ClassSets` mappings ready for `Classifier::train()`. All randomness
//! comes from the caller's PRNG.
use std::collections::HashSet;

use ndarray::prelude::*;
use rand::seq::index::sample;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::{Error, Result};
use crate::probes::{attribute_count, ClassSets, ProbesByClass};

/// Number of bootstrap trials in a default run.
pub const BOOTSTRAP_TRIALS: usize = 20;

/// Stratified holdout split.
///
/// In every class, `round(n * (1 - training_fraction))` probes drawn at
/// random go to the test set and the rest to the training set.
///
/// # Examples
///
/// ```
/// # use ndarray::array;
/// use pcg_rand::Pcg32;
/// use rand::SeedableRng;
/// use nearest_class::probes::ProbesByClass;
/// use nearest_class::split::holdout;
///
/// let mut classes = ProbesByClass::new();
/// classes.insert("A".to_string(), array![[1., 2., 3., 4., 5.]]);
///
/// let mut rng = Pcg32::seed_from_u64(0);
/// let sets = holdout(&classes, 0.6, &mut rng).unwrap();
///
/// assert_eq!(sets.get("A_training").unwrap().ncols(), 3);
/// assert_eq!(sets.get("A_test").unwrap().ncols(), 2);
/// ```
pub fn holdout<R: Rng>(classes: &ProbesByClass, training_fraction: f64,
                       rng: &mut R) -> Result<ClassSets> {
    if !(training_fraction > 0. && training_fraction < 1.) {
        return Err(Error::InvalidInput(format!(
            "training fraction must lie strictly between 0 and 1, got {}", training_fraction
        )));
    }
    attribute_count(classes)?;

    let mut sets = ClassSets::new();
    for (class, probes) in classes {
        let n = probes.ncols();
        let n_test = (n as f64 * (1. - training_fraction)).round() as usize;

        let mut test = sample(rng, n, n_test).into_vec();
        test.sort_unstable();
        let training = (0..n).filter(|i| test.binary_search(i).is_err())
                             .collect::<Vec<_>>();

        debug!(class = class.as_str(), training = training.len(), test = test.len(), "holdout");
        sets.insert_class(class, probes.select(Axis(1), &training), probes.select(Axis(1), &test));
    }

    Ok(sets)
}

/// k-fold cross validation.
///
/// All probes are shuffled together and cut into `folds` blocks of
/// `total / folds` probes; fold `i` tests on block `i` and trains on
/// everything else, including any remainder probes.
pub fn k_fold<R: Rng>(classes: &ProbesByClass, folds: usize, rng: &mut R) -> Result<Vec<ClassSets>> {
    attribute_count(classes)?;
    let index = probe_index(classes);
    let total = index.len();
    if folds < 2 || folds > total {
        return Err(Error::InvalidInput(format!(
            "number of folds must lie between 2 and {}, got {}", total, folds
        )));
    }

    let mut order = (0..total).collect::<Vec<_>>();
    order.shuffle(rng);
    let block = total / folds;

    Ok((0..folds).map(|fold| {
                     let held_out = order[fold * block..(fold + 1) * block].iter()
                                                                          .cloned()
                                                                          .collect::<HashSet<_>>();
                     let (test, training): (Vec<usize>, Vec<usize>) =
                         order.iter().partition(|&&i| held_out.contains(&i));
                     gather(classes, &index, &training, &test)
                 })
                 .collect())
}

/// Bootstrap resampling.
///
/// Each trial draws `total` probes with replacement for training; the
/// probes never drawn form the test set.
pub fn bootstrap<R: Rng>(classes: &ProbesByClass, trials: usize,
                         rng: &mut R) -> Result<Vec<ClassSets>> {
    attribute_count(classes)?;
    if trials == 0 {
        return Err(Error::InvalidInput("at least one bootstrap trial is needed".to_string()));
    }
    let index = probe_index(classes);
    let total = index.len();

    Ok((0..trials).map(|_| {
                      let mut drawn = vec![false; total];
                      let training = (0..total).map(|_| rng.gen_range(0..total))
                                               .inspect(|&i| drawn[i] = true)
                                               .collect::<Vec<_>>();
                      let test = (0..total).filter(|&i| !drawn[i]).collect::<Vec<_>>();
                      gather(classes, &index, &training, &test)
                  })
                  .collect())
}

/// (class position, column) of every probe, class by class.
fn probe_index(classes: &ProbesByClass) -> Vec<(usize, usize)> {
    classes.values()
           .enumerate()
           .flat_map(|(c, probes)| (0..probes.ncols()).map(move |column| (c, column)))
           .collect()
}

/// Builds class sets from global probe indices. Duplicate indices give
/// duplicate probes.
fn gather(classes: &ProbesByClass, index: &[(usize, usize)], training: &[usize],
          test: &[usize]) -> ClassSets {
    let columns = |indices: &[usize], c: usize| {
        indices.iter()
               .map(|&i| index[i])
               .filter(|&(class, _)| class == c)
               .map(|(_, column)| column)
               .collect::<Vec<_>>()
    };

    let mut sets = ClassSets::new();
    for (c, (class, probes)) in classes.iter().enumerate() {
        sets.insert_class(class,
                          probes.select(Axis(1), &columns(training, c)),
                          probes.select(Axis(1), &columns(test, c)));
    }

    sets
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcg_rand::Pcg32;
    use rand::SeedableRng;

    fn classes() -> ProbesByClass {
        let mut classes = ProbesByClass::new();
        classes.insert("A".to_string(), array![[1., 2., 3., 4., 5., 6., 7., 8., 9., 10.]]);
        classes.insert("B".to_string(), array![[11., 12., 13., 14., 15.]]);
        classes
    }

    fn sorted_values(probes: &Array2<f64>) -> Vec<f64> {
        let mut values = probes.iter().cloned().collect::<Vec<_>>();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        values
    }

    #[test]
    fn holdout_is_stratified() {
        let mut rng = Pcg32::seed_from_u64(1);
        let sets = holdout(&classes(), 0.7, &mut rng).unwrap();

        assert_eq!(sets.len(), 4);
        assert_eq!(sets.get("A_training").unwrap().ncols(), 7);
        assert_eq!(sets.get("A_test").unwrap().ncols(), 3);
        // round(5 * 0.3) = 2
        assert_eq!(sets.get("B_training").unwrap().ncols(), 3);
        assert_eq!(sets.get("B_test").unwrap().ncols(), 2);

        let mut a = sorted_values(sets.get("A_training").unwrap());
        a.extend(sorted_values(sets.get("A_test").unwrap()));
        a.sort_by(|x, y| x.partial_cmp(y).unwrap());
        assert_eq!(a, (1..=10).map(f64::from).collect::<Vec<_>>());
    }

    #[test]
    fn holdout_rejects_bad_fraction() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(holdout(&classes(), 0., &mut rng).is_err());
        assert!(holdout(&classes(), 1., &mut rng).is_err());
        assert!(holdout(&ProbesByClass::new(), 0.5, &mut rng).is_err());
    }

    #[test]
    fn seeded_splits_are_reproducible() {
        let first = k_fold(&classes(), 3, &mut Pcg32::seed_from_u64(9)).unwrap();
        let second = k_fold(&classes(), 3, &mut Pcg32::seed_from_u64(9)).unwrap();

        assert_eq!(first, second);
    }

    /// Every probe lands in exactly one test block, except for the
    /// remainder, which only ever trains.
    #[test]
    fn k_fold_blocks() {
        let folds = k_fold(&classes(), 4, &mut Pcg32::seed_from_u64(3)).unwrap();
        assert_eq!(folds.len(), 4);

        let mut tested = vec![];
        for sets in &folds {
            let n_test = sets.get("A_test").unwrap().ncols() + sets.get("B_test").unwrap().ncols();
            let n_training = sets.get("A_training").unwrap().ncols()
                + sets.get("B_training").unwrap().ncols();
            assert_eq!(n_test, 15 / 4);
            assert_eq!(n_training, 15 - 15 / 4);

            tested.extend(sorted_values(sets.get("A_test").unwrap()));
            tested.extend(sorted_values(sets.get("B_test").unwrap()));
        }

        let unique = tested.iter().map(|v| *v as i64).collect::<HashSet<_>>();
        assert_eq!(unique.len(), tested.len());
        assert_eq!(tested.len(), 12);
    }

    #[test]
    fn k_fold_rejects_bad_fold_count() {
        let mut rng = Pcg32::seed_from_u64(3);
        assert!(k_fold(&classes(), 1, &mut rng).is_err());
        assert!(k_fold(&classes(), 16, &mut rng).is_err());
    }

    #[test]
    fn bootstrap_tests_on_undrawn_probes() {
        let trials = bootstrap(&classes(), BOOTSTRAP_TRIALS, &mut Pcg32::seed_from_u64(5)).unwrap();
        assert_eq!(trials.len(), BOOTSTRAP_TRIALS);

        for sets in &trials {
            let n_training = sets.get("A_training").unwrap().ncols()
                + sets.get("B_training").unwrap().ncols();
            assert_eq!(n_training, 15);

            let mut training = sorted_values(sets.get("A_training").unwrap());
            training.extend(sorted_values(sets.get("B_training").unwrap()));
            for class in &["A_test", "B_test"] {
                for value in sets.get(class).unwrap().iter() {
                    assert!(!training.contains(value));
                }
            }
        }

        assert!(bootstrap(&classes(), 0, &mut Pcg32::seed_from_u64(5)).is_err());
    }
}
