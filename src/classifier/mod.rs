//! Module defining distance-based classifiers.
//!
//! A `Classifier` is trained on the `_training` sets of a `ClassSets`
//! mapping and evaluated on its `_test` sets; `train()` returns the
//! percentage of test probes assigned to their own class.
//!
//! Every classifier assigns a probe to the class at the smallest
//! distance. Ties go to the class whose name sorts first.
pub mod knm;
pub mod knn;
pub mod nm;
pub mod nn;

pub use self::knm::KNM;
pub use self::knn::KNN;
pub use self::nm::{MeanModel, NM};
pub use self::nn::NN;

use crate::error::{Error, Result};
use crate::probes::{AttributeSelection, ClassSets, Partition};

/// A classifier evaluated on labelled probe sets.
pub trait Classifier {
    /// Trains on the training sets of `class_sets` and returns the
    /// percentage (0 to 100) of test probes classified correctly.
    ///
    /// # Arguments
    ///
    /// * `class_sets` - Mapping from `<ClassName>_training` and
    ///                  `<ClassName>_test` keys to probe matrices.
    /// * `selected` - Attribute indices to use.
    /// * `k` - Neighbour count, for classifiers that take one.
    fn train(&mut self, class_sets: &ClassSets, selected: &AttributeSelection,
             k: Option<usize>) -> Result<f64> {
        let partition = Partition::from_class_sets(class_sets)?;
        self.evaluate(&partition, selected, k)?.accuracy()
    }

    /// Trains on the training probes of `partition` and classifies
    /// every one of its test probes.
    fn evaluate(&mut self, partition: &Partition, selected: &AttributeSelection,
                k: Option<usize>) -> Result<Evaluation>;
}

/// Success and failure counts over a test set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub successes: usize,
    pub failures: usize,
}

impl Evaluation {
    /// Counts a probe of class `truth`; a probe that could not be
    /// assigned to any class is a failure.
    pub fn record(&mut self, truth: usize, predicted: Option<usize>) {
        if predicted == Some(truth) {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.successes + self.failures
    }

    /// Percentage of successes.
    pub fn accuracy(&self) -> Result<f64> {
        match self.total() {
            0 => Err(Error::EmptyEvaluationSet("no test probes were classified".to_string())),
            total => Ok(self.successes as f64 / total as f64 * 100.),
        }
    }
}

/// Label at the smallest distance, if any distance is finite.
///
/// Only a strictly smaller distance replaces the current best, so the
/// lowest label wins ties.
pub fn closest_class(distances: &[f64]) -> Option<usize> {
    let mut closest = None;
    let mut smallest = f64::INFINITY;

    for (y, &distance) in distances.iter().enumerate() {
        if distance < smallest {
            smallest = distance;
            closest = Some(y);
        }
    }

    closest
}

fn reject_neighbour_count(classifier: &str, k: Option<usize>) -> Result<()> {
    match k {
        None => Ok(()),
        Some(k) => Err(Error::InvalidInput(format!(
            "{} does not take a neighbour count (got k = {})", classifier, k
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_class_breaks_ties_by_label() {
        assert_eq!(closest_class(&[2., 1., 1.]), Some(1));
        assert_eq!(closest_class(&[0.5, 0.5]), Some(0));
        assert_eq!(closest_class(&[f64::INFINITY, f64::INFINITY]), None);
        assert_eq!(closest_class(&[f64::NAN, 3.]), Some(1));
        assert_eq!(closest_class(&[]), None);
    }

    #[test]
    fn accuracy() {
        let mut evaluation = Evaluation::default();
        assert!(evaluation.accuracy().is_err());

        evaluation.record(0, Some(0));
        evaluation.record(1, Some(0));
        evaluation.record(1, None);
        evaluation.record(1, Some(1));

        assert_eq!(evaluation, Evaluation { successes: 2, failures: 2 });
        assert_eq!(evaluation.accuracy().unwrap(), 50.);
    }
}
