//! Nearest neighbour classifier.
use super::{Classifier, Evaluation, KNN};
use crate::error::{Error, Result};
use crate::probes::{AttributeSelection, Partition};

/// A nearest neighbour classifier: k-NN with `k = 1`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NN;

impl NN {
    pub fn new() -> NN {
        NN
    }
}

impl Classifier for NN {
    /// Classifies the test probes of `partition` by their single
    /// nearest training probe. `k` may be omitted or 1.
    fn evaluate(&mut self, partition: &Partition, selected: &AttributeSelection,
                k: Option<usize>) -> Result<Evaluation> {
        match k {
            None | Some(1) => KNN::new(1).evaluate(partition, selected, Some(1)),
            Some(k) => Err(Error::InvalidInput(format!(
                "nearest neighbour always uses one neighbour (got k = {})", k
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::ClassSets;
    use ndarray::prelude::*;

    #[test]
    fn same_as_one_nearest_neighbour() {
        let mut sets = ClassSets::new();
        sets.insert_class("A", array![[0., 1., 5.], [0., 1., 5.]], array![[0.5, 4.8], [0.5, 4.9]]);
        sets.insert_class("B", array![[3., 4.], [3., 3.]], array![[3.2, 0.9], [3.1, 1.1]]);
        let all = AttributeSelection::all();

        let nn = NN::new().train(&sets, &all, None).unwrap();
        let knn = KNN::new(1).train(&sets, &all, Some(1)).unwrap();

        assert_eq!(nn, knn);
        assert_eq!(nn, 75.);
    }

    #[test]
    fn rejects_other_neighbour_counts() {
        let mut sets = ClassSets::new();
        sets.insert_class("A", array![[0., 1.]], array![[0.5]]);
        sets.insert_class("B", array![[3., 4.]], array![[3.5]]);
        let all = AttributeSelection::all();

        assert_eq!(NN::new().train(&sets, &all, Some(1)).unwrap(), 100.);
        assert!(NN::new().train(&sets, &all, Some(2)).is_err());
    }
}
