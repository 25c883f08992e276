//! k-nearest neighbours classifier.
use std::collections::BinaryHeap;

use ndarray::prelude::*;
use ordered_float::OrderedFloat;
use tracing::debug;

use super::{Classifier, Evaluation};
use crate::error::{Error, Result};
use crate::linalg::euclidean_distance;
use crate::probes::{AttributeSelection, Partition};

/// A k-NN classifier.
///
/// A test probe gets the majority label among its `k` nearest training
/// probes. Equal distances rank the lower label first, and so do equal
/// vote counts.
pub struct KNN {
    k: usize,
    distance: fn(&ArrayView1<f64>, &ArrayView1<f64>) -> f64,
}

impl KNN {
    /// Constructs a k-NN classifier with Euclidean distance.
    ///
    /// # Arguments
    ///
    /// `k` - Number of nearest neighbours, used when `train()` is not
    ///       given one.
    ///
    /// # Examples
    ///
    /// ```
    /// use nearest_class::classifier::KNN;
    ///
    /// let knn = KNN::new(3);
    /// assert_eq!(knn.k(), 3);
    /// ```
    pub fn new(k: usize) -> KNN {
        KNN { k, distance: euclidean_distance }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Predicts the label of `x` from its `k` nearest training probes.
    ///
    /// Returns `None` only if there are no training probes.
    pub fn predict(&self, partition: &Partition, x: &ArrayView1<f64>, k: usize) -> Option<usize> {
        let n_classes = partition.n_classes();
        let mut neighbours = Vec::with_capacity(k * n_classes);

        for y in 0..n_classes {
            let distances = partition.training(y)
                                     .axis_iter(Axis(1))
                                     .map(|t| (self.distance)(&t, x));
            neighbours.extend(k_smallest(distances, k).into_iter().map(|d| (d, y)));
        }
        neighbours.sort();

        let mut votes = vec![0; n_classes];
        for &(_, y) in neighbours.iter().take(k) {
            votes[y] += 1;
        }

        majority(&votes)
    }
}

/// The `k` smallest distances, kept in a bounded max-heap.
fn k_smallest<I>(distances: I, k: usize) -> Vec<OrderedFloat<f64>>
        where I: Iterator<Item = f64> {
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for d in distances {
        heap.push(OrderedFloat(d));
        if heap.len() > k {
            heap.pop();
        }
    }

    heap.into_vec()
}

/// Label with the most votes; the lowest label wins ties.
fn majority(votes: &[usize]) -> Option<usize> {
    let mut winner = None;
    let mut most = 0;

    for (y, &count) in votes.iter().enumerate() {
        if count > most {
            most = count;
            winner = Some(y);
        }
    }

    winner
}

impl Classifier for KNN {
    /// Classifies the test probes of `partition`.
    ///
    /// An empty selection uses every attribute. `k` overrides the
    /// neighbour count given to `new()` and must lie between 1 and the
    /// total number of training probes.
    fn evaluate(&mut self, partition: &Partition, selected: &AttributeSelection,
                k: Option<usize>) -> Result<Evaluation> {
        let k = k.unwrap_or(self.k);
        let max = partition.n_training_probes();
        if k == 0 || k > max {
            return Err(Error::InvalidNeighbourCount { k, max });
        }

        let attributes = selected.resolve(partition.n_attributes())?;
        let partition = partition.select_attributes(&attributes)?;
        debug!(k, attributes = attributes.len(), "k-NN evaluation");

        let mut evaluation = Evaluation::default();
        for (truth, x) in partition.test_probes() {
            evaluation.record(truth, self.predict(&partition, &x, k));
        }

        Ok(evaluation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::ClassSets;

    fn partition(sets: &ClassSets) -> Partition {
        Partition::from_class_sets(sets).unwrap()
    }

    #[test]
    fn k_smallest_distances() {
        let mut smallest = k_smallest(vec![5., 1., 4., 2., 3.].into_iter(), 3);
        smallest.sort();

        assert_eq!(smallest, vec![OrderedFloat(1.), OrderedFloat(2.), OrderedFloat(3.)]);
        assert_eq!(k_smallest(vec![2.].into_iter(), 3), vec![OrderedFloat(2.)]);
    }

    #[test]
    fn majority_vote() {
        assert_eq!(majority(&[1, 2, 0]), Some(1));
        assert_eq!(majority(&[1, 1]), Some(0));
        assert_eq!(majority(&[0, 0]), None);
    }

    /// The three nearest training probes are A (1.0), B (1.5) and
    /// B (1.8), so B wins 2 to 1.
    #[test]
    fn majority_of_nearest() {
        let mut sets = ClassSets::new();
        sets.insert_class("A", array![[1.0, 2.0]], array![[0.]]);
        sets.insert_class("B", array![[1.5, 1.8, 2.5]], array![[0.]]);
        let partition = partition(&sets);

        let knn = KNN::new(3);
        let x = array![0.];
        assert_eq!(knn.predict(&partition, &x.view(), 3), partition.label("B"));
        assert_eq!(knn.predict(&partition, &x.view(), 1), partition.label("A"));
    }

    /// A probe at equal distance from both classes goes to the class
    /// whose name sorts first.
    #[test]
    fn equidistant_probe_goes_to_first_class() {
        let mut sets = ClassSets::new();
        sets.insert_class("Zeta", array![[1.]], array![[0.]]);
        sets.insert_class("Alpha", array![[-1.]], array![[0.]]);
        let partition = partition(&sets);

        let knn = KNN::new(1);
        assert_eq!(knn.predict(&partition, &array![0.].view(), 1), partition.label("Alpha"));
        assert_eq!(knn.predict(&partition, &array![0.].view(), 2), partition.label("Alpha"));
    }

    #[test]
    fn neighbour_count_is_checked() {
        let mut sets = ClassSets::new();
        sets.insert_class("A", array![[1.0, 2.0]], array![[0.]]);
        sets.insert_class("B", array![[1.5]], array![[0.]]);

        let mut knn = KNN::new(3);
        let all = AttributeSelection::all();
        assert!(knn.train(&sets, &all, None).is_ok());

        match knn.train(&sets, &all, Some(4)) {
            Err(Error::InvalidNeighbourCount { k: 4, max: 3 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        match knn.train(&sets, &all, Some(0)) {
            Err(Error::InvalidNeighbourCount { k: 0, .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn evaluate_with_selected_attributes() {
        let mut sets = ClassSets::new();
        // The first attribute is noise, the second one separates.
        sets.insert_class("A", array![[5., 0., 9.], [0., 1., 0.5]], array![[9., 0.], [0.2, 0.7]]);
        sets.insert_class("B", array![[0., 9., 5.], [10., 11., 10.5]], array![[0.], [10.2]]);

        let mut knn = KNN::new(1);
        let second: AttributeSelection = vec![1].into();
        assert_eq!(knn.train(&sets, &second, None).unwrap(), 100.);
        assert!(knn.train(&sets, &vec![2].into(), None).is_err());
    }
}
