//! k-nearest means classifier.
//!
//! Every class is split into sub-clusters by a `ClusterFinder`, and
//! each usable sub-cluster is summarised by its mean and covariance.
//! The distance of a probe to a class is its smallest Mahalanobis
//! distance to any of the class's sub-clusters.
use ndarray::prelude::*;
use pcg_rand::Pcg32;
use rand::Rng;
use tracing::{debug, warn};

use super::{closest_class, reject_neighbour_count, Classifier, Evaluation, MeanModel};
use crate::cluster::{Cluster, ClusterFinder};
use crate::error::{Error, Result};
use crate::probes::{AttributeSelection, Partition};

/// Default number of clustering attempts per class.
pub const MAX_CLUSTERING_ATTEMPTS: usize = 5;

/// A k-nearest means classifier.
pub struct KNM<R: Rng = Pcg32> {
    finder: ClusterFinder<R>,
    max_attempts: usize,
}

impl KNM<Pcg32> {
    /// Constructs a k-nearest means classifier.
    ///
    /// # Arguments
    ///
    /// * `seed` - PRNG seed for the initial cluster centroids. If
    ///            `None`, the PRNG is seeded from system entropy.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ndarray::array;
    /// use nearest_class::classifier::{Classifier, KNM};
    /// use nearest_class::probes::ClassSets;
    ///
    /// let mut sets = ClassSets::new();
    /// sets.insert_class("A", array![[1., 2., 3., 4., 2.5]], array![[2.]]);
    /// sets.insert_class("B", array![[10., 12., 11., 13., 11.5]], array![[11.]]);
    ///
    /// let mut knm = KNM::new(Some(0));
    /// let accuracy = knm.train(&sets, &vec![0].into(), None).unwrap();
    /// assert!(accuracy >= 0. && accuracy <= 100.);
    /// ```
    pub fn new(seed: Option<u64>) -> KNM<Pcg32> {
        let finder = match seed {
            Some(seed) => ClusterFinder::seeded(seed),
            None => ClusterFinder::from_entropy(),
        };
        KNM::with_cluster_finder(finder)
    }
}

impl<R: Rng> KNM<R> {
    /// Constructs a k-nearest means classifier around a configured
    /// cluster finder.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ndarray::array;
    /// use nearest_class::classifier::{Classifier, KNM};
    /// use nearest_class::cluster::ClusterFinder;
    /// use nearest_class::probes::ClassSets;
    ///
    /// let mut sets = ClassSets::new();
    /// sets.insert_class("A", array![[1., 2., 3., 4.]], array![[2.]]);
    /// sets.insert_class("B", array![[10., 12., 11., 13.]], array![[11.]]);
    ///
    /// let finder = ClusterFinder::seeded(0).with_max_clusters(2);
    /// let mut knm = KNM::with_cluster_finder(finder);
    /// assert_eq!(knm.train(&sets, &vec![0].into(), None).unwrap(), 100.);
    /// ```
    pub fn with_cluster_finder(finder: ClusterFinder<R>) -> KNM<R> {
        KNM { finder, max_attempts: MAX_CLUSTERING_ATTEMPTS }
    }

    /// Number of times a class is clustered before giving up on it.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Clusters the probes of one class and fits its sub-cluster models.
    ///
    /// Sub-clusters with fewer than two probes, or whose covariance is
    /// rank deficient, are skipped, so the result may be empty. If a
    /// covariance cannot be inverted at all, the class is clustered
    /// again with fresh random centroids.
    ///
    /// With a single cluster the model matches `NM`'s only when the
    /// covariance has full rank. `NM` keeps a rank deficient class and
    /// measures with its pseudoinverse, while here the class gets no
    /// model and an infinite distance.
    pub fn fit_class(&mut self, class: &str, probes: &ArrayView2<f64>) -> Result<Vec<MeanModel>> {
        for attempt in 1..=self.max_attempts {
            let clusters = self.finder.assign_to_clusters(probes)?;
            match sub_cluster_models(&clusters) {
                Ok(models) => {
                    debug!(class, clusters = clusters.len(), usable = models.len(),
                           "fitted sub-clusters");
                    return Ok(models);
                }
                Err(Error::SingularCovariance) => {
                    warn!(class, attempt, "sub-cluster covariance is not invertible, clustering again");
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::ExhaustedRetry { class: class.to_string(), attempts: self.max_attempts })
    }
}

fn sub_cluster_models(clusters: &[Cluster]) -> Result<Vec<MeanModel>> {
    let mut models = Vec::with_capacity(clusters.len());

    for cluster in clusters {
        if cluster.len() < 2 {
            continue;
        }
        let model = MeanModel::around(&cluster.probes.view(), cluster.centroid.clone())?;
        if model.inverse.determinant == 0. {
            debug!(probes = cluster.len(), "skipping sub-cluster with singular covariance");
            continue;
        }
        models.push(model);
    }

    Ok(models)
}

/// Smallest distance from `x` to any sub-cluster; infinite if there
/// are none.
pub fn class_distance(models: &[MeanModel], x: &ArrayView1<f64>) -> f64 {
    models.iter()
          .map(|model| model.distance(x))
          .fold(f64::INFINITY, f64::min)
}

impl<R: Rng> Classifier for KNM<R> {
    /// Classifies the test probes of `partition`.
    ///
    /// At least one attribute must be selected, every class needs two
    /// or more training probes, and `k` must be `None`. A test probe
    /// that is not at a finite distance from any class counts as
    /// misclassified.
    fn evaluate(&mut self, partition: &Partition, selected: &AttributeSelection,
                k: Option<usize>) -> Result<Evaluation> {
        reject_neighbour_count("k-nearest means", k)?;
        let attributes = selected.require(partition.n_attributes())?;
        let partition = partition.select_attributes(&attributes)?;

        for y in 0..partition.n_classes() {
            let found = partition.training(y).ncols();
            if found < 2 {
                return Err(Error::InsufficientProbes { required: 2, found });
            }
        }

        let mut models = Vec::with_capacity(partition.n_classes());
        for y in 0..partition.n_classes() {
            let class = partition.class_name(y);
            let class_models = self.fit_class(class, &partition.training(y).view())?;
            if class_models.is_empty() {
                warn!(class, "no usable sub-cluster, class cannot be predicted");
            }
            models.push(class_models);
        }

        let mut evaluation = Evaluation::default();
        for (truth, x) in partition.test_probes() {
            let distances = models.iter()
                                  .map(|class_models| class_distance(class_models, &x))
                                  .collect::<Vec<_>>();
            evaluation.record(truth, closest_class(&distances));
        }

        Ok(evaluation)
    }
}
