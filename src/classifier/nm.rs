//! Nearest mean classifier with Mahalanobis distance.
use ndarray::prelude::*;
use tracing::debug;

use super::{closest_class, reject_neighbour_count, Classifier, Evaluation};
use crate::error::Result;
use crate::linalg::{covariance, invert, mahalanobis, mean, Inverse};
use crate::probes::{AttributeSelection, Partition};

/// Mean and inverse covariance of a set of probes.
#[derive(Clone, Debug, PartialEq)]
pub struct MeanModel {
    pub centroid: Array1<f64>,
    pub inverse: Inverse,
}

impl MeanModel {
    /// Fits a model to `probes`, which must hold at least two probes.
    pub fn fit(probes: &ArrayView2<f64>) -> Result<MeanModel> {
        let centroid = mean(probes)?;
        MeanModel::around(probes, centroid)
    }

    /// Fits the covariance of `probes` around a given centroid.
    pub fn around(probes: &ArrayView2<f64>, centroid: Array1<f64>) -> Result<MeanModel> {
        let cov = covariance(probes, &centroid.view())?;
        let inverse = invert(&cov)?;

        Ok(MeanModel { centroid, inverse })
    }

    /// Squared Mahalanobis distance from `x` to the centroid.
    pub fn distance(&self, x: &ArrayView1<f64>) -> f64 {
        mahalanobis(x, &self.centroid.view(), &self.inverse.matrix)
    }
}

/// A nearest mean classifier.
///
/// Each class is summarised by the mean and covariance of its training
/// probes; a test probe goes to the class at the smallest Mahalanobis
/// distance.
#[derive(Clone, Copy, Debug, Default)]
pub struct NM;

impl NM {
    pub fn new() -> NM {
        NM
    }

    /// Fits one model per class of `partition`.
    pub fn fit(partition: &Partition) -> Result<Vec<MeanModel>> {
        (0..partition.n_classes()).map(|y| {
            let model = MeanModel::fit(&partition.training(y).view())?;
            debug!(class = partition.class_name(y), method = ?model.inverse.method,
                   "fitted class mean");
            Ok(model)
        })
        .collect()
    }
}

impl Classifier for NM {
    /// Classifies the test probes of `partition`.
    ///
    /// At least one attribute must be selected, every class needs two
    /// or more training probes, and `k` must be `None`.
    fn evaluate(&mut self, partition: &Partition, selected: &AttributeSelection,
                k: Option<usize>) -> Result<Evaluation> {
        reject_neighbour_count("nearest mean", k)?;
        let attributes = selected.require(partition.n_attributes())?;
        let partition = partition.select_attributes(&attributes)?;
        let models = NM::fit(&partition)?;

        let mut evaluation = Evaluation::default();
        for (truth, x) in partition.test_probes() {
            let distances = models.iter()
                                  .map(|model| model.distance(&x))
                                  .collect::<Vec<_>>();
            evaluation.record(truth, closest_class(&distances));
        }

        Ok(evaluation)
    }
}
