//! Sub-cluster discovery.
//!
//! `ClusterFinder` grows the number of clusters `m = 1, 2, ...` inside
//! one class and runs Lloyd iterations (k-means) for each `m`. It stops
//! at the first `m` whose distortion is not a significant improvement
//! over `m - 1`, or whose iterations leave a cluster empty, and keeps
//! the configuration for `m - 1`.
use ndarray::prelude::*;
use pcg_rand::Pcg32;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::linalg::{euclidean_distance, mean};

/// Lloyd iterations stop once no centroid moves further than this.
pub const CENTROID_TOLERANCE: f64 = 1e-6;
/// Minimum relative distortion reduction for accepting one more cluster.
pub const SIGNIFICANT_REDUCTION: f64 = 0.1;
/// Upper bound on Lloyd iterations per cluster count.
pub const MAX_ITERATIONS: usize = 1000;

/// A centroid and the probes closest to it (one probe per column).
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    pub centroid: Array1<f64>,
    pub probes: Array2<f64>,
}

impl Cluster {
    /// Number of member probes.
    pub fn len(&self) -> usize {
        self.probes.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.ncols() == 0
    }
}

/// Some centroid ended up with no members.
#[derive(Debug)]
struct EmptyCluster;

/// Adaptive k-means over the probes of one class.
pub struct ClusterFinder<R: Rng> {
    rng: R,
    tolerance: f64,
    significance: f64,
    max_iterations: usize,
    max_clusters: Option<usize>,
}

impl ClusterFinder<Pcg32> {
    /// Cluster finder with a seeded PRNG, for reproducible runs.
    pub fn seeded(seed: u64) -> ClusterFinder<Pcg32> {
        ClusterFinder::new(Pcg32::seed_from_u64(seed))
    }

    pub fn from_entropy() -> ClusterFinder<Pcg32> {
        ClusterFinder::new(Pcg32::from_entropy())
    }
}

impl<R: Rng> ClusterFinder<R> {
    /// Constructs a cluster finder drawing its initial centroids from `rng`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ndarray::array;
    /// use nearest_class::cluster::ClusterFinder;
    ///
    /// let probes = array![[0., 0., 10., 10.],
    ///                     [0., 1., 10., 11.]];
    /// let mut finder = ClusterFinder::seeded(0).with_max_clusters(2);
    /// let clusters = finder.assign_to_clusters(&probes.view()).unwrap();
    ///
    /// assert_eq!(clusters.len(), 2);
    /// ```
    pub fn new(rng: R) -> ClusterFinder<R> {
        ClusterFinder {
            rng,
            tolerance: CENTROID_TOLERANCE,
            significance: SIGNIFICANT_REDUCTION,
            max_iterations: MAX_ITERATIONS,
            max_clusters: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Relative distortion reduction that counts as significant.
    pub fn with_significance(mut self, significance: f64) -> Self {
        self.significance = significance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Never return more than `max_clusters` clusters.
    pub fn with_max_clusters(mut self, max_clusters: usize) -> Self {
        self.max_clusters = Some(max_clusters.max(1));
        self
    }

    /// Partitions `probes` (one per column) into non-empty clusters.
    ///
    /// With a single cluster the centroid is the mean of all probes.
    pub fn assign_to_clusters(&mut self, probes: &ArrayView2<f64>) -> Result<Vec<Cluster>> {
        if probes.ncols() == 0 {
            return Err(Error::InsufficientProbes { required: 1, found: 0 });
        }

        let mut accepted: Option<Vec<Cluster>> = None;
        let mut previous_error = f64::INFINITY;
        let mut m = 1;

        loop {
            if self.max_clusters.map_or(false, |max| m > max) {
                break;
            }

            let centroids = if m == 1 {
                vec![mean(probes)?]
            } else {
                match self.lloyd(probes, m) {
                    Ok(centroids) => centroids,
                    Err(EmptyCluster) => {
                        debug!(clusters = m, "empty cluster, keeping previous configuration");
                        break;
                    }
                }
            };
            let clusters = match assign(probes, centroids) {
                Ok(clusters) => clusters,
                Err(EmptyCluster) => {
                    debug!(clusters = m, "empty cluster, keeping previous configuration");
                    break;
                }
            };

            let error = distortion(&clusters);
            debug!(clusters = m, distortion = error, "clustered");

            if m > 1 && !self.is_significant(previous_error, error) {
                debug!(clusters = m, "insignificant reduction, keeping previous configuration");
                break;
            }

            accepted = Some(clusters);
            previous_error = error;
            m += 1;
        }

        accepted.ok_or(Error::InsufficientProbes { required: 1, found: probes.ncols() })
    }

    /// Whether going from distortion `previous` to `current` is worth an
    /// extra cluster.
    fn is_significant(&self, previous: f64, current: f64) -> bool {
        (previous - current).abs() > self.significance * previous
    }

    /// Runs Lloyd iterations for `m` clusters from randomly drawn probes.
    fn lloyd(&mut self, probes: &ArrayView2<f64>, m: usize)
            -> std::result::Result<Vec<Array1<f64>>, EmptyCluster> {
        let n = probes.ncols();
        if m > n {
            return Err(EmptyCluster);
        }

        let mut centroids = sample(&mut self.rng, n, m).into_iter()
                                                       .map(|i| probes.column(i).to_owned())
                                                       .collect::<Vec<_>>();

        for _ in 0..self.max_iterations {
            let mut updated = Vec::with_capacity(m);
            for indices in nearest_members(probes, &centroids) {
                if indices.is_empty() {
                    return Err(EmptyCluster);
                }
                updated.push(probes.select(Axis(1), &indices)
                                   .mean_axis(Axis(1))
                                   .ok_or(EmptyCluster)?);
            }

            let displacement = centroids.iter()
                                        .zip(updated.iter())
                                        .map(|(old, new)| euclidean_distance(&old.view(), &new.view()))
                                        .fold(0., f64::max);
            centroids = updated;

            if displacement <= self.tolerance {
                return Ok(centroids);
            }
        }

        warn!(clusters = m, iterations = self.max_iterations,
              "centroids did not settle, keeping last positions");
        Ok(centroids)
    }
}

/// Indices of the probes closest to each centroid; the first centroid
/// wins ties.
fn nearest_members(probes: &ArrayView2<f64>, centroids: &[Array1<f64>]) -> Vec<Vec<usize>> {
    let mut members = vec![Vec::new(); centroids.len()];

    for (i, probe) in probes.axis_iter(Axis(1)).enumerate() {
        let mut nearest = 0;
        let mut smallest = f64::INFINITY;
        for (c, centroid) in centroids.iter().enumerate() {
            let distance = euclidean_distance(&probe, &centroid.view());
            if distance < smallest {
                smallest = distance;
                nearest = c;
            }
        }
        members[nearest].push(i);
    }

    members
}

fn assign(probes: &ArrayView2<f64>, centroids: Vec<Array1<f64>>)
        -> std::result::Result<Vec<Cluster>, EmptyCluster> {
    let members = nearest_members(probes, &centroids);

    centroids.into_iter()
             .zip(members)
             .map(|(centroid, indices)| {
                 if indices.is_empty() {
                     Err(EmptyCluster)
                 } else {
                     Ok(Cluster { centroid, probes: probes.select(Axis(1), &indices) })
                 }
             })
             .collect()
}

/// Mean over clusters of the mean Euclidean distance between each
/// member and its centroid.
pub fn distortion(clusters: &[Cluster]) -> f64 {
    if clusters.is_empty() {
        return 0.;
    }

    let total = clusters.iter()
                        .filter(|cluster| !cluster.is_empty())
                        .map(|cluster| {
                            cluster.probes
                                   .axis_iter(Axis(1))
                                   .map(|x| euclidean_distance(&x, &cluster.centroid.view()))
                                   .sum::<f64>() / cluster.len() as f64
                        })
                        .sum::<f64>();

    total / clusters.len() as f64
}
