//! The nearest-class crate.
//!
//! A crate implementing distance-based statistical pattern classifiers
//! and the machinery to evaluate them on labelled probe sets.
//!
//! # Classifiers
//! * `NN`: nearest neighbour.
//! * `KNN`: majority vote among the k nearest training probes.
//! * `NM`: nearest class mean under Mahalanobis distance.
//! * `KNM`: nearest sub-cluster mean under Mahalanobis distance, with
//!   sub-clusters found by adaptive k-means (`ClusterFinder`).
//!
//! Every classifier is trained on a `ClassSets` mapping, whose keys are
//! `<ClassName>_training` and `<ClassName>_test`, and returns the
//! percentage of test probes it assigns to their own class. Probes are
//! stored column-wise: rows are attributes, columns are probes.
//!
//! # Examples
//!
//! Train a nearest mean classifier on two one-dimensional classes.
//!
//! ```
//! # use ndarray::array;
//! use nearest_class::classifier::{Classifier, NM};
//! use nearest_class::probes::{AttributeSelection, ClassSets};
//!
//! let mut sets = ClassSets::new();
//! sets.insert_class("A", array![[1., 2., 3., 4.]], array![[1.5]]);
//! sets.insert_class("B", array![[10., 11., 12., 13.]], array![[12.5]]);
//!
//! let selected: AttributeSelection = vec![0].into();
//! let mut nm = NM::new();
//! let accuracy = nm.train(&sets, &selected, None)
//!                  .expect("Failed to train");
//! assert_eq!(accuracy, 100.);
//! ```
//!
//! Splitters in `split` produce `ClassSets` from unsplit data, and
//! `select` picks attributes for two-class problems.
pub mod classifier;
pub mod cluster;
pub mod error;
pub mod linalg;
pub mod probes;
pub mod select;
pub mod split;
pub mod utils;

pub use crate::classifier::{Classifier, Evaluation, KNM, KNN, NM, NN};
pub use crate::cluster::{Cluster, ClusterFinder};
pub use crate::error::{Error, Result};
pub use crate::probes::{AttributeSelection, ClassSets, Partition, ProbesByClass};
