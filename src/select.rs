//! Attribute selection for two-class problems.
//!
//! Both selectors score attribute subsets with the Fisher linear
//! discriminant `|m_A - m_B| / (det(S_A) + det(S_B))`, where `m` are
//! class means and `S` unnormalised scatter matrices restricted to the
//! subset.
use itertools::Itertools;
use ndarray::prelude::*;
use statrs::statistics::Statistics;
use tracing::debug;

use crate::error::{Error, Result};
use crate::linalg::{determinant, euclidean_distance, mean, scatter};
use crate::probes::{attribute_count, AttributeSelection, ProbesByClass};

/// Fisher discriminant of two classes over the given attribute rows.
pub fn fisher_score(first: &Array2<f64>, second: &Array2<f64>, attributes: &[usize]) -> Result<f64> {
    let first = first.select(Axis(0), attributes);
    let second = second.select(Axis(0), attributes);

    let mean_first = mean(&first.view())?;
    let mean_second = mean(&second.view())?;
    let scatter_first = scatter(&first.view(), &mean_first.view())?;
    let scatter_second = scatter(&second.view(), &mean_second.view())?;

    Ok(euclidean_distance(&mean_first.view(), &mean_second.view())
       / (determinant(&scatter_first) + determinant(&scatter_second)))
}

/// Exhaustive selection: scores every combination of `count`
/// attributes and keeps the best one.
///
/// # Examples
///
/// ```
/// # use ndarray::array;
/// use nearest_class::probes::ProbesByClass;
/// use nearest_class::select::fisher;
///
/// let mut classes = ProbesByClass::new();
/// classes.insert("A".to_string(), array![[1., 5., 9.], [0., 0.1, 0.2]]);
/// classes.insert("B".to_string(), array![[2., 6., 8.], [5., 5.2, 5.1]]);
///
/// let selected = fisher(&classes, 1).unwrap();
/// assert_eq!(selected.iter().collect::<Vec<_>>(), vec![1]);
/// ```
pub fn fisher(classes: &ProbesByClass, count: usize) -> Result<AttributeSelection> {
    let (first, second) = two_classes(classes)?;
    let n_attributes = check_count(classes, count)?;

    let mut best = None;
    let mut best_score = f64::NEG_INFINITY;
    for combination in (0..n_attributes).combinations(count) {
        let score = fisher_score(first, second, &combination)?;
        if score > best_score {
            best_score = score;
            best = Some(combination);
        }
    }

    debug!(score = best_score, attributes = ?best, "exhaustive Fisher selection");
    best.map(AttributeSelection::from)
        .ok_or_else(|| Error::InvalidInput("no attribute subset separates the classes".to_string()))
}

/// Sequential forward selection.
///
/// Starts from the single attribute with the best one-dimensional
/// score `|m_A - m_B| / (s_A + s_B)` (population standard deviations),
/// then greedily adds the attribute that maximises the Fisher
/// discriminant of the grown subset.
pub fn sequential_forward(classes: &ProbesByClass, count: usize) -> Result<AttributeSelection> {
    let (first, second) = two_classes(classes)?;
    let n_attributes = check_count(classes, count)?;

    let mut selected = vec![];
    let mut best = None;
    let mut best_score = f64::NEG_INFINITY;
    for i in 0..n_attributes {
        let score = separation(first.row(i), second.row(i));
        if score > best_score {
            best_score = score;
            best = Some(i);
        }
    }
    match best {
        Some(i) => selected.push(i),
        None => return Err(Error::InvalidInput("no attribute separates the classes".to_string())),
    }

    while selected.len() < count {
        let mut best = None;
        let mut best_score = f64::NEG_INFINITY;
        for candidate in (0..n_attributes).filter(|i| !selected.contains(i)) {
            let mut attributes = selected.clone();
            attributes.push(candidate);
            let score = fisher_score(first, second, &attributes)?;
            if score > best_score {
                best_score = score;
                best = Some(candidate);
            }
        }

        match best {
            Some(i) => {
                debug!(attribute = i, score = best_score, "forward selection step");
                selected.push(i);
            }
            None => {
                return Err(Error::InvalidInput(format!(
                    "no attribute improves a subset of {}", selected.len()
                )))
            }
        }
    }

    Ok(selected.into())
}

fn separation(first: ArrayView1<f64>, second: ArrayView1<f64>) -> f64 {
    let spread = first.iter().population_std_dev() + second.iter().population_std_dev();
    (first.iter().mean() - second.iter().mean()).abs() / spread
}

fn two_classes(classes: &ProbesByClass) -> Result<(&Array2<f64>, &Array2<f64>)> {
    let mut iter = classes.values();
    match (iter.next(), iter.next(), iter.next()) {
        (Some(first), Some(second), None) => Ok((first, second)),
        _ => Err(Error::InvalidInput(format!(
            "attribute selection needs exactly two classes, got {}", classes.len()
        ))),
    }
}

fn check_count(classes: &ProbesByClass, count: usize) -> Result<usize> {
    let n_attributes = attribute_count(classes)?;
    if count == 0 || count > n_attributes {
        return Err(Error::InvalidInput(format!(
            "cannot select {} of {} attributes", count, n_attributes
        )));
    }

    Ok(n_attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Attribute 2 separates the classes, attribute 0 is noise and
    /// attribute 1 separates them weakly.
    fn classes() -> ProbesByClass {
        let mut classes = ProbesByClass::new();
        classes.insert("A".to_string(), array![[1., 5., 9., 3.],
                                               [0., 1., 2., 1.5],
                                               [0., 0.1, 0.2, 0.1]]);
        classes.insert("B".to_string(), array![[2., 6., 8., 4.],
                                               [1., 2.5, 3., 2.],
                                               [5., 5.2, 5.1, 5.05]]);
        classes
    }

    #[test]
    fn fisher_score_of_known_classes() {
        let first = array![[0., 2.]];
        let second = array![[4., 6.]];

        // |1 - 5| / (2 + 2)
        assert_eq!(fisher_score(&first, &second, &[0]).unwrap(), 1.);
    }

    #[test]
    fn exhaustive_selection() {
        let selected = fisher(&classes(), 1).unwrap();
        assert_eq!(selected.iter().collect::<Vec<_>>(), vec![2]);
        assert_eq!(fisher(&classes(), 3).unwrap().len(), 3);
    }

    #[test]
    fn forward_selection_starts_from_best_attribute() {
        let selected = sequential_forward(&classes(), 1).unwrap();
        assert_eq!(selected.iter().collect::<Vec<_>>(), vec![2]);

        let selected = sequential_forward(&classes(), 2).unwrap();
        assert_eq!(selected.len(), 2);
        assert!(selected.contains(2));
    }

    #[test]
    fn rejects_bad_requests() {
        assert!(fisher(&classes(), 0).is_err());
        assert!(fisher(&classes(), 4).is_err());

        let mut three = classes();
        three.insert("C".to_string(), array![[1.], [2.], [3.]]);
        assert!(fisher(&three, 1).is_err());
        assert!(sequential_forward(&three, 1).is_err());
    }
}
