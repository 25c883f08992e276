//! Probe sets.
//!
//! A probe is one feature vector. Probes of one set are stored column-wise
//! in an `Array2<f64>`: rows are attributes, columns are probes.
//!
//! Classifiers consume a `ClassSets` mapping whose keys come in pairs,
//! `<ClassName>_training` and `<ClassName>_test`. `Partition` is the
//! validated form of such a mapping, where every class is identified by
//! its label `y`, the position of its name in lexicographic order.
use std::collections::{BTreeMap, BTreeSet};
use std::iter::FromIterator;

use ndarray::prelude::*;

use crate::error::{Error, Result};

/// Suffix of the keys holding training probes.
pub const TRAINING_SUFFIX: &str = "_training";
/// Suffix of the keys holding test probes.
pub const TEST_SUFFIX: &str = "_test";

/// Unsplit probes of each class, keyed by class name.
pub type ProbesByClass = BTreeMap<String, Array2<f64>>;

/// Whether a set of probes is used for training or for evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetRole {
    Training,
    Test,
}

impl SetRole {
    pub fn suffix(self) -> &'static str {
        match self {
            SetRole::Training => TRAINING_SUFFIX,
            SetRole::Test => TEST_SUFFIX,
        }
    }
}

/// Builds the key of a class set, e.g. `Alpha_training`.
pub fn set_key(class: &str, role: SetRole) -> String {
    format!("{}{}", class, role.suffix())
}

/// Splits a set key into its class name and role.
///
/// # Examples
///
/// ```
/// use nearest_class::probes::{parse_set_key, SetRole};
///
/// assert_eq!(parse_set_key("Setosa_test").unwrap(), ("Setosa", SetRole::Test));
/// assert!(parse_set_key("Setosa").is_err());
/// ```
pub fn parse_set_key(key: &str) -> Result<(&str, SetRole)> {
    let (class, role) = if let Some(class) = key.strip_suffix(TRAINING_SUFFIX) {
        (class, SetRole::Training)
    } else if let Some(class) = key.strip_suffix(TEST_SUFFIX) {
        (class, SetRole::Test)
    } else {
        return Err(Error::InvalidInput(format!(
            "set key `{}` ends neither in `{}` nor in `{}`",
            key, TRAINING_SUFFIX, TEST_SUFFIX
        )));
    };

    if class.is_empty() {
        return Err(Error::InvalidInput(format!("set key `{}` has no class name", key)));
    }

    Ok((class, role))
}

/// Returns the attribute count shared by all classes.
///
/// Fails if there are no classes, if a class has no probes, or if the
/// classes disagree on the number of attributes.
pub fn attribute_count(classes: &ProbesByClass) -> Result<usize> {
    let mut count = None;

    for (class, probes) in classes {
        if probes.ncols() == 0 {
            return Err(Error::InvalidInput(format!("class `{}` has no probes", class)));
        }
        match count {
            Some(d) if d != probes.nrows() => {
                return Err(Error::DimensionMismatch { expected: d, found: probes.nrows() });
            }
            Some(_) => {}
            None => count = Some(probes.nrows()),
        }
    }

    match count {
        Some(0) => Err(Error::InvalidInput("probes have no attributes".to_string())),
        Some(d) => Ok(d),
        None => Err(Error::InvalidInput("no classes given".to_string())),
    }
}

/// Mapping from set key to probe matrix.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassSets {
    sets: BTreeMap<String, Array2<f64>>,
}

impl ClassSets {
    pub fn new() -> ClassSets {
        ClassSets::default()
    }

    /// Inserts a set under `key`, returning the set it replaces.
    pub fn insert<K: Into<String>>(&mut self, key: K, probes: Array2<f64>) -> Option<Array2<f64>> {
        self.sets.insert(key.into(), probes)
    }

    /// Inserts both the training and the test set of `class`.
    pub fn insert_class(&mut self, class: &str, training: Array2<f64>, test: Array2<f64>) {
        self.sets.insert(set_key(class, SetRole::Training), training);
        self.sets.insert(set_key(class, SetRole::Test), test);
    }

    pub fn get(&self, key: &str) -> Option<&Array2<f64>> {
        self.sets.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array2<f64>)> {
        self.sets.iter().map(|(key, probes)| (key.as_str(), probes))
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Array2<f64>)> for ClassSets {
    fn from_iter<I: IntoIterator<Item = (K, Array2<f64>)>>(iter: I) -> ClassSets {
        ClassSets {
            sets: iter.into_iter().map(|(key, probes)| (key.into(), probes)).collect(),
        }
    }
}

/// Set of zero-based attribute indices, iterated in ascending order.
///
/// An empty selection stands for "every attribute" where a classifier
/// allows it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeSelection {
    indices: BTreeSet<usize>,
}

impl AttributeSelection {
    /// The empty selection.
    pub fn all() -> AttributeSelection {
        AttributeSelection::default()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().cloned()
    }

    /// Indices to use for probes with `count` attributes; an empty
    /// selection resolves to all of them.
    pub fn resolve(&self, count: usize) -> Result<Vec<usize>> {
        if self.indices.is_empty() {
            Ok((0..count).collect())
        } else {
            self.require(count)
        }
    }

    /// Like `resolve`, but an empty selection is an error.
    pub fn require(&self, count: usize) -> Result<Vec<usize>> {
        if self.indices.is_empty() {
            return Err(Error::InvalidInput("at least one attribute must be selected".to_string()));
        }
        if let Some(&index) = self.indices.iter().find(|&&index| index >= count) {
            return Err(Error::AttributeOutOfRange { index, count });
        }

        Ok(self.iter().collect())
    }
}

impl FromIterator<usize> for AttributeSelection {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> AttributeSelection {
        AttributeSelection { indices: iter.into_iter().collect() }
    }
}

impl From<Vec<usize>> for AttributeSelection {
    fn from(indices: Vec<usize>) -> AttributeSelection {
        indices.into_iter().collect()
    }
}

impl<'a> From<&'a [usize]> for AttributeSelection {
    fn from(indices: &'a [usize]) -> AttributeSelection {
        indices.iter().cloned().collect()
    }
}

/// Training and test probes split per class.
///
/// Training inputs are stored in `training`, indexed by a label `y`,
/// where `training[y]` contains all training probes of the class named
/// `classes[y]`; `test` is laid out the same way. Labels follow the
/// lexicographic order of class names, which is also the tie-break order
/// of every classifier.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    classes: Vec<String>,
    training: Vec<Array2<f64>>,
    test: Vec<Array2<f64>>,
    n_attributes: usize,
}

impl Partition {
    /// Validates a class-set mapping and splits it by key suffix.
    ///
    /// Every class needs both a non-empty training and a non-empty test
    /// set, and all sets must have as many attributes as the training
    /// set of the first class.
    pub fn from_class_sets(sets: &ClassSets) -> Result<Partition> {
        let mut grouped: BTreeMap<&str, (Option<&Array2<f64>>, Option<&Array2<f64>>)> =
            BTreeMap::new();

        for (key, probes) in sets.iter() {
            let (class, role) = parse_set_key(key)?;
            let entry = grouped.entry(class).or_insert((None, None));
            match role {
                SetRole::Training => entry.0 = Some(probes),
                SetRole::Test => entry.1 = Some(probes),
            }
        }

        if grouped.is_empty() {
            return Err(Error::InvalidInput("no class sets given".to_string()));
        }

        // Reference attribute count: the training set of the first class.
        let mut n_attributes = None;
        let mut classes = Vec::with_capacity(grouped.len());
        let mut training = Vec::with_capacity(grouped.len());
        let mut test = Vec::with_capacity(grouped.len());

        for (class, pair) in grouped {
            let (training_y, test_y) = match pair {
                (Some(training_y), Some(test_y)) => (training_y, test_y),
                (_, None) => {
                    return Err(Error::InvalidInput(format!(
                        "class `{}` has a training set but no test set",
                        class
                    )))
                }
                (None, _) => {
                    return Err(Error::InvalidInput(format!(
                        "class `{}` has a test set but no training set",
                        class
                    )))
                }
            };

            let expected = *n_attributes.get_or_insert(training_y.nrows());
            if expected == 0 {
                return Err(Error::InvalidInput("probes have no attributes".to_string()));
            }
            for probes in &[training_y, test_y] {
                if probes.nrows() != expected {
                    return Err(Error::DimensionMismatch { expected, found: probes.nrows() });
                }
            }
            if training_y.ncols() == 0 {
                return Err(Error::EmptyEvaluationSet(format!(
                    "class `{}` has no training probes",
                    class
                )));
            }
            if test_y.ncols() == 0 {
                return Err(Error::EmptyEvaluationSet(format!(
                    "class `{}` has no test probes",
                    class
                )));
            }

            classes.push(class.to_string());
            training.push(training_y.clone());
            test.push(test_y.clone());
        }

        let n_attributes = n_attributes.unwrap_or(0);
        Ok(Partition { classes, training, test, n_attributes })
    }

    /// Keeps only the given attribute rows, in the given order.
    pub fn select_attributes(&self, attributes: &[usize]) -> Result<Partition> {
        if attributes.is_empty() {
            return Err(Error::InvalidInput("at least one attribute must be selected".to_string()));
        }
        if let Some(&index) = attributes.iter().find(|&&index| index >= self.n_attributes) {
            return Err(Error::AttributeOutOfRange { index, count: self.n_attributes });
        }

        let select = |sets: &[Array2<f64>]| -> Vec<Array2<f64>> {
            sets.iter().map(|probes| probes.select(Axis(0), attributes)).collect()
        };

        Ok(Partition {
            classes: self.classes.clone(),
            training: select(&self.training),
            test: select(&self.test),
            n_attributes: attributes.len(),
        })
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn n_attributes(&self) -> usize {
        self.n_attributes
    }

    pub fn class_names(&self) -> &[String] {
        &self.classes
    }

    pub fn class_name(&self, y: usize) -> &str {
        &self.classes[y]
    }

    /// Label of the class called `name`, if any.
    pub fn label(&self, name: &str) -> Option<usize> {
        self.classes.iter().position(|class| class == name)
    }

    pub fn training(&self, y: usize) -> &Array2<f64> {
        &self.training[y]
    }

    pub fn test(&self, y: usize) -> &Array2<f64> {
        &self.test[y]
    }

    pub fn n_training_probes(&self) -> usize {
        self.training.iter().map(|probes| probes.ncols()).sum()
    }

    pub fn n_test_probes(&self) -> usize {
        self.test.iter().map(|probes| probes.ncols()).sum()
    }

    /// Iterates over every test probe together with its true label.
    pub fn test_probes(&self) -> impl Iterator<Item = (usize, ArrayView1<'_, f64>)> + '_ {
        self.test
            .iter()
            .enumerate()
            .flat_map(|(y, probes)| probes.axis_iter(Axis(1)).map(move |x| (y, x)))
    }
}
