//! Linear algebra over probe matrices.
//!
//! Probe matrices store one probe per column. Direct inversion and
//! determinants go through rusty-machine's LU decomposition, singular
//! value decompositions through nalgebra; everything else stays in
//! `ndarray`.
use nalgebra::DMatrix;
use ndarray::prelude::*;
use rusty_machine::linalg::{BaseMatrix, Matrix};
use tracing::debug;

use crate::error::{Error, Result};

/// Returns the Euclidean distance between two vectors of f64 values.
pub fn euclidean_distance(v1: &ArrayView1<f64>, v2: &ArrayView1<f64>) -> f64 {
    v1.iter()
      .zip(v2.iter())
      .map(|(x, y)| (x - y).powi(2))
      .sum::<f64>()
      .sqrt()
}

/// Per-attribute mean of a set of probes.
pub fn mean(probes: &ArrayView2<f64>) -> Result<Array1<f64>> {
    probes.mean_axis(Axis(1))
          .ok_or(Error::InsufficientProbes { required: 1, found: 0 })
}

/// Sample covariance of `probes` around `centroid`, normalised by `n - 1`.
///
/// The result is exactly symmetric: only the upper triangle is
/// computed and then mirrored.
///
/// # Examples
///
/// ```
/// # use ndarray::array;
/// use nearest_class::linalg::{covariance, mean};
///
/// let probes = array![[1., 2., 3., 4.]];
/// let centroid = mean(&probes.view()).unwrap();
/// let cov = covariance(&probes.view(), &centroid.view()).unwrap();
///
/// assert!((cov[[0, 0]] - 5. / 3.).abs() < 1e-12);
/// ```
pub fn covariance(probes: &ArrayView2<f64>, centroid: &ArrayView1<f64>) -> Result<Array2<f64>> {
    let n = probes.ncols();
    if n < 2 {
        return Err(Error::InsufficientProbes { required: 2, found: n });
    }

    Ok(cross_products(&centered(probes, centroid)?, (n - 1) as f64))
}

/// Unnormalised scatter matrix of `probes` around `centroid`.
pub fn scatter(probes: &ArrayView2<f64>, centroid: &ArrayView1<f64>) -> Result<Array2<f64>> {
    if probes.ncols() == 0 {
        return Err(Error::InsufficientProbes { required: 1, found: 0 });
    }

    Ok(cross_products(&centered(probes, centroid)?, 1.))
}

fn centered(probes: &ArrayView2<f64>, centroid: &ArrayView1<f64>) -> Result<Array2<f64>> {
    if centroid.len() != probes.nrows() {
        return Err(Error::DimensionMismatch { expected: probes.nrows(), found: centroid.len() });
    }

    Ok(probes - &centroid.view().insert_axis(Axis(1)))
}

fn cross_products(centered: &Array2<f64>, denominator: f64) -> Array2<f64> {
    let d = centered.nrows();
    let mut products = Array2::zeros((d, d));

    for i in 0..d {
        for j in i..d {
            let value = centered.row(i).dot(&centered.row(j)) / denominator;
            products[[i, j]] = value;
            products[[j, i]] = value;
        }
    }

    products
}

/// Squared Mahalanobis distance `(x - c)^T S (x - c)`, where `S` is an
/// inverse covariance matrix.
pub fn mahalanobis(x: &ArrayView1<f64>, centroid: &ArrayView1<f64>,
                   inverse_covariance: &Array2<f64>) -> f64 {
    let diff = x - centroid;
    diff.dot(inverse_covariance).dot(&diff)
}

/// Determinant of a square matrix.
pub fn determinant(matrix: &Array2<f64>) -> f64 {
    match matrix.dim() {
        (0, 0) => 1.,
        (1, 1) => matrix[[0, 0]],
        _ => to_matrix(&matrix.view()).det(),
    }
}

/// How an `Inverse` was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InversionMethod {
    Direct,
    PseudoInverse,
}

/// An inverted covariance matrix together with its determinant.
#[derive(Clone, Debug, PartialEq)]
pub struct Inverse {
    pub matrix: Array2<f64>,
    /// Exactly zero when the inverted matrix was rank deficient.
    pub determinant: f64,
    pub method: InversionMethod,
}

/// Inverts a square matrix, falling back to the Moore-Penrose
/// pseudoinverse when it is singular or too ill-conditioned for a
/// direct inversion.
///
/// Fails with `SingularCovariance` only if the matrix has effective
/// rank zero.
pub fn invert(matrix: &Array2<f64>) -> Result<Inverse> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(Error::DimensionMismatch { expected: rows, found: cols });
    }
    if rows == 0 {
        return Err(Error::InvalidInput("cannot invert an empty matrix".to_string()));
    }

    let svd = to_dmatrix(&matrix.view()).svd(true, true);
    let tolerance = svd_tolerance(rows, cols, svd.singular_values.iter());
    let rank = svd.rank(tolerance);
    if rank == 0 {
        return Err(Error::SingularCovariance);
    }

    if rank == rows {
        if let Some(inverse) = direct_inverse(matrix) {
            let determinant = determinant(&inverse);
            return Ok(Inverse { matrix: inverse, determinant, method: InversionMethod::Direct });
        }
        debug!(size = rows, "direct inversion failed, using pseudoinverse");
    } else {
        debug!(rank, size = rows, "rank deficient matrix, using pseudoinverse");
    }

    let pinv = svd.pseudo_inverse(tolerance)
                  .map_err(|e| Error::LinearAlgebra(e.to_string()))?;
    let pinv = from_dmatrix(&pinv);
    let determinant = if rank == rows { determinant(&pinv) } else { 0. };

    Ok(Inverse { matrix: pinv, determinant, method: InversionMethod::PseudoInverse })
}

fn direct_inverse(matrix: &Array2<f64>) -> Option<Array2<f64>> {
    let inverse = if matrix.dim() == (1, 1) {
        array![[1. / matrix[[0, 0]]]]
    } else {
        match to_matrix(&matrix.view()).inverse() {
            Ok(inverse) => from_matrix(&inverse),
            Err(_) => return None,
        }
    };

    if inverse.iter().all(|v| v.is_finite()) {
        Some(inverse)
    } else {
        None
    }
}

/// Moore-Penrose pseudoinverse of any non-empty matrix.
///
/// Singular values up to `max(rows, cols) * s_max * eps` are treated
/// as zero. A zero matrix has a zero pseudoinverse.
pub fn pseudo_inverse(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let (rows, cols) = matrix.dim();
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidInput("cannot invert an empty matrix".to_string()));
    }

    let svd = to_dmatrix(&matrix.view()).svd(true, true);
    let tolerance = svd_tolerance(rows, cols, svd.singular_values.iter());
    let pinv = svd.pseudo_inverse(tolerance)
                  .map_err(|e| Error::LinearAlgebra(e.to_string()))?;

    Ok(from_dmatrix(&pinv))
}

fn svd_tolerance<'a, I>(rows: usize, cols: usize, singular_values: I) -> f64
        where I: Iterator<Item = &'a f64> {
    let largest = singular_values.fold(0., |m: f64, s| m.max(s.abs()));
    rows.max(cols) as f64 * largest * f64::EPSILON
}

fn to_dmatrix(a: &ArrayView2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// Copies an ndarray view into a rusty-machine matrix.
pub fn to_matrix(a: &ArrayView2<f64>) -> Matrix<f64> {
    Matrix::new(a.nrows(), a.ncols(), a.iter().cloned().collect::<Vec<f64>>())
}

/// Copies a rusty-machine matrix into an ndarray array.
pub fn from_matrix(m: &Matrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.rows(), m.cols()), |(i, j)| m[[i, j]])
}
