//! Linear algebra operations
//!
//! This module provides the minimal dense interface Vector Fitting needs:
//! thin QR, SVD-based least squares (optionally column-scaled) and the
//! eigenvalues of a real matrix. nalgebra is the backend; all
//! ndarray<->nalgebra conversions are contained here so that callers only
//! ever see ndarray types.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use thiserror::Error;

use crate::constants::{COLUMN_SCALE_TOL, NEAR_ZERO, SVD_TOLERANCE};

/// Errors raised by the dense linear algebra backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinalgError {
    #[error("empty matrix")]
    EmptyMatrix,

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("least squares solve failed: {0}")]
    SolveFailed(&'static str),

    #[error("matrix contains NaN or infinite entries")]
    NonFinite,
}

/// Result of least squares solve
#[derive(Debug, Clone)]
pub struct LstsqResult {
    pub solution: Array1<f64>,
    pub singular_values: Vec<f64>,
    pub condition: f64,
}

/// Thin QR factorization `A = Q R`
///
/// For an `m x n` input with `k = min(m, n)`, `q` is `m x k` and `r` is
/// `k x n` upper triangular.
#[derive(Debug, Clone)]
pub struct ThinQr {
    pub q: Array2<f64>,
    pub r: Array2<f64>,
}

// ============================================================================
// Conversion helpers (internal)
// ============================================================================

#[inline]
fn to_na_real(a: &Array2<f64>) -> DMatrix<f64> {
    let (m, n) = a.dim();
    DMatrix::from_fn(m, n, |i, j| a[[i, j]])
}

#[inline]
fn from_na_real(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// nalgebra's SVD and Schur iterations do not terminate on NaN input
#[inline]
fn ensure_finite<'a>(values: impl IntoIterator<Item = &'a f64>) -> Result<(), LinalgError> {
    if values.into_iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(LinalgError::NonFinite)
    }
}

// ============================================================================
// QR Decomposition
// ============================================================================

/// Thin QR decomposition returning both factors
pub fn qr(a: &Array2<f64>) -> Result<ThinQr, LinalgError> {
    let (m, n) = a.dim();
    if m == 0 || n == 0 {
        return Err(LinalgError::EmptyMatrix);
    }
    ensure_finite(a)?;

    let decomposition = to_na_real(a).qr();
    Ok(ThinQr {
        q: from_na_real(&decomposition.q()),
        r: from_na_real(&decomposition.r()),
    })
}

// ============================================================================
// Eigenvalue decomposition
// ============================================================================

/// Compute the (complex) eigenvalues of a real square matrix
pub fn eigenvalues(a: &Array2<f64>) -> Result<Vec<Complex64>, LinalgError> {
    let (m, n) = a.dim();
    if m != n {
        return Err(LinalgError::NotSquare { rows: m, cols: n });
    }
    if m == 0 {
        return Ok(Vec::new());
    }
    ensure_finite(a)?;

    let eigs = to_na_real(a).complex_eigenvalues();
    Ok(eigs.iter().map(|e| Complex64::new(e.re, e.im)).collect())
}

// ============================================================================
// Least Squares
// ============================================================================

/// Solve least squares problem Ax = b using SVD
///
/// Returns solution vector, singular values, and condition number.
pub fn lstsq(a: &Array2<f64>, b: &Array1<f64>) -> Result<LstsqResult, LinalgError> {
    let (m, n) = a.dim();
    if m == 0 || n == 0 {
        return Err(LinalgError::EmptyMatrix);
    }
    if b.len() != m {
        return Err(LinalgError::DimensionMismatch {
            expected: m,
            found: b.len(),
        });
    }
    ensure_finite(a)?;
    ensure_finite(b)?;

    let b_na = DVector::from_fn(m, |i, _| b[i]);
    let svd = to_na_real(a).svd(true, true);

    let solution = svd
        .solve(&b_na, SVD_TOLERANCE)
        .map_err(LinalgError::SolveFailed)?;

    let singular_values: Vec<f64> = svd.singular_values.iter().copied().collect();
    let condition = match (singular_values.first(), singular_values.last()) {
        (Some(&largest), Some(&smallest)) if smallest.abs() > NEAR_ZERO => largest / smallest,
        _ => f64::INFINITY,
    };

    Ok(LstsqResult {
        solution: solution.iter().copied().collect(),
        singular_values,
        condition,
    })
}

/// Inverse Euclidean norm of every column
///
/// Columns whose norm is below `COLUMN_SCALE_TOL` keep a unit factor so
/// that an all-zero column does not blow up the scaled system.
pub fn column_scales(a: &Array2<f64>) -> Array1<f64> {
    a.columns()
        .into_iter()
        .map(|col| {
            let norm = col.dot(&col).sqrt();
            if norm > COLUMN_SCALE_TOL {
                1.0 / norm
            } else {
                1.0
            }
        })
        .collect()
}

/// Column-normalized least squares
///
/// Scales every column of `a` to unit norm, solves, and reapplies the
/// scale factors to the solution so it refers to the unscaled unknowns.
pub fn lstsq_scaled(a: &Array2<f64>, b: &Array1<f64>) -> Result<LstsqResult, LinalgError> {
    let scales = column_scales(a);
    let scaled = a * &scales;

    let mut result = lstsq(&scaled, b)?;
    result.solution *= &scales;
    Ok(result)
}

// ============================================================================
// Real/imaginary stacking
// ============================================================================

/// Stack `[Re(A); Im(A)]` into a real matrix with twice the rows
pub fn stack_real_imag_matrix(a: &Array2<Complex64>) -> Array2<f64> {
    let (rows, cols) = a.dim();
    let mut result = Array2::<f64>::zeros((2 * rows, cols));
    for ((i, j), z) in a.indexed_iter() {
        result[[i, j]] = z.re;
        result[[rows + i, j]] = z.im;
    }
    result
}

/// Stack `[Re(v); Im(v)]` into a real vector with twice the length
pub fn stack_real_imag_vector(v: &Array1<Complex64>) -> Array1<f64> {
    let n = v.len();
    let mut result = Array1::<f64>::zeros(2 * n);
    for (i, z) in v.iter().enumerate() {
        result[i] = z.re;
        result[n + i] = z.im;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_eigenvalues() {
        // Upper triangular: eigenvalues are the diagonal
        let a = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 0.0, 3.0]).unwrap();
        let eigs = eigenvalues(&a).unwrap();
        assert_eq!(eigs.len(), 2);
        let mut reals: Vec<f64> = eigs.iter().map(|e| e.re).collect();
        reals.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_relative_eq!(reals[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(reals[1], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_eigenvalues_rotation_block() {
        // [[a, b], [-b, a]] has eigenvalues a +/- ib
        let a = Array2::from_shape_vec((2, 2), vec![-1.0, 5.0, -5.0, -1.0]).unwrap();
        let eigs = eigenvalues(&a).unwrap();
        for e in &eigs {
            assert_relative_eq!(e.re, -1.0, epsilon = 1e-10);
            assert_relative_eq!(e.im.abs(), 5.0, epsilon = 1e-10);
        }
        assert_relative_eq!(eigs[0].im, -eigs[1].im, epsilon = 1e-10);
    }

    #[test]
    fn test_eigenvalues_not_square() {
        let a = Array2::<f64>::zeros((2, 3));
        assert_eq!(
            eigenvalues(&a),
            Err(LinalgError::NotSquare { rows: 2, cols: 3 })
        );
    }

    #[test]
    fn test_qr_reconstructs_input() {
        let a = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let ThinQr { q, r } = qr(&a).unwrap();
        assert_eq!(q.dim(), (3, 2));
        assert_eq!(r.dim(), (2, 2));
        assert_relative_eq!(r[[1, 0]], 0.0, epsilon = 1e-12);

        let back = q.dot(&r);
        for (x, y) in back.iter().zip(a.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lstsq_overdetermined() {
        // Exact line y = 1 + 2x through three points
        let a = Array2::from_shape_vec((3, 2), vec![1.0, 1.0, 1.0, 2.0, 1.0, 3.0]).unwrap();
        let b = Array1::from_vec(vec![3.0, 5.0, 7.0]);

        let result = lstsq(&a, &b).unwrap();
        assert_relative_eq!(result.solution[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(result.solution[1], 2.0, epsilon = 1e-10);
        assert!(result.condition < 100.0);
    }

    #[test]
    fn test_lstsq_dimension_mismatch() {
        let a = Array2::<f64>::ones((3, 2));
        let b = Array1::<f64>::ones(2);
        assert!(matches!(
            lstsq(&a, &b),
            Err(LinalgError::DimensionMismatch {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let mut a = Array2::<f64>::eye(2);
        a[[0, 1]] = f64::NAN;
        let b = Array1::<f64>::ones(2);
        assert_eq!(lstsq(&a, &b).unwrap_err(), LinalgError::NonFinite);
        assert_eq!(eigenvalues(&a).unwrap_err(), LinalgError::NonFinite);
        assert!(matches!(qr(&a), Err(LinalgError::NonFinite)));

        let a = Array2::<f64>::eye(2);
        let b = Array1::from_vec(vec![1.0, f64::INFINITY]);
        assert_eq!(lstsq(&a, &b).unwrap_err(), LinalgError::NonFinite);
    }

    #[test]
    fn test_lstsq_scaled_badly_conditioned_columns() {
        // Columns differ by ten orders of magnitude
        let a = Array2::from_shape_vec((3, 2), vec![1e-6, 1e4, 2e-6, 1e4, 3e-6, 1e4]).unwrap();
        let b = Array1::from_vec(vec![1.0, 2.0, 3.0]);

        let result = lstsq_scaled(&a, &b).unwrap();
        assert_relative_eq!(result.solution[0], 1e6, max_relative = 1e-8);
        assert_relative_eq!(result.solution[1], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_column_scales_zero_column() {
        let a = Array2::from_shape_vec((2, 2), vec![3.0, 0.0, 4.0, 0.0]).unwrap();
        let scales = column_scales(&a);
        assert_relative_eq!(scales[0], 0.2);
        assert_relative_eq!(scales[1], 1.0);
    }

    #[test]
    fn test_stack_real_imag() {
        let v = Array1::from_vec(vec![Complex64::new(1.0, 2.0), Complex64::new(3.0, 4.0)]);
        let stacked = stack_real_imag_vector(&v);
        assert_eq!(stacked.to_vec(), vec![1.0, 3.0, 2.0, 4.0]);

        let m = Array2::from_shape_vec((1, 2), vec![Complex64::new(1.0, -1.0), Complex64::i()])
            .unwrap();
        let stacked = stack_real_imag_matrix(&m);
        assert_eq!(stacked.dim(), (2, 2));
        assert_eq!(stacked[[0, 0]], 1.0);
        assert_eq!(stacked[[1, 0]], -1.0);
        assert_eq!(stacked[[1, 1]], 1.0);
    }
}
