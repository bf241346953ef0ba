//! Numerical constants shared by the linear algebra layer
//!
//! Provides standardized tolerance values used throughout the library.

/// Tolerance for detecting near-zero values in division and singularity checks.
/// Used to detect ill-conditioned matrices when reporting condition numbers.
pub const NEAR_ZERO: f64 = 1e-15;

/// Tolerance for SVD solve in least squares problems.
/// Singular values below this threshold are treated as zero.
pub const SVD_TOLERANCE: f64 = 1e-14;

/// Tolerance for column scaling in numerical algorithms.
/// Used to avoid division by zero during matrix normalization.
pub const COLUMN_SCALE_TOL: f64 = 1e-15;
