//! Constants for Vector Fitting algorithms
//!
//! Centralizes magic numbers to improve code clarity and maintainability.

// ============================================================================
// Numerical tolerances
// ============================================================================

/// Single epsilon used for every "is real" / "is effectively zero" decision
///
/// Poles and eigenvalues whose imaginary part is below this value (relative
/// to their magnitude, floored at 1) are treated as real, and conjugate
/// partners are matched within the same bound.
pub const REAL_POLE_TOLERANCE: f64 = 1e-12;

/// Default lower bound on the solved sigma constant in relaxed identification
pub const DEFAULT_TOL_LOW: f64 = 1e-18;

/// Default upper bound on the solved sigma constant in relaxed identification
pub const DEFAULT_TOL_HIGH: f64 = 1e18;

/// Floor applied to response magnitudes when building inverse-magnitude weights
pub const WEIGHT_MAGNITUDE_FLOOR: f64 = 1e-12;

// ============================================================================
// Pole initialization parameters
// ============================================================================

/// Damping ratio for complex pole initialization
/// (real part = -DAMPING_RATIO * imag)
pub const COMPLEX_POLE_DAMPING_RATIO: f64 = 0.01;

/// Lower bound of the seed distribution, as a fraction of its upper bound,
/// used when the sampled range starts at zero
pub const MIN_FREQUENCY_FRACTION: f64 = 1e-6;
