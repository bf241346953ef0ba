//! Vector Fitting errors

use thiserror::Error;

use crate::math::LinalgError;

/// Errors raised while building or fitting a Vector Fitting model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorFittingError {
    // ------------------------------------------------------------------
    // Invalid input
    // ------------------------------------------------------------------
    #[error("sample set is empty")]
    EmptySamples,

    #[error("sample {index} has {found} responses, expected {expected}")]
    InconsistentResponseWidth {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("{points} frequency points but {rows} response rows")]
    SampleCountMismatch { points: usize, rows: usize },

    #[error("samples carry no response channels")]
    EmptyResponse,

    #[error("weights are {rows}x{cols}, expected {expected_rows}x{expected_cols}")]
    WeightsShape {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    #[error("weight at sample {sample}, channel {channel} is negative or not finite: {value}")]
    InvalidWeight {
        sample: usize,
        channel: usize,
        value: f64,
    },

    #[error("default complex-conjugate pole seeding needs an even order, got {0}")]
    OddOrder(usize),

    #[error("pole set is empty")]
    EmptyPoles,

    #[error("cannot seed poles: largest |Im(s)| is {max}")]
    DegenerateSeedRange { max: f64 },

    #[error("sample {index} has a non-finite point or response")]
    InvalidSample { index: usize },

    #[error("{samples} samples cannot determine {unknowns} unknowns per channel")]
    InsufficientSamples { samples: usize, unknowns: usize },

    // ------------------------------------------------------------------
    // Broken invariants
    // ------------------------------------------------------------------
    #[error("complex pole {pole} at index {index} is not followed by its conjugate")]
    UnpairedComplexPole { index: usize, pole: String },

    #[error("companion matrix entry at index {index} is not real (imaginary part {imag:e})")]
    NonRealCompanion { index: usize, imag: f64 },

    #[error("relocated poles contain {positive} upper and {negative} lower half-plane eigenvalues")]
    UnpairedEigenvalues { positive: usize, negative: usize },

    // ------------------------------------------------------------------
    // Unsupported configuration
    // ------------------------------------------------------------------
    #[error("non-relaxed pole identification is not implemented")]
    NonRelaxedUnsupported,

    #[error(
        "relaxed sigma constant {d:e} is outside [{tol_low:e}, {tol_high:e}]; \
         the fixed-constant fallback is not implemented"
    )]
    DegenerateRelaxation { d: f64, tol_low: f64, tol_high: f64 },

    // ------------------------------------------------------------------
    // State / numerics
    // ------------------------------------------------------------------
    #[error("model not fitted yet")]
    ModelNotFitted,

    #[error("linear algebra failure: {0}")]
    Linalg(#[from] LinalgError),
}

/// Result alias used across the Vector Fitting module
pub type Result<T> = std::result::Result<T, VectorFittingError>;
