//! vecfit-core: rational macromodeling by Vector Fitting
//!
//! Fits pole-residue models to tabulated complex frequency responses.
//!
//! ## Modules
//!
//! - `math` - Dense linear algebra (QR, least squares, eigenvalues)
//! - `vector_fitting` - Vector Fitting algorithms

pub mod constants;
pub mod math;
pub mod vector_fitting;

pub use vector_fitting::{
    AsymptoticTrend, FittedModel, InitPoleSpacing, Options, Sample, VectorFitting,
    VectorFittingError,
};
