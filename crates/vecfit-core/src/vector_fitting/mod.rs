//! Vector Fitting algorithm for rational approximation of frequency responses
//!
//! Fits tabulated complex responses `f(s)` with a common-pole rational model
//!
//! ```text
//! f(s) = sum_n C_n / (s - p_n) + D + s E
//! ```
//!
//! Each `fit` pass relocates the poles through the relaxed sigma system and
//! then identifies residues and trend terms by linear least squares.
//!
//! # References
//!
//! - B. Gustavsen, A. Semlyen, "Rational Approximation of Frequency Domain Responses
//!   by Vector Fitting", IEEE Trans. Power Delivery, vol. 14, no. 3, 1999
//! - B. Gustavsen, "Improving the Pole Relocating Properties of Vector Fitting",
//!   IEEE Trans. Power Delivery, vol. 21, no. 3, 2006
//! - D. Deschrijver, M. Mrozowski, T. Dhaene, D. De Zutter, "Macromodeling of
//!   Multiport Systems Using a Fast Implementation of the Vector Fitting Method",
//!   IEEE Microwave and Wireless Components Letters, vol. 18, no. 6, 2008

pub mod basis;
pub mod constants;
mod core;
mod error;
pub mod model;
mod options;
pub mod poles;
pub mod relocation;
pub mod residues;
mod samples;

pub use self::core::VectorFitting;
pub use error::{Result, VectorFittingError};
pub use model::{FittedModel, StateSpace};
pub use options::{AsymptoticTrend, Options};
pub use poles::{InitPoleSpacing, PoleKind, PoleSet};
pub use relocation::PoleRelocationResult;
pub use residues::ResidueFitResult;
pub use samples::{Sample, SampleSet, Weights};
