//! Mathematical building blocks
//!
//! Dense linear algebra used by the Vector Fitting stages.

pub mod linalg;

pub use linalg::{LinalgError, LstsqResult, ThinQr};
