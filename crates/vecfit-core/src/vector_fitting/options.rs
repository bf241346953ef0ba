//! Fitting options
//!
//! Configuration for a single `fit` pass. The defaults follow the usual
//! Vector Fitting setup: relaxed pole identification, stability enforced,
//! a constant asymptotic term, both stages enabled.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_TOL_HIGH, DEFAULT_TOL_LOW};

/// Polynomial part added to the partial-fraction sum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AsymptoticTrend {
    /// No polynomial term
    Zero,
    /// Constant term `D`
    #[default]
    Constant,
    /// Constant and proportional terms `D + s*E`
    Linear,
}

impl AsymptoticTrend {
    /// Number of polynomial unknowns per channel
    #[inline]
    pub fn n_terms(&self) -> usize {
        match self {
            AsymptoticTrend::Zero => 0,
            AsymptoticTrend::Constant => 1,
            AsymptoticTrend::Linear => 2,
        }
    }

    #[inline]
    pub fn has_constant(&self) -> bool {
        !matches!(self, AsymptoticTrend::Zero)
    }

    #[inline]
    pub fn has_linear(&self) -> bool {
        matches!(self, AsymptoticTrend::Linear)
    }
}

/// Options controlling one fitting pass
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Options {
    /// Keep the current poles and go straight to residue identification
    pub skip_pole_identification: bool,

    /// Stop after pole relocation; the model then carries zero residues
    pub skip_residue_identification: bool,

    /// Use the relaxed non-triviality constraint for sigma
    pub relax: bool,

    /// Reflect unstable relocated poles into the left half-plane
    pub stable: bool,

    /// Polynomial part of the model
    pub asymptotic_trend: AsymptoticTrend,

    /// Smallest accepted magnitude of the relaxed sigma constant
    pub tol_low: f64,

    /// Largest accepted magnitude of the relaxed sigma constant
    pub tol_high: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            skip_pole_identification: false,
            skip_residue_identification: false,
            relax: true,
            stable: true,
            asymptotic_trend: AsymptoticTrend::default(),
            tol_low: DEFAULT_TOL_LOW,
            tol_high: DEFAULT_TOL_HIGH,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_pole_identification(mut self, skip: bool) -> Self {
        self.skip_pole_identification = skip;
        self
    }

    pub fn with_skip_residue_identification(mut self, skip: bool) -> Self {
        self.skip_residue_identification = skip;
        self
    }

    pub fn with_relax(mut self, relax: bool) -> Self {
        self.relax = relax;
        self
    }

    pub fn with_stable(mut self, stable: bool) -> Self {
        self.stable = stable;
        self
    }

    pub fn with_asymptotic_trend(mut self, trend: AsymptoticTrend) -> Self {
        self.asymptotic_trend = trend;
        self
    }

    /// Bounds for the relaxed sigma constant sanity check
    pub fn with_relax_tolerances(mut self, tol_low: f64, tol_high: f64) -> Self {
        self.tol_low = tol_low;
        self.tol_high = tol_high;
        self
    }

    /// Whether `|d|` lies inside the accepted band for the sigma constant
    #[inline]
    pub(crate) fn sigma_constant_in_range(&self, d: f64) -> bool {
        let magnitude = d.abs();
        magnitude >= self.tol_low && magnitude <= self.tol_high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = Options::default();
        assert!(opts.relax);
        assert!(opts.stable);
        assert!(!opts.skip_pole_identification);
        assert!(!opts.skip_residue_identification);
        assert_eq!(opts.asymptotic_trend, AsymptoticTrend::Constant);
    }

    #[test]
    fn test_builder_chain() {
        let opts = Options::new()
            .with_relax(false)
            .with_stable(false)
            .with_asymptotic_trend(AsymptoticTrend::Linear)
            .with_skip_residue_identification(true);
        assert!(!opts.relax);
        assert!(!opts.stable);
        assert!(opts.skip_residue_identification);
        assert_eq!(opts.asymptotic_trend.n_terms(), 2);
    }

    #[test]
    fn test_sigma_constant_range() {
        let opts = Options::new().with_relax_tolerances(1e-3, 1e3);
        assert!(opts.sigma_constant_in_range(1.0));
        assert!(opts.sigma_constant_in_range(-500.0));
        assert!(!opts.sigma_constant_in_range(1e-4));
        assert!(!opts.sigma_constant_in_range(0.0));
        assert!(!opts.sigma_constant_in_range(2e3));
    }

    #[test]
    fn test_trend_terms() {
        assert_eq!(AsymptoticTrend::Zero.n_terms(), 0);
        assert!(!AsymptoticTrend::Zero.has_constant());
        assert!(AsymptoticTrend::Constant.has_constant());
        assert!(!AsymptoticTrend::Constant.has_linear());
        assert!(AsymptoticTrend::Linear.has_linear());
    }
}
