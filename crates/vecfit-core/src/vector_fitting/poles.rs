//! Pole set abstraction for Vector Fitting
//!
//! Poles are kept as a flat sequence in which every complex pole is
//! immediately followed by its conjugate. Each entry carries a `PoleKind`
//! tag, computed once when the set is built, that the basis construction,
//! the eigenvalue post-processing and the residue reassembly all rely on.

use ndarray::Array1;
use num_complex::Complex64;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::constants::{COMPLEX_POLE_DAMPING_RATIO, MIN_FREQUENCY_FRACTION, REAL_POLE_TOLERANCE};
use super::error::{Result, VectorFittingError};

/// Role of a pole inside the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoleKind {
    /// Stands alone, contributes one basis column
    Real,
    /// First member of a conjugate pair (positive imaginary part after relocation)
    ComplexFirst,
    /// Conjugate of the preceding pole
    ComplexSecond,
}

/// Distribution used to seed the imaginary parts of the starting poles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InitPoleSpacing {
    Linear,
    #[default]
    Logarithmic,
}

/// Whether `z` is real within the shared tolerance
#[inline]
pub fn is_real(z: Complex64) -> bool {
    z.im.abs() <= REAL_POLE_TOLERANCE * z.norm().max(1.0)
}

#[inline]
fn is_conjugate_of(candidate: Complex64, pole: Complex64) -> bool {
    (candidate - pole.conj()).norm() <= REAL_POLE_TOLERANCE * pole.norm().max(1.0)
}

/// Tag every pole, scanning left to right
///
/// A non-real pole opens a pair and the next pole must be its conjugate.
pub fn classify_poles(poles: &[Complex64]) -> Result<Vec<PoleKind>> {
    let mut kinds = Vec::with_capacity(poles.len());
    let mut i = 0;
    while i < poles.len() {
        let pole = poles[i];
        if is_real(pole) {
            kinds.push(PoleKind::Real);
            i += 1;
            continue;
        }

        match poles.get(i + 1) {
            Some(&next) if is_conjugate_of(next, pole) => {
                kinds.push(PoleKind::ComplexFirst);
                kinds.push(PoleKind::ComplexSecond);
                i += 2;
            }
            _ => {
                return Err(VectorFittingError::UnpairedComplexPole {
                    index: i,
                    pole: pole.to_string(),
                })
            }
        }
    }
    Ok(kinds)
}

/// A validated, tagged pole sequence
#[derive(Debug, Clone, PartialEq)]
pub struct PoleSet {
    poles: Array1<Complex64>,
    kinds: Vec<PoleKind>,
}

impl PoleSet {
    /// Validate the conjugate-pair layout and tag every pole
    pub fn new(poles: Array1<Complex64>) -> Result<Self> {
        if poles.is_empty() {
            return Err(VectorFittingError::EmptyPoles);
        }
        let kinds = classify_poles(&poles.to_vec())?;
        Ok(Self { poles, kinds })
    }

    pub fn from_vec(poles: Vec<Complex64>) -> Result<Self> {
        Self::new(Array1::from_vec(poles))
    }

    /// Total number of poles (the model order N)
    #[inline]
    pub fn len(&self) -> usize {
        self.poles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.poles.is_empty()
    }

    /// Number of real poles
    pub fn n_real(&self) -> usize {
        self.kinds.iter().filter(|k| **k == PoleKind::Real).count()
    }

    /// Number of complex conjugate pairs
    pub fn n_complex_pairs(&self) -> usize {
        self.kinds
            .iter()
            .filter(|k| **k == PoleKind::ComplexFirst)
            .count()
    }

    #[inline]
    pub fn poles(&self) -> &Array1<Complex64> {
        &self.poles
    }

    #[inline]
    pub fn kinds(&self) -> &[PoleKind] {
        &self.kinds
    }

    /// Iterate over `(pole, kind)`
    pub fn iter(&self) -> impl Iterator<Item = (Complex64, PoleKind)> + '_ {
        self.poles.iter().copied().zip(self.kinds.iter().copied())
    }

    pub fn into_array(self) -> Array1<Complex64> {
        self.poles
    }
}

// ============================================================================
// Initial poles
// ============================================================================

/// Seed `order / 2` complex conjugate pairs over `[min, max]`
///
/// The imaginary parts follow `spacing`; each real part is
/// `-COMPLEX_POLE_DAMPING_RATIO * imag`. An odd order cannot be seeded
/// with pairs alone. Poles may not sit at the origin, so a lower bound of
/// zero is lifted to `MIN_FREQUENCY_FRACTION * max` for either spacing.
pub fn init_poles(range: (f64, f64), order: usize, spacing: InitPoleSpacing) -> Result<PoleSet> {
    if order == 0 {
        return Err(VectorFittingError::EmptyPoles);
    }
    if order % 2 != 0 {
        return Err(VectorFittingError::OddOrder(order));
    }

    let (lo, hi) = (range.0.min(range.1), range.0.max(range.1));
    if !(hi > 0.0 && hi.is_finite()) {
        return Err(VectorFittingError::DegenerateSeedRange { max: hi });
    }
    let lo = if lo > 0.0 { lo } else { hi * MIN_FREQUENCY_FRACTION };

    let n_pairs = order / 2;
    let imag_parts = match spacing {
        InitPoleSpacing::Linear => linspace(lo, hi, n_pairs),
        InitPoleSpacing::Logarithmic => logspace(lo, hi, n_pairs),
    };

    let mut poles = Vec::with_capacity(order);
    for imag in imag_parts {
        let real = -COMPLEX_POLE_DAMPING_RATIO * imag;
        poles.push(Complex64::new(real, imag));
        poles.push(Complex64::new(real, -imag));
    }
    PoleSet::from_vec(poles)
}

// ============================================================================
// Relocated poles
// ============================================================================

/// Reflect poles with positive real part across the imaginary axis
///
/// Returns the number of poles that were flipped.
pub fn enforce_stability(poles: &mut [Complex64]) -> usize {
    let mut flipped = 0;
    for pole in poles.iter_mut().filter(|p| p.re > 0.0) {
        let re = pole.re;
        *pole -= 2.0 * re;
        flipped += 1;
    }
    flipped
}

/// Put eigenvalues into canonical pole order
///
/// Real poles come first, ascending by `|re|`. Complex poles follow as
/// pairs ascending by `(|im|, |re|)`, the upper half-plane member first and
/// its exact conjugate right after it.
pub fn canonical_order(eigenvalues: &[Complex64]) -> Result<PoleSet> {
    let mut real: Vec<f64> = Vec::new();
    let mut upper: Vec<Complex64> = Vec::new();
    let mut n_lower = 0;

    for &z in eigenvalues {
        if is_real(z) {
            real.push(z.re);
        } else if z.im > 0.0 {
            upper.push(z);
        } else {
            n_lower += 1;
        }
    }

    if upper.len() != n_lower {
        return Err(VectorFittingError::UnpairedEigenvalues {
            positive: upper.len(),
            negative: n_lower,
        });
    }

    real.sort_by(|a, b| a.abs().total_cmp(&b.abs()));
    upper.sort_by(|a, b| {
        a.im.abs()
            .total_cmp(&b.im.abs())
            .then(a.re.abs().total_cmp(&b.re.abs()))
    });

    let mut poles: Vec<Complex64> = real.into_iter().map(|r| Complex64::new(r, 0.0)).collect();
    for z in upper {
        poles.push(z);
        poles.push(z.conj());
    }
    PoleSet::from_vec(poles)
}

// Helper functions

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n == 0 {
        return vec![];
    }
    if n == 1 {
        return vec![(start + end) / 2.0];
    }
    (0..n)
        .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
        .collect()
}

fn logspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n == 0 || start <= 0.0 || end <= 0.0 {
        return linspace(start, end, n);
    }
    linspace(start.ln(), end.ln(), n)
        .into_iter()
        .map(f64::exp)
        .collect()
}
