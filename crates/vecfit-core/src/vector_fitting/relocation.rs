//! Pole relocation
//!
//! Solves the compressed sigma system, builds the real companion matrix
//! `ZER = LAMBD - B * C / D` and takes its eigenvalues (the zeros of sigma)
//! as the new poles.

use ndarray::{s, Array1, Array2};
use num_complex::Complex64;

use super::basis;
use super::constants::REAL_POLE_TOLERANCE;
use super::error::{Result, VectorFittingError};
use super::options::Options;
use super::poles::{canonical_order, enforce_stability, PoleKind, PoleSet};
use super::samples::{SampleSet, Weights};
use crate::math::{linalg, LinalgError};

/// Result of one pole relocation step
#[derive(Debug, Clone)]
pub struct PoleRelocationResult {
    /// Relocated poles in canonical order
    pub poles: PoleSet,
    /// Constant term of sigma (`D` in `ZER`)
    pub sigma_constant: f64,
    /// Complex sigma residues on the previous poles
    pub sigma_residues: Array1<Complex64>,
    /// Condition number of the column-scaled sigma system
    pub condition: f64,
    /// Number of eigenvalues reflected into the left half-plane
    pub n_flipped: usize,
}

/// Identify new poles from the current ones
pub fn identify_poles(
    samples: &SampleSet,
    weights: &Weights,
    poles: &PoleSet,
    options: &Options,
) -> Result<PoleRelocationResult> {
    let n_poles = poles.len();
    let system = basis::pole_identification_system(samples, weights, poles, options)?;
    let solved = linalg::lstsq_scaled(&system.matrix, &system.rhs)?;
    let x = solved.solution;

    let d = x[n_poles];
    if !options.sigma_constant_in_range(d) {
        return Err(VectorFittingError::DegenerateRelaxation {
            d,
            tol_low: options.tol_low,
            tol_high: options.tol_high,
        });
    }

    let sigma_residues = basis::reassemble_residues(x.slice(s![..n_poles]), poles);
    let zer = companion_matrix(poles, &sigma_residues, d)?;
    let mut eigenvalues = linalg::eigenvalues(&zer)?;

    let n_flipped = if options.stable {
        enforce_stability(&mut eigenvalues)
    } else {
        0
    };
    if n_flipped > 0 {
        log::warn!("reflected {} unstable poles into the left half-plane", n_flipped);
    }

    let relocated = canonical_order(&eigenvalues)?;
    log::debug!(
        "relocated {} poles ({} real, {} pairs), sigma constant {:e}, condition {:e}",
        relocated.len(),
        relocated.n_real(),
        relocated.n_complex_pairs(),
        d,
        solved.condition
    );

    Ok(PoleRelocationResult {
        poles: relocated,
        sigma_constant: d,
        sigma_residues,
        condition: solved.condition,
        n_flipped,
    })
}

/// Real companion matrix whose eigenvalues are the zeros of sigma
///
/// `LAMBD` is the pole diagonal with every conjugate pair expanded into the
/// block `[[re, im], [-im, re]]`, `B` is `1` for a real pole and `(2, 0)`
/// for a pair, `C` holds the sigma residues (pairs split as `(re, im)`).
/// The split is only real-valued when a real pole carries a real residue
/// and a pair carries conjugate residues; anything else means the pole
/// pairing and the residues disagree.
pub fn companion_matrix(
    poles: &PoleSet,
    sigma_residues: &Array1<Complex64>,
    d: f64,
) -> Result<Array2<f64>> {
    let n = poles.len();
    if sigma_residues.len() != n {
        return Err(LinalgError::DimensionMismatch {
            expected: n,
            found: sigma_residues.len(),
        }
        .into());
    }

    let mut lambd = Array2::<f64>::zeros((n, n));
    let mut b = Array1::<f64>::zeros(n);
    let mut c = Array1::<f64>::zeros(n);

    for (i, (pole, kind)) in poles.iter().enumerate() {
        let r = sigma_residues[i];
        match kind {
            PoleKind::Real => {
                check_real(i, r.im, r.norm())?;
                lambd[[i, i]] = pole.re;
                b[i] = 1.0;
                c[i] = r.re;
            }
            PoleKind::ComplexFirst => {
                let mismatch = sigma_residues[i + 1] - r.conj();
                check_real(i + 1, mismatch.norm(), r.norm())?;
                lambd[[i, i]] = pole.re;
                lambd[[i, i + 1]] = pole.im;
                lambd[[i + 1, i]] = -pole.im;
                lambd[[i + 1, i + 1]] = pole.re;
                b[i] = 2.0;
                b[i + 1] = 0.0;
                c[i] = r.re;
                c[i + 1] = r.im;
            }
            PoleKind::ComplexSecond => {}
        }
    }

    Ok(Array2::from_shape_fn((n, n), |(i, j)| lambd[[i, j]] - b[i] * c[j] / d))
}

#[inline]
fn check_real(index: usize, imag: f64, magnitude: f64) -> Result<()> {
    if imag.abs() > REAL_POLE_TOLERANCE * magnitude.max(1.0) {
        return Err(VectorFittingError::NonRealCompanion { index, imag });
    }
    Ok(())
}
