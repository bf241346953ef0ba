//! Least-squares system builder
//!
//! Assembles the partial-fraction basis and the linear systems of both
//! fitting stages. Complex conjugate pairs are encoded with two real-valued
//! columns,
//!
//! ```text
//! phi_re(s) = 1/(s-a) + 1/(s-conj(a))
//! phi_im(s) = i/(s-a) - i/(s-conj(a))
//! ```
//!
//! so that every unknown can be solved in real arithmetic. A coefficient
//! pair `(c1, c2)` on these columns is the residue `c1 + i*c2` at `a` and
//! `c1 - i*c2` at `conj(a)`.

use ndarray::{s, Array1, Array2, ArrayView1};
use num_complex::Complex64;

use super::error::{Result, VectorFittingError};
use super::options::{AsymptoticTrend, Options};
use super::poles::{PoleKind, PoleSet};
use super::samples::{SampleSet, Weights};
use crate::math::linalg::{self, ThinQr};

/// Partial-fraction basis `[n_samples, n_poles]`
pub fn pole_basis(s: &Array1<Complex64>, poles: &PoleSet) -> Array2<Complex64> {
    let one = Complex64::new(1.0, 0.0);
    let i = Complex64::i();
    let mut basis = Array2::<Complex64>::zeros((s.len(), poles.len()));

    for (n, (pole, kind)) in poles.iter().enumerate() {
        match kind {
            PoleKind::Real => {
                for (k, &s_k) in s.iter().enumerate() {
                    basis[[k, n]] = one / (s_k - pole);
                }
            }
            PoleKind::ComplexFirst => {
                for (k, &s_k) in s.iter().enumerate() {
                    let term1 = one / (s_k - pole);
                    let term2 = one / (s_k - pole.conj());
                    basis[[k, n]] = term1 + term2;
                    basis[[k, n + 1]] = i * term1 - i * term2;
                }
            }
            // Filled together with its partner
            PoleKind::ComplexSecond => {}
        }
    }

    basis
}

/// Numerator design matrix: pole basis followed by the trend columns `1` and `s`
pub fn residue_basis(
    s: &Array1<Complex64>,
    poles: &PoleSet,
    trend: AsymptoticTrend,
) -> Array2<Complex64> {
    let n_poles = poles.len();
    let mut design = Array2::<Complex64>::zeros((s.len(), n_poles + trend.n_terms()));
    design
        .slice_mut(s![.., ..n_poles])
        .assign(&pole_basis(s, poles));

    if trend.has_constant() {
        design.column_mut(n_poles).fill(Complex64::new(1.0, 0.0));
    }
    if trend.has_linear() {
        design.column_mut(n_poles + 1).assign(s);
    }
    design
}

/// Fail early when the stacked real system cannot be overdetermined
pub fn check_sample_count(n_samples: usize, n_poles: usize, trend: AsymptoticTrend) -> Result<()> {
    let unknowns = 2 * n_poles + trend.n_terms() + 1;
    if 2 * n_samples < unknowns {
        return Err(VectorFittingError::InsufficientSamples {
            samples: n_samples,
            unknowns,
        });
    }
    Ok(())
}

/// Compressed pole-identification system for the sigma coefficients
///
/// `matrix` stacks the lower-right QR blocks of every channel; its `N + 1`
/// columns are the sigma residue coefficients followed by the sigma constant.
#[derive(Debug, Clone)]
pub struct SigmaSystem {
    pub matrix: Array2<f64>,
    pub rhs: Array1<f64>,
}

/// Build the pole-identification system
///
/// Only the relaxed formulation exists; asking for the non-relaxed one is an
/// error rather than a silent approximation.
pub fn pole_identification_system(
    samples: &SampleSet,
    weights: &Weights,
    poles: &PoleSet,
    options: &Options,
) -> Result<SigmaSystem> {
    if !options.relax {
        return Err(VectorFittingError::NonRelaxedUnsupported);
    }
    relaxed_system(samples, weights, poles, options.asymptotic_trend)
}

/// Relaxed formulation
///
/// For channel `m` the unknowns are the numerator coefficients (residues
/// plus trend terms) and the shared sigma coefficients; each row reads
///
/// ```text
/// w * (sum_n c_n phi_n(s) + d + s e) - w * f(s) * (sum_n c~_n phi_n(s) + d~) = 0
/// ```
///
/// The last channel carries one extra row enforcing
/// `Re(sum_k sigma(s_k)) = Ns` (scaled), which rules out `sigma = 0`.
/// The numerator unknowns are eliminated per channel by keeping only the
/// lower-right block of R (and the matching part of `Q^T b`).
fn relaxed_system(
    samples: &SampleSet,
    weights: &Weights,
    poles: &PoleSet,
    trend: AsymptoticTrend,
) -> Result<SigmaSystem> {
    let n_samples = samples.n_samples();
    let n_responses = samples.n_responses();
    let n_poles = poles.len();
    let n_num = n_poles + trend.n_terms();
    let n_sigma = n_poles + 1;

    check_sample_count(n_samples, n_poles, trend)?;

    let s = samples.s();
    let numerator = residue_basis(s, poles, trend);

    // Sigma basis: pole basis followed by the constant column
    let mut sigma_basis = Array2::<Complex64>::zeros((n_samples, n_sigma));
    sigma_basis
        .slice_mut(s![.., ..n_poles])
        .assign(&numerator.slice(s![.., ..n_poles]));
    sigma_basis
        .column_mut(n_poles)
        .fill(Complex64::new(1.0, 0.0));

    let scale = relaxation_scale(samples, weights);
    log::debug!(
        "relaxed sigma system: {} samples, {} channels, {} poles, scale {:e}",
        n_samples,
        n_responses,
        n_poles,
        scale
    );

    let mut matrix = Array2::<f64>::zeros((n_responses * n_sigma, n_sigma));
    let mut rhs = Array1::<f64>::zeros(n_responses * n_sigma);

    for m in 0..n_responses {
        let is_last = m + 1 == n_responses;
        let w = weights.channel(m);
        let f = samples.channel(m);

        let block = channel_block(&numerator, &sigma_basis, w, f);
        let mut a = linalg::stack_real_imag_matrix(&block);

        if is_last {
            a = append_relaxation_row(a, &sigma_basis, n_num, scale);
        }

        let ThinQr { q, r } = linalg::qr(&a)?;
        let rows = m * n_sigma..(m + 1) * n_sigma;
        matrix
            .slice_mut(s![rows.clone(), ..])
            .assign(&r.slice(s![n_num..n_num + n_sigma, n_num..n_num + n_sigma]));

        if is_last {
            // Q^T b with b zero except for the relaxation row
            let last = q.nrows() - 1;
            let target = n_samples as f64 * scale;
            rhs.slice_mut(s![rows])
                .assign(&q.slice(s![last, n_num..n_num + n_sigma]).mapv(|x| x * target));
        }
    }

    Ok(SigmaSystem { matrix, rhs })
}

/// `[w*numerator | -w*f*sigma_basis]` for one channel
fn channel_block(
    numerator: &Array2<Complex64>,
    sigma_basis: &Array2<Complex64>,
    w: ArrayView1<'_, f64>,
    f: ArrayView1<'_, Complex64>,
) -> Array2<Complex64> {
    let n_samples = numerator.nrows();
    let n_num = numerator.ncols();
    let n_sigma = sigma_basis.ncols();

    let mut block = Array2::<Complex64>::zeros((n_samples, n_num + n_sigma));
    for k in 0..n_samples {
        for j in 0..n_num {
            block[[k, j]] = numerator[[k, j]] * w[k];
        }
        for j in 0..n_sigma {
            block[[k, n_num + j]] = -sigma_basis[[k, j]] * f[k] * w[k];
        }
    }
    block
}

fn append_relaxation_row(
    a: Array2<f64>,
    sigma_basis: &Array2<Complex64>,
    n_num: usize,
    scale: f64,
) -> Array2<f64> {
    let (rows, cols) = a.dim();
    let mut extended = Array2::<f64>::zeros((rows + 1, cols));
    extended.slice_mut(s![..rows, ..]).assign(&a);
    for (j, column) in sigma_basis.columns().into_iter().enumerate() {
        let sum: Complex64 = column.sum();
        extended[[rows, n_num + j]] = scale * sum.re;
    }
    extended
}

/// Turn real basis coefficients back into one complex residue per pole
///
/// Real poles keep their coefficient; a pair `(c1, c2)` becomes
/// `c1 + i*c2` on the first pole and `c1 - i*c2` on its conjugate.
pub fn reassemble_residues(coeffs: ArrayView1<'_, f64>, poles: &PoleSet) -> Array1<Complex64> {
    let mut residues = Array1::<Complex64>::zeros(poles.len());
    for (n, kind) in poles.kinds().iter().enumerate() {
        match kind {
            PoleKind::Real => residues[n] = Complex64::new(coeffs[n], 0.0),
            PoleKind::ComplexFirst => {
                let (c1, c2) = (coeffs[n], coeffs[n + 1]);
                residues[n] = Complex64::new(c1, c2);
                residues[n + 1] = Complex64::new(c1, -c2);
            }
            PoleKind::ComplexSecond => {}
        }
    }
    residues
}

/// `sqrt(sum_m ||w_m .* f_m||^2) / Ns`
fn relaxation_scale(samples: &SampleSet, weights: &Weights) -> f64 {
    let total: f64 = samples
        .responses()
        .iter()
        .zip(weights.as_array().iter())
        .map(|(f, w)| (*f * *w).norm_sqr())
        .sum();
    total.sqrt() / samples.n_samples() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_fitting::samples::Sample;
    use approx::assert_relative_eq;

    fn samples_from(s: &[f64], f: impl Fn(Complex64) -> Complex64) -> SampleSet {
        let samples: Vec<Sample> = s
            .iter()
            .map(|&w| {
                let s_k = Complex64::new(0.0, w);
                Sample::new(s_k, vec![f(s_k)])
            })
            .collect();
        SampleSet::new(&samples).unwrap()
    }

    #[test]
    fn test_pole_basis_real_and_pair() {
        let poles = PoleSet::from_vec(vec![
            Complex64::new(-1.0, 0.0),
            Complex64::new(-2.0, 3.0),
            Complex64::new(-2.0, -3.0),
        ])
        .unwrap();
        let s = Array1::from_vec(vec![Complex64::new(0.0, 1.0)]);
        let basis = pole_basis(&s, &poles);

        let s0 = s[0];
        let a = Complex64::new(-2.0, 3.0);
        assert_relative_eq!((basis[[0, 0]] - 1.0 / (s0 + 1.0)).norm(), 0.0, epsilon = 1e-14);

        let expected_re = 1.0 / (s0 - a) + 1.0 / (s0 - a.conj());
        let expected_im = Complex64::i() / (s0 - a) - Complex64::i() / (s0 - a.conj());
        assert_relative_eq!((basis[[0, 1]] - expected_re).norm(), 0.0, epsilon = 1e-14);
        assert_relative_eq!((basis[[0, 2]] - expected_im).norm(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_pair_columns_reassemble_residue() {
        // c1*phi_re + c2*phi_im == r/(s-a) + conj(r)/(s-conj(a)) with r = c1 + i c2
        let a = Complex64::new(-0.3, 4.0);
        let poles = PoleSet::from_vec(vec![a, a.conj()]).unwrap();
        let s = Array1::from_vec(vec![Complex64::new(0.0, 2.5), Complex64::new(0.0, 7.0)]);
        let basis = pole_basis(&s, &poles);
        let (c1, c2) = (1.5, -0.25);
        let r = Complex64::new(c1, c2);

        for k in 0..s.len() {
            let lhs = basis[[k, 0]] * c1 + basis[[k, 1]] * c2;
            let rhs = r / (s[k] - a) + r.conj() / (s[k] - a.conj());
            assert_relative_eq!((lhs - rhs).norm(), 0.0, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_reassemble_residues() {
        let poles = PoleSet::from_vec(vec![
            Complex64::new(-1.0, 0.0),
            Complex64::new(-2.0, 3.0),
            Complex64::new(-2.0, -3.0),
        ])
        .unwrap();
        let coeffs = Array1::from_vec(vec![4.0, 30.0, 40.0]);
        let residues = reassemble_residues(coeffs.view(), &poles);
        assert_eq!(residues[0], Complex64::new(4.0, 0.0));
        assert_eq!(residues[1], Complex64::new(30.0, 40.0));
        assert_eq!(residues[2], Complex64::new(30.0, -40.0));
    }

    #[test]
    fn test_residue_basis_trend_columns() {
        let poles = PoleSet::from_vec(vec![Complex64::new(-1.0, 0.0)]).unwrap();
        let s = Array1::from_vec(vec![Complex64::new(0.0, 2.0)]);

        let design = residue_basis(&s, &poles, AsymptoticTrend::Zero);
        assert_eq!(design.dim(), (1, 1));

        let design = residue_basis(&s, &poles, AsymptoticTrend::Linear);
        assert_eq!(design.dim(), (1, 3));
        assert_eq!(design[[0, 1]], Complex64::new(1.0, 0.0));
        assert_eq!(design[[0, 2]], s[0]);
    }

    #[test]
    fn test_non_relaxed_is_rejected() {
        let samples = samples_from(&[1.0, 2.0, 3.0, 4.0], |s| 1.0 / (s + 1.0));
        let weights = Weights::uniform(&samples);
        let poles = PoleSet::from_vec(vec![Complex64::new(-2.0, 0.0)]).unwrap();
        let opts = Options::default().with_relax(false);

        let err = pole_identification_system(&samples, &weights, &poles, &opts).unwrap_err();
        assert_eq!(err, VectorFittingError::NonRelaxedUnsupported);
    }

    #[test]
    fn test_insufficient_samples() {
        let samples = samples_from(&[1.0, 2.0], |s| 1.0 / (s + 1.0));
        let weights = Weights::uniform(&samples);
        let poles = PoleSet::from_vec(vec![
            Complex64::new(-1.0, 0.0),
            Complex64::new(-2.0, 0.0),
            Complex64::new(-3.0, 0.0),
        ])
        .unwrap();

        let err =
            pole_identification_system(&samples, &weights, &poles, &Options::default()).unwrap_err();
        assert!(matches!(err, VectorFittingError::InsufficientSamples { .. }));
    }

    #[test]
    fn test_relaxed_system_shape() {
        let omegas: Vec<f64> = (1..=20).map(|k| k as f64).collect();
        let samples = samples_from(&omegas, |s| 2.0 / (s + 5.0) + 0.5);
        let weights = Weights::uniform(&samples);
        let poles = PoleSet::from_vec(vec![
            Complex64::new(-1.0, 0.0),
            Complex64::new(-0.1, 10.0),
            Complex64::new(-0.1, -10.0),
        ])
        .unwrap();

        let system =
            pole_identification_system(&samples, &weights, &poles, &Options::default()).unwrap();
        assert_eq!(system.matrix.dim(), (4, 4));
        assert_eq!(system.rhs.len(), 4);
        assert!(system.rhs.iter().any(|x| x.abs() > 0.0));
    }
}
