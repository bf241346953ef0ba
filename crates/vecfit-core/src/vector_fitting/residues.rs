//! Residue identification
//!
//! With the poles fixed, every response channel is an independent linear
//! least-squares problem for its residues and trend terms. The channel
//! loop runs on rayon when the `rayon` feature is enabled.

use ndarray::{s, Array1, Array2, ArrayView1};
use num_complex::Complex64;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use super::basis;
use super::error::{Result, VectorFittingError};
use super::options::AsymptoticTrend;
use super::poles::PoleSet;
use super::samples::{SampleSet, Weights};
use crate::math::linalg;

/// Residues and trend terms of every channel
#[derive(Debug, Clone)]
pub struct ResidueFitResult {
    /// Complex residues `[n_responses, n_poles]`
    pub residues: Array2<Complex64>,
    /// Constant terms (zero unless the trend has one)
    pub constant_coeff: Array1<f64>,
    /// Proportional terms (zero unless the trend is linear)
    pub proportional_coeff: Array1<f64>,
}

/// Fit residues using least squares
pub fn fit_residues(
    samples: &SampleSet,
    weights: &Weights,
    poles: &PoleSet,
    trend: AsymptoticTrend,
) -> Result<ResidueFitResult> {
    let n_samples = samples.n_samples();
    let n_responses = samples.n_responses();
    let n_poles = poles.len();
    let n_unknowns = n_poles + trend.n_terms();

    if 2 * n_samples < n_unknowns {
        return Err(VectorFittingError::InsufficientSamples {
            samples: n_samples,
            unknowns: n_unknowns,
        });
    }

    let design = basis::residue_basis(samples.s(), poles, trend);
    log::debug!(
        "fitting residues: {} channels, {} unknowns each",
        n_responses,
        n_unknowns
    );

    #[cfg(feature = "rayon")]
    let solutions: Vec<Array1<f64>> = (0..n_responses)
        .into_par_iter()
        .map(|m| solve_channel(&design, weights.channel(m), samples.channel(m)))
        .collect::<Result<_>>()?;

    #[cfg(not(feature = "rayon"))]
    let solutions: Vec<Array1<f64>> = (0..n_responses)
        .map(|m| solve_channel(&design, weights.channel(m), samples.channel(m)))
        .collect::<Result<_>>()?;

    let mut residues = Array2::<Complex64>::zeros((n_responses, n_poles));
    let mut constant_coeff = Array1::<f64>::zeros(n_responses);
    let mut proportional_coeff = Array1::<f64>::zeros(n_responses);

    for (m, x) in solutions.iter().enumerate() {
        residues
            .row_mut(m)
            .assign(&basis::reassemble_residues(x.slice(s![..n_poles]), poles));
        if trend.has_constant() {
            constant_coeff[m] = x[n_poles];
        }
        if trend.has_linear() {
            proportional_coeff[m] = x[n_poles + 1];
        }
    }

    Ok(ResidueFitResult {
        residues,
        constant_coeff,
        proportional_coeff,
    })
}

/// Weighted, real/imaginary-stacked least squares for one channel
fn solve_channel(
    design: &Array2<Complex64>,
    w: ArrayView1<'_, f64>,
    f: ArrayView1<'_, Complex64>,
) -> Result<Array1<f64>> {
    let weighted = Array2::from_shape_fn(design.dim(), |(k, j)| design[[k, j]] * w[k]);
    let target: Array1<Complex64> = f.iter().zip(w.iter()).map(|(&f_k, &w_k)| f_k * w_k).collect();

    let a = linalg::stack_real_imag_matrix(&weighted);
    let b = linalg::stack_real_imag_vector(&target);
    Ok(linalg::lstsq_scaled(&a, &b)?.solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_fitting::samples::Sample;
    use approx::assert_relative_eq;

    fn synthesize(
        poles: &[Complex64],
        residues: &[Complex64],
        d: f64,
        e: f64,
        n: usize,
    ) -> SampleSet {
        let samples: Vec<Sample> = (1..=n)
            .map(|k| {
                let s = Complex64::new(0.0, 10.0 * k as f64);
                let mut f = Complex64::new(d, 0.0) + s * e;
                for (p, r) in poles.iter().zip(residues) {
                    f += r / (s - p);
                }
                Sample::new(s, vec![f, f * 2.0])
            })
            .collect();
        SampleSet::new(&samples).unwrap()
    }

    #[test]
    fn test_recovers_residues_and_trend() {
        let poles = vec![
            Complex64::new(-50.0, 0.0),
            Complex64::new(-20.0, 300.0),
            Complex64::new(-20.0, -300.0),
        ];
        let residues = vec![
            Complex64::new(10.0, 0.0),
            Complex64::new(5.0, -8.0),
            Complex64::new(5.0, 8.0),
        ];
        let samples = synthesize(&poles, &residues, 0.25, 1e-3, 80);
        let weights = Weights::uniform(&samples);
        let pole_set = PoleSet::from_vec(poles).unwrap();

        let fit = fit_residues(&samples, &weights, &pole_set, AsymptoticTrend::Linear).unwrap();
        for (got, want) in fit.residues.row(0).iter().zip(residues.iter()) {
            assert_relative_eq!((got - want).norm(), 0.0, epsilon = 1e-6);
        }
        for (got, want) in fit.residues.row(1).iter().zip(residues.iter()) {
            assert_relative_eq!((got - want * 2.0).norm(), 0.0, epsilon = 1e-6);
        }
        assert_relative_eq!(fit.constant_coeff[0], 0.25, epsilon = 1e-8);
        assert_relative_eq!(fit.constant_coeff[1], 0.5, epsilon = 1e-8);
        assert_relative_eq!(fit.proportional_coeff[0], 1e-3, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_trend_leaves_terms_empty() {
        let poles = vec![Complex64::new(-50.0, 0.0)];
        let residues = vec![Complex64::new(10.0, 0.0)];
        let samples = synthesize(&poles, &residues, 0.0, 0.0, 20);
        let weights = Weights::uniform(&samples);
        let pole_set = PoleSet::from_vec(poles).unwrap();

        let fit = fit_residues(&samples, &weights, &pole_set, AsymptoticTrend::Zero).unwrap();
        assert_relative_eq!(fit.residues[[0, 0]].re, 10.0, epsilon = 1e-8);
        assert_eq!(fit.constant_coeff[0], 0.0);
        assert_eq!(fit.proportional_coeff[0], 0.0);
    }

    #[test]
    fn test_conjugate_residues_stay_conjugate() {
        let poles = vec![Complex64::new(-1.0, 40.0), Complex64::new(-1.0, -40.0)];
        let residues = vec![Complex64::new(3.0, 1.0), Complex64::new(3.0, -1.0)];
        let samples = synthesize(&poles, &residues, 0.0, 0.0, 30);
        let weights = Weights::uniform(&samples);
        let pole_set = PoleSet::from_vec(poles).unwrap();

        let fit = fit_residues(&samples, &weights, &pole_set, AsymptoticTrend::Constant).unwrap();
        assert_eq!(fit.residues[[0, 1]], fit.residues[[0, 0]].conj());
    }
}
