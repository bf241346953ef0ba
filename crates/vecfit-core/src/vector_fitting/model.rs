//! Fitted model and response evaluation
//!
//! The model is kept in pole-residue state-space form:
//! `f(s) = C (sI - A)^-1 B + D + s E` with `A` diagonal, so evaluation
//! reduces to `sum_n C_n / (s - p_n) + D + s E` for every channel.

use ndarray::{Array1, Array2, ArrayView1, Zip};
use num_complex::Complex64;

use super::error::{Result, VectorFittingError};
use super::options::AsymptoticTrend;
use super::poles::{PoleKind, PoleSet};
use crate::math::LinalgError;

/// Borrowed state-space view of a fitted model
#[derive(Debug, Clone, Copy)]
pub struct StateSpace<'a> {
    /// Poles, the diagonal of `A`
    pub a: &'a Array1<Complex64>,
    /// Input vector: 1 per pole, 0 for the second member of a pair
    pub b: &'a Array1<u8>,
    /// Residues `[n_responses, n_poles]`
    pub c: &'a Array2<Complex64>,
    /// Constant terms per channel
    pub d: &'a Array1<f64>,
    /// Proportional terms per channel
    pub e: &'a Array1<f64>,
}

/// Pole-residue model produced by one `fit`
#[derive(Debug, Clone)]
pub struct FittedModel {
    poles: PoleSet,
    b: Array1<u8>,
    residues: Array2<Complex64>,
    constant_coeff: Array1<f64>,
    proportional_coeff: Array1<f64>,
    trend: AsymptoticTrend,
}

impl FittedModel {
    pub fn new(
        poles: PoleSet,
        residues: Array2<Complex64>,
        constant_coeff: Array1<f64>,
        proportional_coeff: Array1<f64>,
        trend: AsymptoticTrend,
    ) -> Result<Self> {
        let (n_responses, n_poles) = residues.dim();
        if n_poles != poles.len() {
            return Err(LinalgError::DimensionMismatch {
                expected: poles.len(),
                found: n_poles,
            }
            .into());
        }
        for len in [constant_coeff.len(), proportional_coeff.len()] {
            if len != n_responses {
                return Err(LinalgError::DimensionMismatch {
                    expected: n_responses,
                    found: len,
                }
                .into());
            }
        }

        Ok(Self {
            b: input_vector(&poles),
            poles,
            residues,
            constant_coeff,
            proportional_coeff,
            trend,
        })
    }

    /// Model with the given poles and every residue and trend term zero
    pub fn zero(poles: PoleSet, n_responses: usize, trend: AsymptoticTrend) -> Self {
        let n_poles = poles.len();
        Self {
            b: input_vector(&poles),
            poles,
            residues: Array2::zeros((n_responses, n_poles)),
            constant_coeff: Array1::zeros(n_responses),
            proportional_coeff: Array1::zeros(n_responses),
            trend,
        }
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.poles.len()
    }

    #[inline]
    pub fn response_size(&self) -> usize {
        self.residues.nrows()
    }

    pub fn poles(&self) -> &PoleSet {
        &self.poles
    }

    pub fn residues(&self) -> &Array2<Complex64> {
        &self.residues
    }

    pub fn constant_coeff(&self) -> &Array1<f64> {
        &self.constant_coeff
    }

    pub fn proportional_coeff(&self) -> &Array1<f64> {
        &self.proportional_coeff
    }

    pub fn trend(&self) -> AsymptoticTrend {
        self.trend
    }

    pub fn state_space(&self) -> StateSpace<'_> {
        StateSpace {
            a: self.poles.poles(),
            b: &self.b,
            c: &self.residues,
            d: &self.constant_coeff,
            e: &self.proportional_coeff,
        }
    }

    /// Evaluate every channel at the points `s`
    ///
    /// Returns `[s.len(), n_responses]`, the same layout as the sample set.
    pub fn evaluate(&self, s: &[Complex64]) -> Array2<Complex64> {
        let poles = self.poles.poles();
        let mut response = Array2::<Complex64>::zeros((s.len(), self.response_size()));

        for (k, &s_k) in s.iter().enumerate() {
            let inv: Vec<Complex64> = poles.iter().map(|&p| (s_k - p).inv()).collect();
            for (m, residues) in self.residues.outer_iter().enumerate() {
                let mut h = Complex64::new(self.constant_coeff[m], 0.0)
                    + s_k * self.proportional_coeff[m];
                for (r, g) in residues.iter().zip(inv.iter()) {
                    h += r * g;
                }
                response[[k, m]] = h;
            }
        }
        response
    }
}

fn input_vector(poles: &PoleSet) -> Array1<u8> {
    poles
        .kinds()
        .iter()
        .map(|kind| u8::from(*kind != PoleKind::ComplexSecond))
        .collect()
}

/// RMS error over every sample and channel
pub fn rms_error(model: &Array2<Complex64>, target: &Array2<Complex64>) -> Result<f64> {
    check_same_shape(model, target)?;
    let sum: f64 = Zip::from(model)
        .and(target)
        .fold(0.0, |acc, m, t| acc + (m - t).norm_sqr());
    Ok((sum / model.len() as f64).sqrt())
}

/// RMS error of each channel (column) separately
pub fn rms_error_per_channel(
    model: &Array2<Complex64>,
    target: &Array2<Complex64>,
) -> Result<Array1<f64>> {
    check_same_shape(model, target)?;
    let n_samples = model.nrows() as f64;
    Ok(model
        .columns()
        .into_iter()
        .zip(target.columns())
        .map(|(m, t)| (channel_sq_error(m, t) / n_samples).sqrt())
        .collect())
}

/// Largest absolute deviation over every sample and channel
pub fn max_error(model: &Array2<Complex64>, target: &Array2<Complex64>) -> Result<f64> {
    check_same_shape(model, target)?;
    Ok(Zip::from(model)
        .and(target)
        .fold(0.0, |acc: f64, m, t| acc.max((m - t).norm())))
}

fn channel_sq_error(model: ArrayView1<'_, Complex64>, target: ArrayView1<'_, Complex64>) -> f64 {
    model
        .iter()
        .zip(target.iter())
        .map(|(m, t)| (m - t).norm_sqr())
        .sum()
}

fn check_same_shape(model: &Array2<Complex64>, target: &Array2<Complex64>) -> Result<()> {
    if model.is_empty() {
        return Err(VectorFittingError::EmptySamples);
    }
    if model.dim() != target.dim() {
        return Err(LinalgError::DimensionMismatch {
            expected: target.len(),
            found: model.len(),
        }
        .into());
    }
    Ok(())
}
