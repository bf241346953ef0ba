//! Sample set and least-squares weights
//!
//! A sample pairs a point `s` of the complex frequency plane with the
//! response vector measured there. All samples of a set share the same
//! response width (the number of channels).

use ndarray::{Array1, Array2, ArrayView1};
use num_complex::Complex64;

use super::constants::WEIGHT_MAGNITUDE_FLOOR;
use super::error::{Result, VectorFittingError};

/// A single tabulated response: `(s, [f_1(s), ..., f_Nc(s)])`
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub s: Complex64,
    pub response: Vec<Complex64>,
}

impl Sample {
    pub fn new(s: Complex64, response: Vec<Complex64>) -> Self {
        Self { s, response }
    }
}

/// Validated set of samples stored column-wise
///
/// `responses` is `[n_samples, n_responses]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    s: Array1<Complex64>,
    responses: Array2<Complex64>,
}

impl SampleSet {
    /// Build a sample set, checking that it is non-empty and rectangular
    pub fn new(samples: &[Sample]) -> Result<Self> {
        let first = samples.first().ok_or(VectorFittingError::EmptySamples)?;
        let n_responses = first.response.len();
        if n_responses == 0 {
            return Err(VectorFittingError::EmptyResponse);
        }

        let mut responses = Array2::<Complex64>::zeros((samples.len(), n_responses));
        for (k, sample) in samples.iter().enumerate() {
            if sample.response.len() != n_responses {
                return Err(VectorFittingError::InconsistentResponseWidth {
                    index: k,
                    expected: n_responses,
                    found: sample.response.len(),
                });
            }
            for (m, &value) in sample.response.iter().enumerate() {
                responses[[k, m]] = value;
            }
        }

        let s = samples.iter().map(|sample| sample.s).collect();
        Self::checked(s, responses)
    }

    /// Build a sample set from the frequency points and a `[n_samples, n_responses]` array
    pub fn from_arrays(s: Array1<Complex64>, responses: Array2<Complex64>) -> Result<Self> {
        if s.is_empty() {
            return Err(VectorFittingError::EmptySamples);
        }
        if responses.ncols() == 0 {
            return Err(VectorFittingError::EmptyResponse);
        }
        if responses.nrows() != s.len() {
            return Err(VectorFittingError::SampleCountMismatch {
                points: s.len(),
                rows: responses.nrows(),
            });
        }
        Self::checked(s, responses)
    }

    /// Reject any sample whose point or response is NaN or infinite
    fn checked(s: Array1<Complex64>, responses: Array2<Complex64>) -> Result<Self> {
        let is_finite = |z: &Complex64| z.re.is_finite() && z.im.is_finite();
        for (k, (s_k, row)) in s.iter().zip(responses.rows()).enumerate() {
            if !is_finite(s_k) || !row.iter().all(is_finite) {
                return Err(VectorFittingError::InvalidSample { index: k });
            }
        }
        Ok(Self { s, responses })
    }

    /// Number of samples (Ns)
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.s.len()
    }

    /// Number of response channels (Nc)
    #[inline]
    pub fn n_responses(&self) -> usize {
        self.responses.ncols()
    }

    /// Complex frequency points
    #[inline]
    pub fn s(&self) -> &Array1<Complex64> {
        &self.s
    }

    /// Response values, `[n_samples, n_responses]`
    #[inline]
    pub fn responses(&self) -> &Array2<Complex64> {
        &self.responses
    }

    /// Responses of one channel across all samples
    #[inline]
    pub fn channel(&self, m: usize) -> ArrayView1<'_, Complex64> {
        self.responses.column(m)
    }

    /// Smallest and largest `|Im(s)|` over the set
    pub fn imag_range(&self) -> (f64, f64) {
        self.s
            .iter()
            .map(|s| s.im.abs())
            .fold((f64::INFINITY, 0.0), |(lo, hi), x| (lo.min(x), hi.max(x)))
    }

    /// Back to a list of `Sample`s
    pub fn to_samples(&self) -> Vec<Sample> {
        self.s
            .iter()
            .zip(self.responses.rows())
            .map(|(&s, row)| Sample::new(s, row.to_vec()))
            .collect()
    }
}

/// Dense `[n_samples, n_responses]` matrix of non-negative weights
#[derive(Debug, Clone, PartialEq)]
pub struct Weights(Array2<f64>);

impl Weights {
    /// All-ones weights, the default when none are supplied
    pub fn uniform(samples: &SampleSet) -> Self {
        Self(Array2::ones((samples.n_samples(), samples.n_responses())))
    }

    /// Wrap a weight matrix after checking its shape and entries against `samples`
    pub fn from_array(weights: Array2<f64>, samples: &SampleSet) -> Result<Self> {
        let (rows, cols) = weights.dim();
        if rows != samples.n_samples() || cols != samples.n_responses() {
            return Err(VectorFittingError::WeightsShape {
                rows,
                cols,
                expected_rows: samples.n_samples(),
                expected_cols: samples.n_responses(),
            });
        }
        if let Some(((k, m), &value)) = weights
            .indexed_iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(VectorFittingError::InvalidWeight {
                sample: k,
                channel: m,
                value,
            });
        }
        Ok(Self(weights))
    }

    /// One weight vector per sample; every vector must match the response width
    pub fn from_rows(rows: &[Vec<f64>], samples: &SampleSet) -> Result<Self> {
        let n_responses = samples.n_responses();
        let mut weights = Array2::<f64>::zeros((rows.len(), n_responses));
        for (k, row) in rows.iter().enumerate() {
            if row.len() != n_responses {
                return Err(VectorFittingError::WeightsShape {
                    rows: rows.len(),
                    cols: row.len(),
                    expected_rows: samples.n_samples(),
                    expected_cols: n_responses,
                });
            }
            weights.row_mut(k).assign(&ArrayView1::from(row.as_slice()));
        }
        Self::from_array(weights, samples)
    }

    /// `1 / |f|` weighting, which favours relative over absolute accuracy
    pub fn inverse_magnitude(samples: &SampleSet) -> Self {
        Self(
            samples
                .responses()
                .mapv(|f| 1.0 / f.norm().max(WEIGHT_MAGNITUDE_FLOOR)),
        )
    }

    /// `1 / sqrt(|f|)` weighting, a compromise between uniform and inverse magnitude
    pub fn inverse_sqrt_magnitude(samples: &SampleSet) -> Self {
        Self(
            samples
                .responses()
                .mapv(|f| 1.0 / f.norm().max(WEIGHT_MAGNITUDE_FLOOR).sqrt()),
        )
    }

    /// Weights of one channel across all samples
    #[inline]
    pub fn channel(&self, m: usize) -> ArrayView1<'_, f64> {
        self.0.column(m)
    }

    #[inline]
    pub fn as_array(&self) -> &Array2<f64> {
        &self.0
    }
}
