//! Core VectorFitting struct and main fitting routine

use std::time::Instant;

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use super::basis;
use super::error::{Result, VectorFittingError};
use super::model::{self, FittedModel};
use super::options::Options;
use super::poles::{self, InitPoleSpacing, PoleSet};
use super::relocation::{self, PoleRelocationResult};
use super::residues;
use super::samples::{Sample, SampleSet, Weights};

/// Vector Fitting state: samples, current poles and the last fitted model
#[derive(Debug, Clone)]
pub struct VectorFitting {
    samples: SampleSet,
    weights: Weights,
    poles: PoleSet,
    options: Options,
    model: Option<FittedModel>,
    relocation: Option<PoleRelocationResult>,

    /// Wall-clock time of last fit (in seconds)
    pub wall_clock_time: f64,
}

impl VectorFitting {
    /// Create a fitter from samples and explicit starting poles
    ///
    /// # Arguments
    /// * `samples` - Tabulated responses, all with the same width
    /// * `poles` - Starting poles; every complex pole followed by its conjugate
    /// * `options` - Fitting options
    /// * `weights` - Optional `[n_samples, n_responses]` weights (all ones if `None`)
    pub fn new(
        samples: &[Sample],
        poles: Vec<Complex64>,
        options: Options,
        weights: Option<Array2<f64>>,
    ) -> Result<Self> {
        let sample_set = SampleSet::new(samples)?;
        let pole_set = PoleSet::from_vec(poles)?;
        Self::from_sample_set(sample_set, pole_set, options, weights)
    }

    /// Create a fitter with `order / 2` seeded conjugate pairs
    ///
    /// The seeds span the imaginary range of the sample points.
    pub fn with_order(
        samples: &[Sample],
        order: usize,
        spacing: InitPoleSpacing,
        options: Options,
        weights: Option<Array2<f64>>,
    ) -> Result<Self> {
        let sample_set = SampleSet::new(samples)?;
        let pole_set = poles::init_poles(sample_set.imag_range(), order, spacing)?;
        Self::from_sample_set(sample_set, pole_set, options, weights)
    }

    /// Create a fitter from an already validated sample set and pole set
    pub fn from_sample_set(
        samples: SampleSet,
        poles: PoleSet,
        options: Options,
        weights: Option<Array2<f64>>,
    ) -> Result<Self> {
        let weights = match weights {
            Some(w) => Weights::from_array(w, &samples)?,
            None => Weights::uniform(&samples),
        };
        basis::check_sample_count(samples.n_samples(), poles.len(), options.asymptotic_trend)?;

        log::debug!(
            "vector fitting set up: {} samples, {} channels, order {}",
            samples.n_samples(),
            samples.n_responses(),
            poles.len()
        );

        Ok(Self {
            samples,
            weights,
            poles,
            options,
            model: None,
            relocation: None,
            wall_clock_time: 0.0,
        })
    }

    /// Run one pole relocation and residue identification pass
    ///
    /// Either stage can be skipped through the options. The poles and the
    /// model are only replaced when the whole pass succeeds.
    pub fn fit(&mut self) -> Result<()> {
        let timer_start = Instant::now();
        let trend = self.options.asymptotic_trend;

        let relocated = if self.options.skip_pole_identification {
            log::debug!("pole identification skipped");
            None
        } else {
            Some(relocation::identify_poles(
                &self.samples,
                &self.weights,
                &self.poles,
                &self.options,
            )?)
        };
        let poles = match &relocated {
            Some(result) => result.poles.clone(),
            None => self.poles.clone(),
        };

        let model = if self.options.skip_residue_identification {
            log::warn!("residue identification skipped; model carries zero residues");
            FittedModel::zero(poles.clone(), self.samples.n_responses(), trend)
        } else {
            let fit = residues::fit_residues(&self.samples, &self.weights, &poles, trend)?;
            FittedModel::new(
                poles.clone(),
                fit.residues,
                fit.constant_coeff,
                fit.proportional_coeff,
                trend,
            )?
        };

        self.poles = poles;
        self.model = Some(model);
        self.relocation = relocated;
        self.wall_clock_time = timer_start.elapsed().as_secs_f64();

        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "fit pass done in {:.3e} s, rmse {:e}",
                self.wall_clock_time,
                self.rmse()?
            );
        }
        Ok(())
    }

    /// Run `n` consecutive passes and return the RMSE after each one
    pub fn fit_iterations(&mut self, n: usize) -> Result<Vec<f64>> {
        let mut history = Vec::with_capacity(n);
        for _ in 0..n {
            self.fit()?;
            history.push(self.rmse()?);
        }
        Ok(history)
    }

    /// Current poles (the starting poles until the first `fit`)
    pub fn poles(&self) -> &Array1<Complex64> {
        self.poles.poles()
    }

    pub fn pole_set(&self) -> &PoleSet {
        &self.poles
    }

    /// Residues `[n_responses, n_poles]` of the last fit
    pub fn residues(&self) -> Result<&Array2<Complex64>> {
        Ok(self.model()?.residues())
    }

    /// Diagnostics of the last pole relocation
    ///
    /// `None` before the first `fit` and after a pass that skipped pole
    /// identification.
    pub fn last_relocation(&self) -> Option<&PoleRelocationResult> {
        self.relocation.as_ref()
    }

    /// The last fitted model
    pub fn model(&self) -> Result<&FittedModel> {
        self.model.as_ref().ok_or(VectorFittingError::ModelNotFitted)
    }

    /// Model evaluated at the sample points
    pub fn fitted_samples(&self) -> Result<Vec<Sample>> {
        let response = self.fitted_responses()?;
        Ok(self
            .samples
            .s()
            .iter()
            .zip(response.outer_iter())
            .map(|(&s_k, row)| Sample::new(s_k, row.to_vec()))
            .collect())
    }

    /// Model evaluated at arbitrary points
    pub fn fitted_samples_at(&self, s: &[Complex64]) -> Result<Vec<Sample>> {
        let response = self.model()?.evaluate(s);
        Ok(s.iter()
            .zip(response.outer_iter())
            .map(|(&s_k, row)| Sample::new(s_k, row.to_vec()))
            .collect())
    }

    /// RMS deviation over all samples and channels
    pub fn rmse(&self) -> Result<f64> {
        model::rms_error(&self.fitted_responses()?, self.samples.responses())
    }

    /// RMS deviation of each channel
    pub fn rmse_per_channel(&self) -> Result<Array1<f64>> {
        model::rms_error_per_channel(&self.fitted_responses()?, self.samples.responses())
    }

    /// Largest absolute deviation over all samples and channels
    pub fn max_deviation(&self) -> Result<f64> {
        model::max_error(&self.fitted_responses()?, self.samples.responses())
    }

    /// Model order N
    #[inline]
    pub fn order(&self) -> usize {
        self.poles.len()
    }

    #[inline]
    pub fn samples_size(&self) -> usize {
        self.samples.n_samples()
    }

    #[inline]
    pub fn response_size(&self) -> usize {
        self.samples.n_responses()
    }

    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Replace the options used by the next `fit`
    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    fn fitted_responses(&self) -> Result<Array2<Complex64>> {
        let s = self.samples.s();
        let model = self.model()?;
        Ok(match s.as_slice() {
            Some(points) => model.evaluate(points),
            None => model.evaluate(&s.to_vec()),
        })
    }
}
