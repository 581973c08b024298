//! Stores the result of fitting a GLM and answers questions about it.

pub mod diagnostics;
pub mod options;

use self::diagnostics::FitDiagnostics;
use crate::{
    error::{RegressionError, RegressionResult},
    family::LinkFunctionFamily,
    irls::IrlsOutcome,
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::time::{Duration, SystemTime};

/// The state of a model after an attempt to fit it. The inputs are kept so
/// that predictions and residuals can be computed for the training data.
#[derive(Clone, Debug)]
pub struct GlmFit {
    family: LinkFunctionFamily,
    x: Array2<f64>,
    y: Array1<f64>,
    weights: Array1<f64>,
    coefficients: Array1<f64>,
    aliased: Vec<bool>,
    rank: usize,
    fitted: bool,
    converged: bool,
    boundary: bool,
    n_iter: usize,
    deviance: f64,
    diagnostics: FitDiagnostics,
    started_at: SystemTime,
    finished_at: SystemTime,
}

impl GlmFit {
    /// A result that has not (yet) been fitted, holding copies of the inputs.
    pub(crate) fn unfitted(
        family: LinkFunctionFamily,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        weights: Option<ArrayView1<f64>>,
        started_at: SystemTime,
    ) -> Self {
        let weights = match weights {
            Some(w) => w.to_owned(),
            None => Array1::ones(y.len()),
        };
        Self {
            family,
            x: x.to_owned(),
            y: y.to_owned(),
            weights,
            coefficients: Array1::zeros(0),
            aliased: Vec::new(),
            rank: 0,
            fitted: false,
            converged: false,
            boundary: false,
            n_iter: 0,
            deviance: f64::NAN,
            diagnostics: FitDiagnostics::default(),
            started_at,
            finished_at: started_at,
        }
    }

    pub(crate) fn record(&mut self, outcome: IrlsOutcome) {
        self.coefficients = outcome.coefficients;
        self.aliased = outcome.aliased;
        self.rank = outcome.rank;
        self.converged = outcome.converged;
        self.boundary = outcome.boundary;
        self.n_iter = outcome.n_iter;
        self.deviance = outcome.deviance;
        self.fitted = true;
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut FitDiagnostics {
        &mut self.diagnostics
    }

    pub(crate) fn stop_clock(&mut self) {
        self.finished_at = SystemTime::now();
    }

    fn require_fitted(&self) -> RegressionResult<()> {
        if self.fitted {
            Ok(())
        } else {
            Err(RegressionError::NotFitted)
        }
    }

    /// The coefficients, one for each column of the predictors.
    pub fn coefficients(&self) -> RegressionResult<&Array1<f64>> {
        self.require_fitted()?;
        Ok(&self.coefficients)
    }

    /// The linear predictor X b, for the training predictors or for new ones.
    pub fn predict_eta(&self, x: Option<ArrayView2<f64>>) -> RegressionResult<Array1<f64>> {
        self.require_fitted()?;
        match x {
            Some(x) => self.eta_of(x),
            None => self.eta_of(self.x.view()),
        }
    }

    fn eta_of(&self, x: ArrayView2<f64>) -> RegressionResult<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(RegressionError::BadInput(format!(
                "predictors have {} columns but the model has {} coefficients",
                x.ncols(),
                self.coefficients.len()
            )));
        }
        if x.ncols() == 0 {
            return Ok(Array1::zeros(x.nrows()));
        }
        Ok(x.dot(&self.coefficients))
    }

    /// The predicted mean of the response.
    pub fn predict(&self, x: Option<ArrayView2<f64>>) -> RegressionResult<Array1<f64>> {
        let eta = self.predict_eta(x)?;
        Ok(self.family.inverse_link(eta.view()))
    }

    /// The response residuals y - mu. New predictors must have one row per
    /// training observation.
    pub fn residuals(&self, x: Option<ArrayView2<f64>>) -> RegressionResult<Array1<f64>> {
        if let Some(x) = x {
            if x.nrows() != self.y.len() {
                return Err(RegressionError::BadInput(format!(
                    "predictors have {} rows but there are {} observations",
                    x.nrows(),
                    self.y.len()
                )));
            }
        }
        let mu = self.predict(x)?;
        Ok(&self.y - &mu)
    }

    /// For a model with an intercept and a single slope, the value of the
    /// predictor at which each of the given responses is expected.
    pub fn retrodict_univariate_predictor(
        &self,
        y: ArrayView1<f64>,
    ) -> RegressionResult<Array1<f64>> {
        self.require_fitted()?;
        if self.coefficients.len() != 2 {
            return Err(RegressionError::BadInput(format!(
                "retrodiction needs an intercept and one slope, but there are {} coefficients",
                self.coefficients.len()
            )));
        }
        let (intercept, slope) = (self.coefficients[0], self.coefficients[1]);
        Ok(self.family.link(y).mapv(|eta| (eta - intercept) / slope))
    }

    pub fn fitted(&self) -> bool {
        self.fitted
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Whether the final step of the iteration was shortened.
    pub fn boundary(&self) -> bool {
        self.boundary
    }

    /// The deviance at the final coefficients. NaN if the model was not
    /// fitted.
    pub fn deviance(&self) -> f64 {
        self.deviance
    }

    /// The numerical rank of the predictors.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Which columns were left out of the fit for being linearly dependent on
    /// the others.
    pub fn aliased(&self) -> &[bool] {
        &self.aliased
    }

    pub fn diagnostics(&self) -> &FitDiagnostics {
        &self.diagnostics
    }

    /// Problems encountered, fatal or not.
    pub fn calculation_errors(&self) -> &[String] {
        self.diagnostics.errors()
    }

    /// The log of the progress of the fit.
    pub fn info(&self) -> &[String] {
        self.diagnostics.info_messages()
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    pub fn finished_at(&self) -> SystemTime {
        self.finished_at
    }

    /// The wall-clock time taken by the fit.
    pub fn time_to_fit(&self) -> Duration {
        self.finished_at
            .duration_since(self.started_at)
            .unwrap_or_default()
    }

    pub fn family(&self) -> &LinkFunctionFamily {
        &self.family
    }

    pub fn predictors(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn response(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn n_observations(&self) -> usize {
        self.y.len()
    }

    pub fn n_predictors(&self) -> usize {
        self.x.ncols()
    }
}
