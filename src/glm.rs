//! The GLM engine: a family and fitting options, together with the result of
//! the most recent fit.
//! Models are fit such that E[Y] = g^-1(X*B) where g is the link function.

use crate::{
    data::Dataset,
    error::{RegressionError, RegressionResult},
    family::LinkFunctionFamily,
    fit::{diagnostics::FitDiagnostics, options::FitOptions, GlmFit},
    irls::Irls,
    utility::one_pad,
};
use ndarray::{Array1, ArrayView1, ArrayView2};
use std::time::{Duration, SystemTime};

/// A generalized linear model of a given family, fit by iteratively
/// re-weighted least squares.
///
/// Each call to `fit` replaces the previous result. Failures do not panic or
/// return early: they leave an unfitted result whose `calculation_errors`
/// explain what went wrong.
#[derive(Clone, Debug)]
pub struct Glm {
    family: LinkFunctionFamily,
    options: FitOptions,
    last_fit: Option<GlmFit>,
}

impl Glm {
    pub fn new(family: LinkFunctionFamily, options: FitOptions) -> RegressionResult<Self> {
        options.validate()?;
        Ok(Self {
            family,
            options,
            last_fit: None,
        })
    }

    /// A model with the default fitting options.
    pub fn with_family(family: LinkFunctionFamily) -> Self {
        Self {
            family,
            options: FitOptions::default(),
            last_fit: None,
        }
    }

    pub fn family(&self) -> &LinkFunctionFamily {
        &self.family
    }

    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    /// Fit the model to predictors x (observations in rows) and response y,
    /// optionally with prior weights for each observation.
    pub fn fit(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        weights: Option<ArrayView1<f64>>,
    ) -> &GlmFit {
        let mut fit = GlmFit::unfitted(self.family, x, y, weights, SystemTime::now());
        fit.diagnostics_mut().info(format!(
            "fitting GLM of family {} with link {} to {} observation(s) of {} predictor(s)",
            self.family.family_name,
            self.family.link_name,
            y.len(),
            x.ncols()
        ));
        let outcome = Dataset::new(x, y, weights).and_then(|data| {
            Irls::new(&self.family, &self.options, &data, fit.diagnostics_mut())?.run()
        });
        match outcome {
            Ok(outcome) => fit.record(outcome),
            Err(err) => fit.diagnostics_mut().error(err.to_string()),
        }
        fit.stop_clock();
        self.report(&fit);
        self.last_fit.insert(fit)
    }

    /// As `fit`, with a column of ones prepended to x for the intercept.
    pub fn fit_adding_intercept(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        weights: Option<ArrayView1<f64>>,
    ) -> &GlmFit {
        let x = one_pad(x);
        self.fit(x.view(), y, weights)
    }

    fn report(&self, fit: &GlmFit) {
        let diagnostics: &FitDiagnostics = fit.diagnostics();
        if self.options.verbose {
            for msg in diagnostics.info_messages() {
                log::info!("{}", msg);
            }
        }
        for msg in diagnostics.errors() {
            log::warn!("{}", msg);
        }
        if !fit.fitted() {
            log::warn!("GLM could not be fitted");
        } else if !fit.converged() {
            log::warn!("GLM did not converge");
        } else if self.options.verbose {
            log::info!("GLM fitted in {} iteration(s)", fit.n_iter());
        }
    }

    /// The result of the most recent fit, if there has been one.
    pub fn last_fit(&self) -> Option<&GlmFit> {
        self.last_fit.as_ref()
    }

    fn require_fit(&self) -> RegressionResult<&GlmFit> {
        self.last_fit.as_ref().ok_or(RegressionError::NotFitted)
    }

    pub fn coefficients(&self) -> RegressionResult<&Array1<f64>> {
        self.require_fit()?.coefficients()
    }

    pub fn predict(&self, x: Option<ArrayView2<f64>>) -> RegressionResult<Array1<f64>> {
        self.require_fit()?.predict(x)
    }

    pub fn predict_eta(&self, x: Option<ArrayView2<f64>>) -> RegressionResult<Array1<f64>> {
        self.require_fit()?.predict_eta(x)
    }

    pub fn residuals(&self, x: Option<ArrayView2<f64>>) -> RegressionResult<Array1<f64>> {
        self.require_fit()?.residuals(x)
    }

    pub fn retrodict_univariate_predictor(
        &self,
        y: ArrayView1<f64>,
    ) -> RegressionResult<Array1<f64>> {
        self.require_fit()?.retrodict_univariate_predictor(y)
    }

    /// Whether the last fit succeeded.
    pub fn fitted(&self) -> bool {
        self.last_fit.as_ref().map_or(false, GlmFit::fitted)
    }

    pub fn converged(&self) -> bool {
        self.last_fit.as_ref().map_or(false, GlmFit::converged)
    }

    pub fn n_iter(&self) -> usize {
        self.last_fit.as_ref().map_or(0, GlmFit::n_iter)
    }

    pub fn calculation_errors(&self) -> &[String] {
        self.last_fit
            .as_ref()
            .map(GlmFit::calculation_errors)
            .unwrap_or(&[])
    }

    pub fn info(&self) -> &[String] {
        self.last_fit.as_ref().map(GlmFit::info).unwrap_or(&[])
    }

    pub fn time_to_fit(&self) -> Option<Duration> {
        self.last_fit.as_ref().map(GlmFit::time_to_fit)
    }
}
