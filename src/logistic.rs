//! Logistic regression: a binomial GLM with the logit link, with helpers to
//! accept boolean or integer responses and to classify new observations.

use crate::{
    error::RegressionResult,
    family::BINOMIAL,
    fit::{options::FitOptions, GlmFit},
    glm::Glm,
    response::Response,
};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Logistic regression
#[derive(Clone, Debug)]
pub struct LogisticRegression {
    glm: Glm,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            glm: Glm::with_family(BINOMIAL),
        }
    }

    pub fn with_options(options: FitOptions) -> RegressionResult<Self> {
        Ok(Self {
            glm: Glm::new(BINOMIAL, options)?,
        })
    }

    /// Fit with an intercept column prepended to x.
    pub fn fit_adding_intercept<Y>(&mut self, x: ArrayView2<f64>, y: ArrayView1<Y>) -> &GlmFit
    where
        Y: Response + Copy,
    {
        let y = to_float(y);
        self.glm.fit_adding_intercept(x, y.view(), None)
    }

    /// Fit to x as given, which should include an intercept column if one is
    /// wanted.
    pub fn fit_directly<Y>(&mut self, x: ArrayView2<f64>, y: ArrayView1<Y>) -> &GlmFit
    where
        Y: Response + Copy,
    {
        let y = to_float(y);
        self.glm.fit(x, y.view(), None)
    }

    /// Fit proportions y to x as given, with each observation weighted by its
    /// number of trials.
    pub fn fit_weighted(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        weights: ArrayView1<f64>,
    ) -> &GlmFit {
        self.glm.fit(x, y, Some(weights))
    }

    /// The predicted probability of a positive outcome.
    pub fn predict_prob(&self, x: Option<ArrayView2<f64>>) -> RegressionResult<Array1<f64>> {
        self.glm.predict(x)
    }

    /// Classify observations as positive when the predicted probability
    /// reaches the threshold. Probabilities of exactly 0 or 1 are always
    /// classified negative and positive respectively, whatever the threshold.
    pub fn predict_binary(
        &self,
        x: Option<ArrayView2<f64>>,
        threshold: f64,
    ) -> RegressionResult<Array1<bool>> {
        let prob = self.predict_prob(x)?;
        Ok(prob.mapv(|p| classify(p, threshold)))
    }

    /// The predicted log-odds of a positive outcome.
    pub fn predict_logit(&self, x: Option<ArrayView2<f64>>) -> RegressionResult<Array1<f64>> {
        self.glm.predict_eta(x)
    }

    pub fn glm(&self) -> &Glm {
        &self.glm
    }
}

fn to_float<Y>(y: ArrayView1<Y>) -> Array1<f64>
where
    Y: Response + Copy,
{
    y.mapv(Response::to_float)
}

fn classify(p: f64, threshold: f64) -> bool {
    if p <= 0. {
        false
    } else if p >= 1. {
        true
    } else {
        p >= threshold
    }
}
