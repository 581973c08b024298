//! Validated observation data for a fit: the design matrix, the response and
//! the prior weights.

use crate::error::{RegressionError, RegressionResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Holds the data for a regression once it has been checked for consistency.
#[derive(Clone, Debug)]
pub struct Dataset {
    /// The regressor data with observations in rows and predictors in columns
    pub x: Array2<f64>,
    /// The observed response for each row
    pub y: Array1<f64>,
    /// The prior weight of each observation
    pub weights: Array1<f64>,
}

impl Dataset {
    /// Checks the shapes and values of the inputs. Weights default to one for
    /// each observation.
    pub fn new(
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        weights: Option<ArrayView1<f64>>,
    ) -> RegressionResult<Self> {
        let n_data = y.len();
        if x.nrows() != n_data {
            return Err(RegressionError::BadInput(format!(
                "predictors have {} rows but the response has {} entries",
                x.nrows(),
                n_data
            )));
        }
        let weights = match weights {
            Some(wts) => {
                if wts.len() != n_data {
                    return Err(RegressionError::BadInput(format!(
                        "weights have {} entries but the response has {}",
                        wts.len(),
                        n_data
                    )));
                }
                if wts.iter().any(|w| !w.is_finite() || *w < 0.) {
                    return Err(RegressionError::BadInput(
                        "weights must be finite and non-negative".to_string(),
                    ));
                }
                wts.to_owned()
            }
            None => Array1::ones(n_data),
        };
        if x.iter().any(|v| !v.is_finite()) {
            return Err(RegressionError::BadInput(
                "predictors must be finite".to_string(),
            ));
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(RegressionError::BadInput(
                "response must be finite".to_string(),
            ));
        }
        Ok(Self {
            x: x.to_owned(),
            y: y.to_owned(),
            weights,
        })
    }

    /// The number of observations
    pub fn n_obs(&self) -> usize {
        self.y.len()
    }

    /// The number of predictors, including any intercept column
    pub fn n_pred(&self) -> usize {
        self.x.ncols()
    }
}
