//! GLM families: the bundle of link, variance, deviance and initialization
//! functions that the IRLS algorithm needs for a particular response
//! distribution.
//!
//! A family is a plain record of function pointers, so new families are made
//! by filling in the record rather than by implementing a trait. Non-capturing
//! closures coerce to the function pointer types.

use crate::{
    error::{RegressionError, RegressionResult},
    link::{Identity, Link, Log, Logit},
    math::{all_integer, y_log_y},
};
use itertools::izip;
use ndarray::{Array1, ArrayView1, Zip};
use std::fmt;

pub const LINK_FAMILY_NAME_GAUSSIAN: &str = "gaussian";
pub const LINK_FAMILY_NAME_BINOMIAL: &str = "binomial";
pub const LINK_FAMILY_NAME_POISSON: &str = "poisson";

/// An elementwise map over an array, e.g. the link function.
pub type ArrayFn = fn(ArrayView1<f64>) -> Array1<f64>;
/// Deviance residuals as a function of (y, mu, weights).
pub type DevResidsFn = fn(ArrayView1<f64>, ArrayView1<f64>, ArrayView1<f64>) -> Array1<f64>;
/// A validity check over a whole array.
pub type ValidFn = fn(ArrayView1<f64>) -> bool;
/// Produces starting values from the response and the prior weights.
pub type InitializeFn = fn(ArrayView1<f64>, ArrayView1<f64>) -> RegressionResult<Initialization>;

/// Starting values produced by a family's initialization routine.
#[derive(Clone, Debug)]
pub struct Initialization {
    /// The response, possibly adjusted by the family.
    pub y: Array1<f64>,
    /// The prior weights, possibly adjusted by the family.
    pub weights: Array1<f64>,
    /// Starting values for the mean of the response.
    pub mustart: Array1<f64>,
    /// Problems that do not prevent fitting.
    pub warnings: Vec<String>,
}

/// Describes a GLM family: the link function and its inverse, the variance
/// as a function of the mean, the deviance, validity checks and a starting
/// value heuristic.
#[derive(Clone, Copy)]
pub struct LinkFunctionFamily {
    pub family_name: &'static str,
    pub link_name: &'static str,
    /// eta = link(mu)
    pub link_fn: ArrayFn,
    /// mu = link^-1(eta)
    pub inv_link_fn: ArrayFn,
    /// d(mu)/d(eta)
    pub derivative_inv_link_fn: ArrayFn,
    /// V(mu)
    pub variance_fn: ArrayFn,
    pub dev_resids_fn: DevResidsFn,
    pub valid_eta_fn: ValidFn,
    pub valid_mu_fn: ValidFn,
    pub initialize_fn: InitializeFn,
}

impl fmt::Debug for LinkFunctionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkFunctionFamily")
            .field("family_name", &self.family_name)
            .field("link_name", &self.link_name)
            .finish()
    }
}

impl LinkFunctionFamily {
    pub fn link(&self, mu: ArrayView1<f64>) -> Array1<f64> {
        (self.link_fn)(mu)
    }

    pub fn inverse_link(&self, eta: ArrayView1<f64>) -> Array1<f64> {
        (self.inv_link_fn)(eta)
    }

    pub fn derivative_inverse_link(&self, eta: ArrayView1<f64>) -> Array1<f64> {
        (self.derivative_inv_link_fn)(eta)
    }

    pub fn variance(&self, mu: ArrayView1<f64>) -> Array1<f64> {
        (self.variance_fn)(mu)
    }

    pub fn deviance_residuals(
        &self,
        y: ArrayView1<f64>,
        mu: ArrayView1<f64>,
        weights: ArrayView1<f64>,
    ) -> Array1<f64> {
        (self.dev_resids_fn)(y, mu, weights)
    }

    /// The total deviance, summed over observations.
    pub fn deviance(&self, y: ArrayView1<f64>, mu: ArrayView1<f64>, weights: ArrayView1<f64>) -> f64 {
        self.deviance_residuals(y, mu, weights).sum()
    }

    pub fn valid_eta(&self, eta: ArrayView1<f64>) -> bool {
        (self.valid_eta_fn)(eta)
    }

    pub fn valid_mu(&self, mu: ArrayView1<f64>) -> bool {
        (self.valid_mu_fn)(mu)
    }

    pub fn initialize(
        &self,
        y: ArrayView1<f64>,
        weights: ArrayView1<f64>,
    ) -> RegressionResult<Initialization> {
        (self.initialize_fn)(y, weights)
    }

    /// Whether this is the named family, e.g. `LINK_FAMILY_NAME_BINOMIAL`.
    pub fn is(&self, family_name: &str) -> bool {
        self.family_name == family_name
    }
}

/// Normal errors with the identity link: ordinary (weighted) least squares.
pub const GAUSSIAN: LinkFunctionFamily = LinkFunctionFamily {
    family_name: LINK_FAMILY_NAME_GAUSSIAN,
    link_name: "identity",
    link_fn: apply_link::<Identity>,
    inv_link_fn: apply_inverse_link::<Identity>,
    derivative_inv_link_fn: apply_derivative_inverse_link::<Identity>,
    variance_fn: unit_variance,
    dev_resids_fn: gaussian_dev_resids,
    valid_eta_fn: all_finite,
    valid_mu_fn: all_finite,
    initialize_fn: gaussian_initialize,
};

/// Bernoulli/binomial proportions with the logit link: logistic regression.
pub const BINOMIAL: LinkFunctionFamily = LinkFunctionFamily {
    family_name: LINK_FAMILY_NAME_BINOMIAL,
    link_name: "logit",
    link_fn: apply_link::<Logit>,
    inv_link_fn: apply_inverse_link::<Logit>,
    derivative_inv_link_fn: apply_derivative_inverse_link::<Logit>,
    variance_fn: binomial_variance,
    dev_resids_fn: binomial_dev_resids,
    valid_eta_fn: all_finite,
    valid_mu_fn: binomial_valid_mu,
    initialize_fn: binomial_initialize,
};

/// Counts with the log link.
pub const POISSON: LinkFunctionFamily = LinkFunctionFamily {
    family_name: LINK_FAMILY_NAME_POISSON,
    link_name: "log",
    link_fn: apply_link::<Log>,
    inv_link_fn: apply_inverse_link::<Log>,
    derivative_inv_link_fn: apply_derivative_inverse_link::<Log>,
    variance_fn: poisson_variance,
    dev_resids_fn: poisson_dev_resids,
    valid_eta_fn: all_finite,
    valid_mu_fn: poisson_valid_mu,
    initialize_fn: poisson_initialize,
};

pub fn apply_link<L: Link>(mu: ArrayView1<f64>) -> Array1<f64> {
    mu.mapv(L::func)
}

pub fn apply_inverse_link<L: Link>(eta: ArrayView1<f64>) -> Array1<f64> {
    eta.mapv(L::func_inv)
}

pub fn apply_derivative_inverse_link<L: Link>(eta: ArrayView1<f64>) -> Array1<f64> {
    eta.mapv(L::d_func_inv)
}

pub fn all_finite(x: ArrayView1<f64>) -> bool {
    x.iter().all(|v| v.is_finite())
}

// ----------------------------------------------------------------------------
// gaussian
// ----------------------------------------------------------------------------

/// Variance is not a function of the mean in OLS regression.
pub fn unit_variance(mu: ArrayView1<f64>) -> Array1<f64> {
    Array1::<f64>::ones(mu.len())
}

pub fn gaussian_dev_resids(
    y: ArrayView1<f64>,
    mu: ArrayView1<f64>,
    weights: ArrayView1<f64>,
) -> Array1<f64> {
    let mut resids = &y - &mu;
    resids.mapv_inplace(|r| r * r);
    resids * &weights
}

pub fn gaussian_initialize(
    y: ArrayView1<f64>,
    weights: ArrayView1<f64>,
) -> RegressionResult<Initialization> {
    Ok(Initialization {
        y: y.to_owned(),
        weights: weights.to_owned(),
        mustart: y.to_owned(),
        warnings: Vec::new(),
    })
}

// ----------------------------------------------------------------------------
// binomial
// ----------------------------------------------------------------------------

/// var = mu*(1-mu)
pub fn binomial_variance(mu: ArrayView1<f64>) -> Array1<f64> {
    mu.mapv(|m| m * (1. - m))
}

pub fn binomial_dev_resids(
    y: ArrayView1<f64>,
    mu: ArrayView1<f64>,
    weights: ArrayView1<f64>,
) -> Array1<f64> {
    izip!(y.iter(), mu.iter(), weights.iter())
        .map(|(&y, &mu, &wt)| 2. * wt * (y_log_y(y, mu) + y_log_y(1. - y, 1. - mu)))
        .collect()
}

pub fn binomial_valid_mu(mu: ArrayView1<f64>) -> bool {
    mu.iter().all(|&m| m.is_finite() && m > 0. && m < 1.)
}

/// Only a single column of proportions (or 0/1 outcomes) is supported; the
/// weights act as the number of trials.
pub fn binomial_initialize(
    y: ArrayView1<f64>,
    weights: ArrayView1<f64>,
) -> RegressionResult<Initialization> {
    let mut y = y.to_owned();
    Zip::from(&mut y).and(&weights).apply(|y, &wt| {
        if wt == 0. {
            *y = 0.;
        }
    });
    if let Some(bad) = y.iter().find(|&&v| !(0. ..=1.).contains(&v)) {
        return Err(RegressionError::InvalidY(format!(
            "y values must be 0 <= y <= 1 (found {})",
            bad
        )));
    }
    let mustart: Array1<f64> = y
        .iter()
        .zip(weights.iter())
        .map(|(&y, &wt)| (wt * y + 0.5) / (wt + 1.))
        .collect();
    let successes = &y * &weights;
    let mut warnings = Vec::new();
    if !all_integer(successes.view(), 1e-3) {
        warnings.push("non-integer #successes in a binomial glm!".to_string());
    }
    Ok(Initialization {
        weights: weights.to_owned(),
        y,
        mustart,
        warnings,
    })
}

// ----------------------------------------------------------------------------
// poisson
// ----------------------------------------------------------------------------

/// The variance of a Poisson variable is equal to its mean.
pub fn poisson_variance(mu: ArrayView1<f64>) -> Array1<f64> {
    mu.to_owned()
}

pub fn poisson_dev_resids(
    y: ArrayView1<f64>,
    mu: ArrayView1<f64>,
    weights: ArrayView1<f64>,
) -> Array1<f64> {
    izip!(y.iter(), mu.iter(), weights.iter())
        .map(|(&y, &mu, &wt)| {
            if y > 0. {
                2. * wt * (y_log_y(y, mu) - (y - mu))
            } else {
                2. * wt * mu
            }
        })
        .collect()
}

pub fn poisson_valid_mu(mu: ArrayView1<f64>) -> bool {
    mu.iter().all(|&m| m.is_finite() && m > 0.)
}

pub fn poisson_initialize(
    y: ArrayView1<f64>,
    weights: ArrayView1<f64>,
) -> RegressionResult<Initialization> {
    if let Some(bad) = y.iter().find(|&&v| v < 0.) {
        return Err(RegressionError::InvalidY(format!(
            "negative values not allowed for the 'Poisson' family (found {})",
            bad
        )));
    }
    Ok(Initialization {
        y: y.to_owned(),
        weights: weights.to_owned(),
        mustart: y.mapv(|v| v + 0.1),
        warnings: Vec::new(),
    })
}
