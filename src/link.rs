//! Defines the link functions mapping between the expectation of the
//! response and the linear predictor.

use crate::math::{d_logistic, logistic, logit};

/// Describes the functions to map to and from the linear predictors and the
/// expectation of the response, along with the derivative of the inverse
/// that weights each IRLS step.
pub trait Link {
    /// Maps the expectation value of the response variable to the linear
    /// predictor, eta = g(mu).
    fn func(mu: f64) -> f64;
    /// Maps the linear predictor to the expectation value of the response,
    /// mu = g^-1(eta).
    fn func_inv(lin_pred: f64) -> f64;
    /// The derivative d(mu)/d(eta) of the inverse link. If it is zero in a
    /// region that the IRLS is in the algorithm may have difficulty
    /// converging.
    fn d_func_inv(lin_pred: f64) -> f64;
}

/// The identity link function, which is canonical for linear regression.
pub struct Identity;
impl Link for Identity {
    #[inline]
    fn func(mu: f64) -> f64 {
        mu
    }
    #[inline]
    fn func_inv(lin_pred: f64) -> f64 {
        lin_pred
    }
    #[inline]
    fn d_func_inv(_lin_pred: f64) -> f64 {
        1.
    }
}

/// The canonical link function for logistic regression is the logit function g(p) =
/// log(p/(1-p)).
pub struct Logit;
impl Link for Logit {
    fn func(mu: f64) -> f64 {
        logit(mu)
    }
    fn func_inv(lin_pred: f64) -> f64 {
        logistic(lin_pred)
    }
    fn d_func_inv(lin_pred: f64) -> f64 {
        d_logistic(lin_pred)
    }
}

/// The canonical link function of the Poisson response is the logarithm. The
/// inverse is floored at machine epsilon so that the mean stays positive.
pub struct Log;
impl Link for Log {
    fn func(mu: f64) -> f64 {
        mu.ln()
    }
    fn func_inv(lin_pred: f64) -> f64 {
        lin_pred.exp().max(f64::EPSILON)
    }
    fn d_func_inv(lin_pred: f64) -> f64 {
        lin_pred.exp().max(f64::EPSILON)
    }
}
