//! define the error enum for the result of regressions

use ndarray_linalg::error::LinalgError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegressionError {
    #[error("Inconsistent input: {0}")]
    BadInput(String),
    #[error("Invalid response data: {0}")]
    InvalidY(String),
    #[error("Numerical failure: {0}")]
    Domain(String),
    #[error("Rank-deficient model matrix: rank {rank} with {n_cols} columns")]
    RankDeficient { rank: usize, n_cols: usize },
    #[error("No valid set of coefficients has been found: please supply starting values")]
    NoValidCoefficients,
    #[error("X matrix has rank {rank}, but only {n_obs} observation(s)")]
    Underconstrained { rank: usize, n_obs: usize },
    #[error("Model has not been fitted")]
    NotFitted,
    #[error("Linear algebra")]
    LinalgError {
        #[from]
        source: LinalgError,
    },
}

pub type RegressionResult<T> = Result<T, RegressionError>;
