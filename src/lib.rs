//! A library for fitting generalized linear models by iteratively re-weighted
//! least squares, following the numerics of R's `glm.fit`.
//!
//! A [`Glm`] pairs a [`LinkFunctionFamily`] with [`FitOptions`]. Fitting
//! stores a [`GlmFit`] that answers queries for coefficients, predictions and
//! residuals along with diagnostics on how the fit went.
//!
//! ```no_run
//! use irls_glm::{FitOptions, Glm, SolveMethod, POISSON};
//! use ndarray::array;
//!
//! let x = array![[0.], [0.], [1.], [1.]];
//! let y = array![9., 11., 19., 21.];
//! let options = FitOptions::default().solve_method(SolveMethod::IrlsRGlmFit);
//! let mut glm = Glm::new(POISSON, options)?;
//! let fit = glm.fit_adding_intercept(x.view(), y.view(), None);
//! assert!(fit.converged());
//! let coefficients = fit.coefficients()?;
//! # Ok::<(), irls_glm::RegressionError>(())
//! ```

pub mod data;
pub mod error;
pub mod family;
pub mod fit;
mod glm;
pub mod irls;
pub mod link;
mod logistic;
pub mod math;
pub mod qr;
mod response;
pub mod utility;

pub use error::{RegressionError, RegressionResult};
pub use family::{LinkFunctionFamily, BINOMIAL, GAUSSIAN, POISSON};
pub use fit::{
    diagnostics::FitDiagnostics,
    options::{FitOptions, RankDeficiencyMethod, SolveMethod},
    GlmFit,
};
pub use glm::Glm;
pub use logistic::LogisticRegression;
pub use response::Response;
