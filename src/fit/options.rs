//! Fit-specific configuration

use crate::error::{RegressionError, RegressionResult};

/// The algorithm used to find the coefficients.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveMethod {
    /// Newton steps on the normal equations X'WX b = X'Wz, each solved by the
    /// singular value decomposition. Converges when the coefficients stop
    /// moving.
    IrlsKaneLewis,
    /// Newton steps in the basis of the left singular vectors of X, with a
    /// Cholesky solve of each step. Converges when the step is small.
    IrlsSvdNewton,
    /// The algorithm of R's `glm.fit`: a pivoted QR least-squares solve per
    /// iteration with step halving. Converges when the deviance stops
    /// changing.
    IrlsRGlmFit,
}

impl Default for SolveMethod {
    fn default() -> Self {
        Self::IrlsRGlmFit
    }
}

/// What to do when the design matrix does not have full column rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankDeficiencyMethod {
    /// Fit using a linearly independent subset of the columns. The others
    /// receive zero coefficients and are flagged as aliased.
    SelectColumns,
    /// Use the minimum-norm least-squares solution.
    MinimumNorm,
    /// Fail the fit.
    Error,
}

impl Default for RankDeficiencyMethod {
    fn default() -> Self {
        Self::SelectColumns
    }
}

/// Specifies the fitting options
#[derive(Clone, Copy, Debug)]
pub struct FitOptions {
    pub solve_method: SolveMethod,
    /// The maximum number of IRLS iterations
    pub max_iter: usize,
    /// The convergence tolerance. Its meaning depends on the solve method.
    pub tol: f64,
    pub rank_deficiency: RankDeficiencyMethod,
    /// Whether to report the progress of the fit through the `log` facade.
    pub verbose: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            solve_method: SolveMethod::default(),
            max_iter: 25,
            tol: 1e-8,
            rank_deficiency: RankDeficiencyMethod::default(),
            verbose: false,
        }
    }
}

impl FitOptions {
    /// Select the algorithm
    pub fn solve_method(mut self, solve_method: SolveMethod) -> Self {
        self.solve_method = solve_method;
        self
    }

    /// Use a maximum number of iterations
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the tolerance of iteration
    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn rank_deficiency(mut self, rank_deficiency: RankDeficiencyMethod) -> Self {
        self.rank_deficiency = rank_deficiency;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The tolerance for detecting linear dependence in the QR decomposition,
    /// as chosen by R's `glm.fit`.
    pub fn qr_tol(&self) -> f64 {
        (self.tol / 1000.).min(1e-7)
    }

    pub(crate) fn validate(&self) -> RegressionResult<()> {
        if !(self.tol.is_finite() && self.tol > 0.) {
            return Err(RegressionError::BadInput(format!(
                "tolerance must be positive and finite (got {})",
                self.tol
            )));
        }
        if self.max_iter == 0 {
            return Err(RegressionError::BadInput(
                "maximum number of iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
