//! Iteratively re-weighted least squares algorithms
//!
//! Each iteration linearises the model about the current linear predictor
//! eta, giving a working response z = eta + (y - mu) / (dmu/deta) and working
//! weights w = prior * (dmu/deta)^2 / V(mu), and solves the weighted
//! least-squares problem of z on X. The three solve methods differ in how
//! that problem is solved and in when they declare convergence. All of them
//! also stop once the working problem at the new iterate is the one just
//! solved, since another step could not move the coefficients.

use crate::{
    data::Dataset,
    error::{RegressionError, RegressionResult},
    family::{LinkFunctionFamily, LINK_FAMILY_NAME_BINOMIAL, LINK_FAMILY_NAME_POISSON},
    fit::{
        diagnostics::FitDiagnostics,
        options::{FitOptions, RankDeficiencyMethod, SolveMethod},
    },
    qr::{decompose, dqrls, svd_solve},
    utility::{
        expand_coefficients, mask_indices, scale_rows, select_elements, select_rows, unchanged,
    },
};
use itertools::izip;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_linalg::{Cholesky, Diag, Norm, SolveTriangular, SVD, UPLO};

/// The end state of the iteration.
#[derive(Clone, Debug)]
pub struct IrlsOutcome {
    /// One coefficient per column of X. Columns left out of the fit have
    /// zero coefficients.
    pub coefficients: Array1<f64>,
    pub converged: bool,
    pub n_iter: usize,
    /// Whether the last step had to be shortened to stay in the domain.
    pub boundary: bool,
    pub deviance: f64,
    pub rank: usize,
    /// Columns that were left out because they are linearly dependent on the
    /// others.
    pub aliased: Vec<bool>,
}

/// The weighted least-squares problem for one iteration.
struct WorkingSystem {
    z: Array1<f64>,
    w: Array1<f64>,
    mu_eta: Array1<f64>,
}

impl WorkingSystem {
    /// Whether solving this system would reproduce the solution of `other`.
    fn matches(&self, other: &Self, tol: f64) -> bool {
        unchanged(self.w.view(), other.w.view(), tol) && unchanged(self.z.view(), other.z.view(), tol)
    }
}

/// Iterate until reaching the tolerance or the maximum number of iterations.
pub struct Irls<'a> {
    family: &'a LinkFunctionFamily,
    options: &'a FitOptions,
    data: &'a Dataset,
    diagnostics: &'a mut FitDiagnostics,
    /// The response and weights as adjusted by the family
    y: Array1<f64>,
    weights: Array1<f64>,
    /// Starting values of the mean
    mustart: Array1<f64>,
}

impl<'a> Irls<'a> {
    /// Prepares the iteration, running the family's initialization.
    pub fn new(
        family: &'a LinkFunctionFamily,
        options: &'a FitOptions,
        data: &'a Dataset,
        diagnostics: &'a mut FitDiagnostics,
    ) -> RegressionResult<Self> {
        let init = family.initialize(data.y.view(), data.weights.view())?;
        for warning in &init.warnings {
            diagnostics.error(warning.as_str());
        }
        Ok(Self {
            family,
            options,
            data,
            diagnostics,
            y: init.y,
            weights: init.weights,
            mustart: init.mustart,
        })
    }

    pub fn run(mut self) -> RegressionResult<IrlsOutcome> {
        if self.data.n_pred() == 0 {
            return self.null_model(0);
        }
        let rank = decompose(self.data.x.view(), self.options.qr_tol()).rank();
        self.check_observations(rank)?;
        match self.options.solve_method {
            SolveMethod::IrlsKaneLewis => self.kane_lewis(),
            SolveMethod::IrlsSvdNewton => self.svd_newton(),
            SolveMethod::IrlsRGlmFit => self.r_glm_fit(),
        }
    }

    /// Newton steps on the normal equations X'WX b = X'Wz, starting from
    /// zero and stopping when the coefficients stop moving.
    fn kane_lewis(&mut self) -> RegressionResult<IrlsOutcome> {
        let data = self.data;
        let p = data.n_pred();
        let tol = self.options.tol;
        let qr_tol = self.options.qr_tol();

        let informative: Vec<bool> = self.weights.iter().map(|&w| w > 0.).collect();
        let qr = decompose(select_rows(data.x.view(), &informative).view(), qr_tol);
        let kept = self.select_columns(qr.rank(), qr.pivot())?;
        if kept.is_empty() {
            return self.null_model(p);
        }
        let x = data.x.select(Axis(1), &kept);

        let mut coef = Array1::<f64>::zeros(kept.len());
        let eta = x.dot(&coef);
        self.check_valid(eta.view())?;
        let mut system = self.working_system(eta.view(), self.weights.view())?;
        let mut converged = false;
        let mut n_iter = 0;
        for iter in 1..=self.options.max_iter {
            n_iter = iter;
            let xw = scale_rows(x.view(), system.w.view());
            let lhs = x.t().dot(&xw);
            let rhs = xw.t().dot(&system.z);
            let next = svd_solve(lhs.view(), rhs.view(), qr_tol)?.coefficients;
            let step = (&next - &coef).norm_l2();
            coef = next;
            let eta = x.dot(&coef);
            self.check_valid(eta.view())?;
            self.diagnostics
                .info(format!("iteration {}: coefficient change {:e}", iter, step));
            if step < tol {
                converged = true;
                break;
            }
            let next_system = self.working_system(eta.view(), self.weights.view())?;
            if next_system.matches(&system, tol) {
                converged = true;
                break;
            }
            system = next_system;
        }

        let coefficients = expand_coefficients(coef.view(), &kept, p);
        let aliased = aliased_columns(&kept, p);
        Ok(self.finish(coefficients, converged, n_iter, false, qr.rank(), aliased))
    }

    /// Newton steps in the basis of the left singular vectors of X, stopping
    /// when the step in that basis is small.
    fn svd_newton(&mut self) -> RegressionResult<IrlsOutcome> {
        let data = self.data;
        let (m, p) = data.x.dim();
        let tol = self.options.tol;

        // rows with zero weight do not inform the fit
        let mut a = data.x.clone();
        for (mut row, &w) in a.outer_iter_mut().zip(self.weights.iter()) {
            if w == 0. {
                row.fill(0.);
            }
        }
        let (u, d, vt) = thin_svd(a.view())?;
        let d0 = d.iter().cloned().fold(0., f64::max);
        let rank = d.iter().filter(|&&di| d0 > 0. && di / d0 >= tol).count();

        let (kept, u, d, vt) = if rank < p {
            let qr = decompose(a.view(), self.options.qr_tol());
            let kept = self.select_columns(rank.min(qr.rank()), qr.pivot())?;
            if self.options.rank_deficiency == RankDeficiencyMethod::MinimumNorm {
                (
                    kept,
                    u.slice(s![.., ..rank]).to_owned(),
                    d.slice(s![..rank]).to_owned(),
                    vt.slice(s![..rank, ..]).to_owned(),
                )
            } else {
                let (u, d, vt) = thin_svd(a.select(Axis(1), &kept).view())?;
                (kept, u, d, vt)
            }
        } else {
            ((0..p).collect(), u, d, vt)
        };
        let r = d.len();
        if r == 0 {
            return self.null_model(p);
        }

        let mut t = Array1::<f64>::zeros(m);
        let mut s_coef = Array1::<f64>::zeros(r);
        self.check_valid(t.view())?;
        let mut system = self.working_system(t.view(), self.weights.view())?;
        let mut good = informative_rows(&system);
        let mut converged = false;
        let mut n_iter = 0;
        for iter in 1..=self.options.max_iter {
            n_iter = iter;
            let n_good = good.iter().filter(|&&g| g).count();
            if n_good < r {
                return Err(RegressionError::Underconstrained {
                    rank: r,
                    n_obs: n_good,
                });
            }
            let u_good = select_rows(u.view(), &good);
            let w_good = select_elements(system.w.view(), &good);
            let z_good = select_elements(system.z.view(), &good);
            let uw = scale_rows(u_good.view(), w_good.view());
            let lhs: Array2<f64> = u_good.t().dot(&uw);
            let rhs = uw.t().dot(&z_good);
            let next = cholesky_solve(lhs, rhs)?;
            let step = (&next - &s_coef).norm_l2();
            s_coef = next;

            t = Array1::zeros(m);
            let t_good = u_good.dot(&s_coef);
            for (i, &ti) in mask_indices(&good).into_iter().zip(t_good.iter()) {
                t[i] = ti;
            }
            self.check_valid(t.view())?;
            self.diagnostics
                .info(format!("iteration {}: step size {:e}", iter, step));
            if step < tol {
                converged = true;
                break;
            }
            let good_weights: Array1<f64> = self
                .weights
                .iter()
                .zip(good.iter())
                .map(|(&w, &g)| if g { w } else { 0. })
                .collect();
            let next_system = self.working_system(t.view(), good_weights.view())?;
            if next_system.matches(&system, tol) {
                converged = true;
                break;
            }
            system = next_system;
            good = informative_rows(&system);
        }

        // back from the singular-vector basis to the coefficients
        let u_good = select_rows(u.view(), &good);
        let t_good = select_elements(t.view(), &good);
        let scaled = u_good.t().dot(&t_good) / &d;
        let coef = vt.t().dot(&scaled);
        let coefficients = expand_coefficients(coef.view(), &kept, p);
        let aliased = aliased_columns(&kept, p);
        let rank = rank.min(kept.len());
        Ok(self.finish(coefficients, converged, n_iter, false, rank, aliased))
    }

    /// The algorithm of R's `glm.fit`: start from the family's guess for the
    /// mean, solve each step by pivoted QR and halve steps that leave the
    /// domain. Stops when the relative change in deviance is small.
    fn r_glm_fit(&mut self) -> RegressionResult<IrlsOutcome> {
        let data = self.data;
        let p = data.n_pred();
        let max_iter = self.options.max_iter;
        let tol = self.options.tol;
        let qr_tol = self.options.qr_tol();

        let mut eta = self.family.link(self.mustart.view());
        let mut mu = self.family.inverse_link(eta.view());
        if !(self.family.valid_eta(eta.view()) && self.family.valid_mu(mu.view())) {
            return Err(RegressionError::Domain(
                "cannot find valid starting values: please specify some".to_string(),
            ));
        }
        let mut dev_old = self.deviance(mu.view());
        let mut system = self.working_system(eta.view(), self.weights.view())?;

        let mut coef = Array1::<f64>::zeros(p);
        let mut coef_old: Option<Array1<f64>> = None;
        let mut converged = false;
        let mut boundary = false;
        let mut n_iter = 0;
        let mut rank = p;
        let mut aliased = vec![false; p];
        for iter in 1..=max_iter {
            n_iter = iter;
            let good: Vec<bool> = izip!(self.weights.iter(), system.mu_eta.iter())
                .map(|(&w, &d)| w > 0. && d != 0.)
                .collect();
            if !good.iter().any(|&g| g) {
                self.diagnostics
                    .error(format!("no observations informative at iteration {}", iter));
                break;
            }
            let w_sqrt = select_elements(system.w.view(), &good).mapv(f64::sqrt);
            let zw = select_elements(system.z.view(), &good) * &w_sqrt;
            let xw = scale_rows(select_rows(data.x.view(), &good).view(), w_sqrt.view());
            let ls = dqrls(xw.view(), zw.view().insert_axis(Axis(1)), qr_tol, false)?;
            let mut start = ls.coefficients.column(0).to_owned();
            if start.iter().any(|c| !c.is_finite()) {
                self.diagnostics
                    .error(format!("non-finite coefficients at iteration {}", iter));
                break;
            }
            rank = ls.rank;
            aliased = vec![false; p];
            if ls.rank < p {
                match self.options.rank_deficiency {
                    RankDeficiencyMethod::Error => {
                        return Err(RegressionError::RankDeficient {
                            rank: ls.rank,
                            n_cols: p,
                        })
                    }
                    RankDeficiencyMethod::SelectColumns => {
                        for &j in &ls.pivot[ls.rank..] {
                            aliased[j] = true;
                        }
                    }
                    RankDeficiencyMethod::MinimumNorm => {
                        start = svd_solve(xw.view(), zw.view(), qr_tol)?.coefficients;
                    }
                }
            }

            eta = data.x.dot(&start);
            mu = self.family.inverse_link(eta.view());
            let mut dev = self.deviance(mu.view());
            boundary = false;
            if !dev.is_finite() {
                let old = coef_old
                    .as_ref()
                    .ok_or(RegressionError::NoValidCoefficients)?;
                self.diagnostics.error("step size truncated due to divergence");
                let mut halvings = 0;
                while !dev.is_finite() {
                    if halvings >= max_iter {
                        return Err(RegressionError::Domain(
                            "inner loop 1; cannot correct step size".to_string(),
                        ));
                    }
                    halvings += 1;
                    start = (&start + old) / 2.;
                    eta = data.x.dot(&start);
                    mu = self.family.inverse_link(eta.view());
                    dev = self.deviance(mu.view());
                }
                boundary = true;
            }
            if !(self.family.valid_eta(eta.view()) && self.family.valid_mu(mu.view())) {
                let old = coef_old
                    .as_ref()
                    .ok_or(RegressionError::NoValidCoefficients)?;
                self.diagnostics.error("step size truncated: out of bounds");
                let mut halvings = 0;
                while !(self.family.valid_eta(eta.view()) && self.family.valid_mu(mu.view())) {
                    if halvings >= max_iter {
                        return Err(RegressionError::Domain(
                            "inner loop 2; cannot correct step size".to_string(),
                        ));
                    }
                    halvings += 1;
                    start = (&start + old) / 2.;
                    eta = data.x.dot(&start);
                    mu = self.family.inverse_link(eta.view());
                }
                boundary = true;
                dev = self.deviance(mu.view());
            }
            coef = start;
            self.diagnostics
                .info(format!("iteration {}: deviance {}", iter, dev));

            if (dev - dev_old).abs() / (dev.abs() + 0.1) < tol {
                converged = true;
                break;
            }
            let next_system = self.working_system(eta.view(), self.weights.view())?;
            if next_system.matches(&system, tol) {
                converged = true;
                break;
            }
            system = next_system;
            dev_old = dev;
            coef_old = Some(coef.clone());
        }

        Ok(self.finish(coef, converged, n_iter, boundary, rank, aliased))
    }

    /// Linearise the model about the linear predictor. Observations with
    /// zero weight, or where the mean does not respond to eta, get zero
    /// working weight and a zero working response.
    fn working_system(
        &self,
        eta: ArrayView1<f64>,
        weights: ArrayView1<f64>,
    ) -> RegressionResult<WorkingSystem> {
        let mu = self.family.inverse_link(eta);
        let mu_eta = self.family.derivative_inverse_link(eta);
        let var = self.family.variance(mu.view());
        let n = eta.len();
        let mut z = Array1::zeros(n);
        let mut w = Array1::zeros(n);
        for i in 0..n {
            if weights[i] <= 0. {
                continue;
            }
            if var[i].is_nan() {
                return Err(RegressionError::Domain("NAs in V(mu)".to_string()));
            }
            if var[i] == 0. {
                return Err(RegressionError::Domain("0s in V(mu)".to_string()));
            }
            if mu_eta[i].is_nan() {
                return Err(RegressionError::Domain("NAs in d(mu)/d(eta)".to_string()));
            }
            if mu_eta[i] == 0. {
                continue;
            }
            z[i] = eta[i] + (self.y[i] - mu[i]) / mu_eta[i];
            w[i] = weights[i] * mu_eta[i] * mu_eta[i] / var[i];
        }
        Ok(WorkingSystem { z, w, mu_eta })
    }

    fn check_valid(&self, eta: ArrayView1<f64>) -> RegressionResult<()> {
        let mu = self.family.inverse_link(eta);
        if !(self.family.valid_eta(eta) && self.family.valid_mu(mu.view())) {
            return Err(RegressionError::Domain(
                "invalid linear predictor or fitted values".to_string(),
            ));
        }
        Ok(())
    }

    fn deviance(&self, mu: ArrayView1<f64>) -> f64 {
        self.family
            .deviance(self.y.view(), mu, self.weights.view())
    }

    /// There must be at least one observation with positive weight, and at
    /// least as many as the rank of X.
    fn check_observations(&self, rank: usize) -> RegressionResult<()> {
        let n_obs = self.weights.iter().filter(|&&w| w > 0.).count();
        if n_obs == 0 || n_obs < rank {
            return Err(RegressionError::Underconstrained { rank, n_obs });
        }
        Ok(())
    }

    /// The columns to fit given the numerical rank and the pivoting of a QR
    /// decomposition, according to the rank-deficiency policy.
    fn select_columns(&mut self, rank: usize, pivot: &[usize]) -> RegressionResult<Vec<usize>> {
        let p = pivot.len();
        if rank == p {
            return Ok((0..p).collect());
        }
        match self.options.rank_deficiency {
            RankDeficiencyMethod::Error => Err(RegressionError::RankDeficient { rank, n_cols: p }),
            RankDeficiencyMethod::SelectColumns => {
                self.diagnostics.error(format!(
                    "numerically rank-deficient model matrix: using {} of {} columns",
                    rank, p
                ));
                let mut kept = pivot[..rank].to_vec();
                kept.sort_unstable();
                Ok(kept)
            }
            RankDeficiencyMethod::MinimumNorm => {
                self.diagnostics.error(format!(
                    "numerically rank-deficient model matrix (rank {} of {}): using the minimum-norm solution",
                    rank, p
                ));
                Ok((0..p).collect())
            }
        }
    }

    /// The outcome when there is nothing to fit: every coefficient is zero.
    fn null_model(&mut self, p: usize) -> RegressionResult<IrlsOutcome> {
        let eta = Array1::<f64>::zeros(self.y.len());
        let mu = self.family.inverse_link(eta.view());
        if !(self.family.valid_eta(eta.view()) && self.family.valid_mu(mu.view())) {
            return Err(RegressionError::Domain(
                "invalid linear predictor values in empty model".to_string(),
            ));
        }
        self.diagnostics.info("no coefficients to fit");
        Ok(IrlsOutcome {
            coefficients: Array1::zeros(p),
            converged: true,
            n_iter: 0,
            boundary: false,
            deviance: self.deviance(mu.view()),
            rank: 0,
            aliased: vec![true; p],
        })
    }

    fn finish(
        &mut self,
        coefficients: Array1<f64>,
        converged: bool,
        n_iter: usize,
        boundary: bool,
        rank: usize,
        aliased: Vec<bool>,
    ) -> IrlsOutcome {
        let eta = self.data.x.dot(&coefficients);
        let mu = self.family.inverse_link(eta.view());
        let deviance = self.deviance(mu.view());
        if !converged {
            self.diagnostics.error("algorithm did not converge");
        }
        if boundary {
            self.diagnostics.error("algorithm stopped at boundary value");
        }
        let eps = 10. * f64::EPSILON;
        if self.family.is(LINK_FAMILY_NAME_BINOMIAL)
            && mu.iter().any(|&m| m > 1. - eps || m < eps)
        {
            self.diagnostics
                .error("fitted probabilities numerically 0 or 1 occurred");
        }
        if self.family.is(LINK_FAMILY_NAME_POISSON) && mu.iter().any(|&m| m < eps) {
            self.diagnostics.error("fitted rates numerically 0 occurred");
        }
        self.diagnostics.info(format!(
            "finished after {} iteration(s) with deviance {}",
            n_iter, deviance
        ));
        IrlsOutcome {
            coefficients,
            converged,
            n_iter,
            boundary,
            deviance,
            rank,
            aliased,
        }
    }
}

/// Rows whose working weight is large enough to inform the solve.
fn informative_rows(system: &WorkingSystem) -> Vec<bool> {
    system.w.iter().map(|&w| w > 2. * f64::EPSILON).collect()
}

fn aliased_columns(kept: &[usize], p: usize) -> Vec<bool> {
    let mut aliased = vec![true; p];
    for &j in kept {
        aliased[j] = false;
    }
    aliased
}

/// The thin singular value decomposition X = U D V', with U n × q, D of
/// length q and V' q × p, where q = min(n, p).
fn thin_svd(x: ArrayView2<f64>) -> RegressionResult<(Array2<f64>, Array1<f64>, Array2<f64>)> {
    let (n, p) = x.dim();
    let q = n.min(p);
    if q == 0 {
        return Ok((Array2::zeros((n, 0)), Array1::zeros(0), Array2::zeros((0, p))));
    }
    let (u, d, vt) = x.to_owned().svd(true, true)?;
    match (u, vt) {
        (Some(u), Some(vt)) => Ok((
            u.slice(s![.., ..q]).to_owned(),
            d,
            vt.slice(s![..q, ..]).to_owned(),
        )),
        _ => Err(RegressionError::Domain(
            "singular vectors were not computed".to_string(),
        )),
    }
}

/// Solves the positive definite system A x = b through A = C'C, by forward
/// then backward substitution.
fn cholesky_solve(a: Array2<f64>, b: Array1<f64>) -> RegressionResult<Array1<f64>> {
    let c = a.cholesky(UPLO::Upper)?;
    let c_t = c.t().to_owned();
    let half = c_t.solve_triangular(UPLO::Lower, Diag::NonUnit, &b)?;
    Ok(c.solve_triangular(UPLO::Upper, Diag::NonUnit, &half)?)
}
