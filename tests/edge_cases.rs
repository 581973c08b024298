//! Handles edge cases that have caused trouble at times.
use anyhow::Result;
use approx::assert_abs_diff_eq;
use irls_glm::{
    FitOptions, Glm, LogisticRegression, RegressionError, SolveMethod, BINOMIAL, GAUSSIAN,
};
use ndarray::{array, Array1, Array2};

#[test]
fn dimension_mismatch() {
    let x = array![[1., 2.], [1., 3.], [1., 4.]];
    let y = array![1., 2.];
    let mut glm = Glm::with_family(GAUSSIAN);
    let fit = glm.fit(x.view(), y.view(), None);
    assert!(!fit.fitted());
    assert!(!fit.converged());
    assert_eq!(fit.n_iter(), 0);
    assert!(!fit.calculation_errors().is_empty());
    assert!(matches!(fit.predict(None), Err(RegressionError::NotFitted)));

    let y = array![1., 2., 3.];
    let wts = array![1., 1.];
    let fit = glm.fit(x.view(), y.view(), Some(wts.view()));
    assert!(!fit.fitted());
    let wts = array![1., -1., 1.];
    let fit = glm.fit(x.view(), y.view(), Some(wts.view()));
    assert!(!fit.fitted());
}

#[test]
fn non_finite_data() {
    let x = array![[1., 2.], [1., f64::INFINITY], [1., 4.]];
    let y = array![1., 2., 3.];
    let mut glm = Glm::with_family(GAUSSIAN);
    assert!(!glm.fit(x.view(), y.view(), None).fitted());
}

/// A model with no predictors at all is trivially fitted.
#[test]
fn empty_model() -> Result<()> {
    let y = array![true, false, false, true];
    let x: Array2<f64> = Array2::zeros((4, 0));
    for &method in &[
        SolveMethod::IrlsRGlmFit,
        SolveMethod::IrlsKaneLewis,
        SolveMethod::IrlsSvdNewton,
    ] {
        let mut model =
            LogisticRegression::with_options(FitOptions::default().solve_method(method))?;
        let fit = model.fit_directly(x.view(), y.view());
        assert!(fit.fitted());
        assert!(fit.converged());
        assert_eq!(fit.n_iter(), 0);
        assert_eq!(fit.coefficients()?.len(), 0);
        assert_abs_diff_eq!(fit.deviance(), 8. * f64::ln(2.), epsilon = 1e-12);
        assert_abs_diff_eq!(model.predict_prob(None)?, Array1::from_elem(4, 0.5));
    }
    Ok(())
}

/// The initial guess of zero is already the best one when exactly half of the
/// data are true.
#[test]
fn start_at_optimum() -> Result<()> {
    let y = array![true, false, false, true];
    let x = Array2::<f64>::ones((4, 1));
    let mut model = LogisticRegression::new();
    let fit = model.fit_directly(x.view(), y.view());
    assert!(fit.converged());
    assert_abs_diff_eq!(fit.coefficients()?[0], 0., epsilon = 1e-12);
    Ok(())
}

#[test]
fn invalid_binomial_response() {
    let x = array![[1., 0.], [1., 1.], [1., 2.]];
    let y = array![0., 2., 1.];
    let mut glm = Glm::with_family(BINOMIAL);
    let fit = glm.fit(x.view(), y.view(), None);
    assert!(!fit.fitted());
    assert!(fit
        .calculation_errors()
        .iter()
        .any(|e| e.contains("y values must be 0 <= y <= 1")));
}

#[test]
fn queries_check_shapes() -> Result<()> {
    let x = array![[1., 0.], [1., 1.], [1., 2.]];
    let y = array![1., 2., 2.5];
    let mut glm = Glm::with_family(GAUSSIAN);
    glm.fit(x.view(), y.view(), None);
    assert!(glm.fitted());
    let wrong_cols = array![[1.], [2.], [3.]];
    assert!(matches!(
        glm.predict_eta(Some(wrong_cols.view())),
        Err(RegressionError::BadInput(_))
    ));
    let wrong_rows = array![[1., 0.], [1., 1.]];
    assert!(glm.predict(Some(wrong_rows.view())).is_ok());
    assert!(matches!(
        glm.residuals(Some(wrong_rows.view())),
        Err(RegressionError::BadInput(_))
    ));
    assert!(glm.time_to_fit().is_some());
    let fit = glm.last_fit().expect("model was fitted");
    assert!(fit.finished_at() >= fit.started_at());
    assert_eq!(fit.n_observations(), 3);
    assert_eq!(fit.n_predictors(), 2);
    assert_eq!(fit.response(), &y);
    assert_eq!(fit.weights(), &array![1., 1., 1.]);
    assert_eq!(fit.predictors(), &x);
    Ok(())
}

#[test]
// Verbose fits record progress in the info log.
fn verbose_info() -> Result<()> {
    let x = array![[0.], [1.], [2.], [3.]];
    let y = array![0., 1., 0., 1.];
    let mut glm = Glm::new(BINOMIAL, FitOptions::default().verbose(true))?;
    let fit = glm.fit_adding_intercept(x.view(), y.view(), None);
    assert!(fit.converged());
    assert!(fit.info().len() > fit.n_iter());
    assert!(fit.info()[0].contains("binomial"));
    Ok(())
}

#[test]
// Observations with zero weight do not count towards identifying the model.
fn too_few_weighted_observations() {
    let x = array![[1., 0.], [1., 1.], [1., 2.], [1., 3.]];
    let y = array![0.5, 1.5, 2.5, 3.5];
    let cases = [
        (array![1., 0., 0., 0.], "X matrix has rank 2, but only 1 observation(s)"),
        (array![0., 0., 0., 0.], "X matrix has rank 2, but only 0 observation(s)"),
    ];
    for &method in &[
        SolveMethod::IrlsRGlmFit,
        SolveMethod::IrlsKaneLewis,
        SolveMethod::IrlsSvdNewton,
    ] {
        let mut glm = Glm::new(GAUSSIAN, FitOptions::default().solve_method(method))
            .expect("default options are valid");
        for (wts, msg) in &cases {
            let fit = glm.fit(x.view(), y.view(), Some(wts.view()));
            assert!(!fit.fitted());
            assert!(!fit.converged());
            assert!(fit.calculation_errors().iter().any(|e| e == msg));
        }
    }
}
