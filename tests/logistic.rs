//! test cases for logistic regression

use anyhow::Result;
use approx::assert_abs_diff_eq;
use irls_glm::{FitOptions, LogisticRegression, SolveMethod};
use ndarray::{array, Array1, Array2};
mod common;
use common::y_x_from_csv;

const ALL_METHODS: [SolveMethod; 3] = [
    SolveMethod::IrlsRGlmFit,
    SolveMethod::IrlsKaneLewis,
    SolveMethod::IrlsSvdNewton,
];

#[test]
// The hours-studied example from the Wikipedia article on logistic regression.
// The coefficients agree with R's glm().
fn wikipedia_hours_studied() -> Result<()> {
    let (y, x) = y_x_from_csv::<u8, f64>("tests/data/wikipedia_logistic.csv")?;
    for &method in &ALL_METHODS {
        let mut model =
            LogisticRegression::with_options(FitOptions::default().solve_method(method))?;
        let fit = model.fit_adding_intercept(x.view(), y.view());
        dbg!(method, fit.n_iter());
        assert!(fit.fitted());
        assert!(fit.converged());
        assert!(fit.calculation_errors().is_empty());
        assert_abs_diff_eq!(*fit.coefficients()?, array![-4.0777, 1.5046], epsilon = 1e-4);
        assert_abs_diff_eq!(fit.deviance(), 16.0598, epsilon = 1e-4);
        assert_eq!(fit.rank(), 2);
        // the hours at which passing becomes more likely than not
        let hours = fit.retrodict_univariate_predictor(array![0.5].view())?;
        assert_abs_diff_eq!(hours[0], 4.0777 / 1.5046, epsilon = 1e-3);
    }
    Ok(())
}

#[test]
fn integer_and_bool_responses_agree() -> Result<()> {
    let (y, x) = y_x_from_csv::<u8, f64>("tests/data/wikipedia_logistic.csv")?;
    let y_bool: Array1<bool> = y.mapv(|v| v == 1);
    let mut by_int = LogisticRegression::new();
    by_int.fit_adding_intercept(x.view(), y.view());
    let mut by_bool = LogisticRegression::new();
    by_bool.fit_adding_intercept(x.view(), y_bool.view());
    assert_eq!(by_int.glm().coefficients()?, by_bool.glm().coefficients()?);
    Ok(())
}

#[test]
// Grouping identical predictors into proportions weighted by the number of
// trials gives the same fit.
fn grouped_proportions() -> Result<()> {
    let (y, x) = y_x_from_csv::<f64, f64>("tests/data/wikipedia_logistic.csv")?;
    let mut ungrouped = LogisticRegression::new();
    ungrouped.fit_adding_intercept(x.view(), y.view());

    // the only repeated value of x is 1.75, with one failure and one success
    let mut x_grp: Vec<f64> = Vec::new();
    let mut y_grp: Vec<f64> = Vec::new();
    let mut n_grp: Vec<f64> = Vec::new();
    for (&xi, &yi) in x.column(0).iter().zip(y.iter()) {
        match x_grp.iter().position(|&xg| xg == xi) {
            Some(i) => {
                y_grp[i] = (y_grp[i] * n_grp[i] + yi) / (n_grp[i] + 1.);
                n_grp[i] += 1.;
            }
            None => {
                x_grp.push(xi);
                y_grp.push(yi);
                n_grp.push(1.);
            }
        }
    }
    assert_eq!(x_grp.len(), 19);
    let x_grp = Array2::from_shape_fn((x_grp.len(), 2), |(i, j)| if j == 0 { 1. } else { x_grp[i] });
    let mut grouped = LogisticRegression::new();
    let fit = grouped.fit_weighted(
        x_grp.view(),
        Array1::from(y_grp).view(),
        Array1::from(n_grp).view(),
    );
    assert!(fit.converged());
    assert!(fit.calculation_errors().is_empty());
    assert_abs_diff_eq!(
        *fit.coefficients()?,
        *ungrouped.glm().coefficients()?,
        epsilon = 1e-7
    );
    Ok(())
}

#[test]
// Perfectly separated data have no finite maximum-likelihood estimate, but
// the deviance still settles within the default iteration limit and the
// classifier should reproduce the labels.
fn separable_data() -> Result<()> {
    let x = array![[1.], [2.], [3.], [4.], [5.], [6.]];
    let y = array![false, false, false, true, true, true];
    let mut model = LogisticRegression::new();
    let fit = model.fit_adding_intercept(x.view(), y.view());
    assert!(fit.fitted());
    assert!(fit.converged());
    assert!(fit.n_iter() <= 25);
    assert!(fit.deviance() < 1e-8);
    assert!(fit
        .calculation_errors()
        .iter()
        .any(|e| e.contains("fitted probabilities numerically 0 or 1 occurred")));
    assert_eq!(model.predict_binary(None, 0.5)?, y);
    let new_x = array![[1., 0.], [1., 10.]];
    assert_eq!(
        model.predict_binary(Some(new_x.view()), 0.5)?,
        array![false, true]
    );
    Ok(())
}

#[test]
fn no_convergence_within_one_iteration() -> Result<()> {
    let (y, x) = y_x_from_csv::<u8, f64>("tests/data/wikipedia_logistic.csv")?;
    let mut model = LogisticRegression::with_options(FitOptions::default().max_iter(1))?;
    let fit = model.fit_adding_intercept(x.view(), y.view());
    assert!(fit.fitted());
    assert!(!fit.converged());
    assert_eq!(fit.n_iter(), 1);
    assert!(fit
        .calculation_errors()
        .iter()
        .any(|e| e == "algorithm did not converge"));
    // the last iterate is still available
    assert_eq!(fit.coefficients()?.len(), 2);
    Ok(())
}

#[test]
fn classification_threshold() -> Result<()> {
    let (y, x) = y_x_from_csv::<u8, f64>("tests/data/wikipedia_logistic.csv")?;
    let mut model = LogisticRegression::new();
    model.fit_adding_intercept(x.view(), y.view());
    let prob = model.predict_prob(None)?;
    let logit = model.predict_logit(None)?;
    assert_abs_diff_eq!(logit.mapv(|l| 1. / (1. + (-l).exp())), prob, epsilon = 1e-12);
    // every fitted probability is inside (0, 1), so the extreme thresholds
    // classify everything one way
    assert!(model.predict_binary(None, 0.)?.iter().all(|&c| c));
    assert!(model.predict_binary(None, 1.)?.iter().all(|&c| !c));
    let classes = model.predict_binary(None, 0.5)?;
    for (&c, &p) in classes.iter().zip(prob.iter()) {
        assert_eq!(c, p >= 0.5);
    }
    Ok(())
}

#[test]
// One step towards a separating boundary is not enough to converge, but the
// coefficients so far are still usable.
fn separable_data_single_iteration() -> Result<()> {
    let x = array![[1.], [2.], [3.], [4.], [5.], [6.]];
    let y = array![0, 0, 0, 1, 1, 1];
    let mut model = LogisticRegression::with_options(FitOptions::default().max_iter(1))?;
    let fit = model.fit_adding_intercept(x.view(), y.view());
    assert!(fit.fitted());
    assert!(!fit.converged());
    assert_eq!(fit.n_iter(), 1);
    assert!(fit.coefficients()?.iter().all(|c| c.is_finite()));
    assert!(fit.coefficients()?[1] > 0.);
    assert!(fit
        .calculation_errors()
        .iter()
        .any(|e| e == "algorithm did not converge"));
    Ok(())
}
