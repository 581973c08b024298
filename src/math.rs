//! Mathematical helper functions
use ndarray::ArrayView1;
use num_traits::Float;

/// Beyond this magnitude of the linear predictor the logistic function is
/// evaluated at a saturated value, as R does.
const THRESH: f64 = 30.;
const MTHRESH: f64 = -30.;

/// y * log(y / mu), which is zero when y == 0 regardless of mu.
pub fn y_log_y<F>(y: F, mu: F) -> F
where
    F: Float,
{
    if y == F::zero() {
        return F::zero();
    }
    y * (y / mu).ln()
}

/// The logistic function 1 / (1 + exp(-x)), mapping the logit to a
/// probability. The result stays strictly inside (0, 1).
pub fn logistic(x: f64) -> f64 {
    let tmp = if x < MTHRESH {
        f64::EPSILON
    } else if x > THRESH {
        1. / f64::EPSILON
    } else {
        x.exp()
    };
    tmp / (1. + tmp)
}

/// The derivative of the logistic function, exp(x) / (1 + exp(x))^2, floored
/// at machine epsilon once the function has saturated.
pub fn d_logistic(x: f64) -> f64 {
    if x > THRESH || x < MTHRESH {
        return f64::EPSILON;
    }
    let exp_x = x.exp();
    let opexp = 1. + exp_x;
    exp_x / (opexp * opexp)
}

/// The log-odds log(p / (1 - p)), the inverse of `logistic`.
pub fn logit(p: f64) -> f64 {
    (p / (1. - p)).ln()
}

/// Whether every element is within `threshold` of an integer.
pub fn all_integer(x: ArrayView1<f64>, threshold: f64) -> bool {
    x.iter().all(|&v| (v - v.round()).abs() <= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn logistic_logit_closure() {
        for &p in &[1e-6, 0.1, 0.25, 0.5, 0.8, 0.999] {
            assert_abs_diff_eq!(logistic(logit(p)), p, epsilon = 8. * f64::EPSILON);
        }
    }

    #[test]
    fn logistic_saturates_inside_unit_interval() {
        let hi = logistic(1000.);
        let lo = logistic(-1000.);
        assert!(hi < 1. && hi > 0.5);
        assert!(lo > 0. && lo < 0.5);
        assert_eq!(d_logistic(40.), f64::EPSILON);
        assert_abs_diff_eq!(d_logistic(0.), 0.25);
    }

    #[test]
    fn zero_logs() {
        assert_eq!(y_log_y(0., 0.3), 0.);
        assert_abs_diff_eq!(y_log_y(2., 1.), 2. * f64::ln(2.));
    }

    #[test]
    fn integer_check() {
        assert!(all_integer(array![1., 2., 0.].view(), 1e-3));
        assert!(!all_integer(array![1., 2.5].view(), 1e-3));
    }
}
