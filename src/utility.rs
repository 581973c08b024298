//! utility functions for internal library use

use ndarray::{concatenate, Array1, Array2, ArrayView1, ArrayView2, Axis};
use num_traits::identities::One;

/// Prepend the input with a column of ones.
/// Used to incorporate a constant intercept term in a regression.
pub fn one_pad<T>(data: ArrayView2<T>) -> Array2<T>
where
    T: Copy + One,
{
    // create the ones column
    let ones: Array2<T> = Array2::ones((data.nrows(), 1));
    // This should be guaranteed to succeed since we are manually specifying the dimension
    concatenate![Axis(1), ones, data]
}

/// The indices at which the mask is set.
pub fn mask_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &m)| if m { Some(i) } else { None })
        .collect()
}

/// The rows of a matrix selected by a mask.
pub fn select_rows(x: ArrayView2<f64>, mask: &[bool]) -> Array2<f64> {
    x.select(Axis(0), &mask_indices(mask))
}

/// The elements of a vector selected by a mask.
pub fn select_elements(v: ArrayView1<f64>, mask: &[bool]) -> Array1<f64> {
    v.select(Axis(0), &mask_indices(mask))
}

/// Multiply each row i of the matrix by `factors[i]`.
pub fn scale_rows(x: ArrayView2<f64>, factors: ArrayView1<f64>) -> Array2<f64> {
    let mut scaled = x.to_owned();
    for (mut row, &f) in scaled.outer_iter_mut().zip(factors.iter()) {
        row *= f;
    }
    scaled
}

/// Scatter the coefficients of a reduced model back into a vector of length
/// `n`, leaving zeros at the columns that were not used.
pub fn expand_coefficients(reduced: ArrayView1<f64>, kept: &[usize], n: usize) -> Array1<f64> {
    let mut full = Array1::zeros(n);
    for (&i, &b) in kept.iter().zip(reduced.iter()) {
        full[i] = b;
    }
    full
}

/// Whether two arrays agree elementwise to within a relative tolerance. Any
/// non-finite entry counts as a change.
pub fn unchanged(a: ArrayView1<f64>, b: ArrayView1<f64>, tol: f64) -> bool {
    a.len() == b.len()
        && a.iter().zip(b.iter()).all(|(&a, &b)| {
            a.is_finite() && b.is_finite() && (a - b).abs() <= tol * a.abs().max(b.abs()).max(1.)
        })
}
