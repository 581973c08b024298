//! Least-squares solvers: a Householder QR with limited column pivoting in the
//! manner of LINPACK's dqrdc2 (the decomposition R uses for `lm` and `glm`),
//! and a minimum-norm solve through the singular value decomposition.

use crate::error::{RegressionError, RegressionResult};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_linalg::SVD;

/// A QR decomposition stored in compact Householder form.
///
/// The upper triangle of `qr` holds R. Below the diagonal of column j, along
/// with `qraux[j]`, is the Householder vector for the j-th reflection. Columns
/// are permuted according to `pivot`: column j of the decomposition is column
/// `pivot[j]` of the input.
#[derive(Clone, Debug)]
pub struct QrDecomposition {
    qr: Array2<f64>,
    qraux: Array1<f64>,
    pivot: Vec<usize>,
    rank: usize,
}

/// Decompose x = QR, moving any column whose norm is reduced below `tol`
/// times its original norm to the end. The columns that are not moved form a
/// full-rank set, and their number is the numerical rank.
pub fn decompose(x: ArrayView2<f64>, tol: f64) -> QrDecomposition {
    let (n, p) = x.dim();
    let mut qr = x.to_owned();
    let mut pivot: Vec<usize> = (0..p).collect();
    // current and original norms of each column; zero norms are replaced by
    // one in the latter
    let mut qraux: Array1<f64> = qr.axis_iter(Axis(1)).map(|c| c.dot(&c).sqrt()).collect();
    let mut work_orig: Array1<f64> = qraux.mapv(|nrm| if nrm == 0. { 1. } else { nrm });

    let mut k = p;
    for l in 0..n.min(p) {
        // Cycle negligible columns to the end.
        while l < k && qraux[l] < work_orig[l] * tol {
            rotate_to_end(&mut qr, l);
            pivot[l..].rotate_left(1);
            rotate_vec_to_end(&mut qraux, l);
            rotate_vec_to_end(&mut work_orig, l);
            k -= 1;
        }
        if l + 1 == n {
            break;
        }

        // Householder transformation for column l
        let col = qr.slice(s![l.., l]);
        let mut nrmxl = col.dot(&col).sqrt();
        if nrmxl == 0. {
            continue;
        }
        if qr[[l, l]] != 0. {
            nrmxl = nrmxl.abs().copysign(qr[[l, l]]);
        }
        qr.slice_mut(s![l.., l]).mapv_inplace(|v| v / nrmxl);
        qr[[l, l]] += 1.;

        // Apply it to the remaining columns, updating their norms.
        for j in (l + 1)..p {
            let t = -qr.slice(s![l.., l]).dot(&qr.slice(s![l.., j])) / qr[[l, l]];
            let v = qr.slice(s![l.., l]).to_owned();
            qr.slice_mut(s![l.., j]).scaled_add(t, &v);
            if qraux[j] != 0. {
                let ratio = qr[[l, j]].abs() / qraux[j];
                let tt = (1. - ratio * ratio).max(0.);
                if tt.abs() < 1e-6 {
                    // recompute the norm rather than downdating it
                    let rest = qr.slice(s![(l + 1).., j]);
                    qraux[j] = rest.dot(&rest).sqrt();
                } else {
                    qraux[j] *= tt.sqrt();
                }
            }
        }
        qraux[l] = qr[[l, l]];
        qr[[l, l]] = -nrmxl;
    }

    QrDecomposition {
        qr,
        qraux,
        pivot,
        rank: k.min(n),
    }
}

/// Move column l of the matrix to the end, shifting the following columns left.
fn rotate_to_end(x: &mut Array2<f64>, l: usize) {
    for mut row in x.outer_iter_mut() {
        let moved = row[l];
        for j in (l + 1)..row.len() {
            row[j - 1] = row[j];
        }
        let last = row.len() - 1;
        row[last] = moved;
    }
}

fn rotate_vec_to_end(v: &mut Array1<f64>, l: usize) {
    let moved = v[l];
    for j in (l + 1)..v.len() {
        v[j - 1] = v[j];
    }
    let last = v.len() - 1;
    v[last] = moved;
}

impl QrDecomposition {
    /// The numerical rank: the number of leading (pivoted) columns that are
    /// linearly independent to within the tolerance.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// The column permutation. Entry j is the input column that was placed at
    /// position j.
    pub fn pivot(&self) -> &[usize] {
        &self.pivot
    }

    /// Whether any column was moved.
    pub fn pivoted(&self) -> bool {
        self.pivot.iter().enumerate().any(|(i, &p)| i != p)
    }

    /// The number of Householder reflections that make up Q.
    fn n_reflections(&self) -> usize {
        self.rank.min(self.qr.nrows().saturating_sub(1))
    }

    /// The Householder vector of the j-th reflection, starting at row j.
    fn reflector(&self, j: usize) -> Array1<f64> {
        let mut v = self.qr.slice(s![j.., j]).to_owned();
        v[0] = self.qraux[j];
        v
    }

    fn reflect(&self, j: usize, y: &mut Array1<f64>) {
        if self.qraux[j] == 0. {
            return;
        }
        let v = self.reflector(j);
        let mut tail = y.slice_mut(s![j..]);
        let t = -v.dot(&tail) / v[0];
        tail.scaled_add(t, &v);
    }

    /// Computes Q^T y.
    pub fn qty(&self, y: ArrayView1<f64>) -> Array1<f64> {
        let mut qty = y.to_owned();
        for j in 0..self.n_reflections() {
            self.reflect(j, &mut qty);
        }
        qty
    }

    /// Computes Q y.
    pub fn qy(&self, y: ArrayView1<f64>) -> Array1<f64> {
        let mut qy = y.to_owned();
        for j in (0..self.n_reflections()).rev() {
            self.reflect(j, &mut qy);
        }
        qy
    }

    /// Solves R b = (Q^T y) over the first `rank` pivoted columns by back
    /// substitution, returning the coefficients in the pivoted order.
    pub fn solve(&self, qty: ArrayView1<f64>) -> Array1<f64> {
        let k = self.rank;
        let mut b = qty.slice(s![..k]).to_owned();
        for i in (0..k).rev() {
            let known = self.qr.slice(s![i, (i + 1)..k]).dot(&b.slice(s![(i + 1)..k]));
            b[i] = (b[i] - known) / self.qr[[i, i]];
        }
        b
    }

    /// The coefficients in the original column order, with zeros in place of
    /// the columns beyond the rank.
    pub fn coefficients(&self, qty: ArrayView1<f64>) -> Array1<f64> {
        let b = self.solve(qty);
        let mut coef = Array1::zeros(self.pivot.len());
        for (j, &bj) in b.iter().enumerate() {
            coef[self.pivot[j]] = bj;
        }
        coef
    }
}

/// The result of a least-squares solve by pivoted QR.
#[derive(Clone, Debug)]
pub struct QrLeastSquares {
    /// p × ny coefficients in the original column order. Columns beyond the
    /// rank have zero coefficients.
    pub coefficients: Array2<f64>,
    /// n × ny residuals y - X b
    pub residuals: Array2<f64>,
    /// n × ny effects Q^T y
    pub effects: Array2<f64>,
    pub rank: usize,
    pub pivot: Vec<usize>,
    pub pivoted: bool,
    pub qr: QrDecomposition,
}

/// Least squares X b ≈ y for each of the columns of y, in the manner of the
/// LINPACK-based `dqrls` routine used by R.
///
/// With `check` set, inconsistent or non-finite input is reported as an
/// error. Without it, mismatched dimensions are a programming error.
pub fn dqrls(
    x: ArrayView2<f64>,
    y: ArrayView2<f64>,
    tol: f64,
    check: bool,
) -> RegressionResult<QrLeastSquares> {
    let (n, p) = x.dim();
    let ny = y.ncols();
    if check {
        if y.nrows() != n {
            return Err(RegressionError::BadInput(format!(
                "dimensions of x ({}, {}) and y ({}) do not match",
                n,
                p,
                y.nrows()
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(RegressionError::BadInput(
                "NA/NaN/Inf in least-squares input".to_string(),
            ));
        }
    } else {
        assert_eq!(y.nrows(), n, "x and y must have the same number of rows");
    }

    let qr = decompose(x, tol);
    let mut coefficients = Array2::zeros((p, ny));
    let mut residuals = Array2::zeros((n, ny));
    let mut effects = Array2::zeros((n, ny));
    for (iy, y_col) in y.axis_iter(Axis(1)).enumerate() {
        let qty = qr.qty(y_col);
        coefficients
            .column_mut(iy)
            .assign(&qr.coefficients(qty.view()));
        let mut rsd = qty.clone();
        rsd.slice_mut(s![..qr.rank()]).fill(0.);
        residuals.column_mut(iy).assign(&qr.qy(rsd.view()));
        effects.column_mut(iy).assign(&qty);
    }
    Ok(QrLeastSquares {
        coefficients,
        residuals,
        effects,
        rank: qr.rank(),
        pivot: qr.pivot().to_vec(),
        pivoted: qr.pivoted(),
        qr,
    })
}

/// A minimum-norm least-squares solution.
#[derive(Clone, Debug)]
pub struct SvdSolution {
    pub coefficients: Array1<f64>,
    pub rank: usize,
    pub singular_values: Array1<f64>,
}

/// Solves X b ≈ y for the b of least Euclidean norm. Singular values below
/// `tol` times the largest are treated as zero.
pub fn svd_solve(x: ArrayView2<f64>, y: ArrayView1<f64>, tol: f64) -> RegressionResult<SvdSolution> {
    let (n, p) = x.dim();
    if y.len() != n {
        return Err(RegressionError::BadInput(format!(
            "x has {} rows but y has {} entries",
            n,
            y.len()
        )));
    }
    if n == 0 || p == 0 {
        return Ok(SvdSolution {
            coefficients: Array1::zeros(p),
            rank: 0,
            singular_values: Array1::zeros(0),
        });
    }
    let (u, sigma, vt) = x.to_owned().svd(true, true)?;
    let (u, vt) = match (u, vt) {
        (Some(u), Some(vt)) => (u, vt),
        _ => {
            return Err(RegressionError::Domain(
                "singular vectors were not computed".to_string(),
            ))
        }
    };
    let s_max = sigma.iter().cloned().fold(0., f64::max);
    let cutoff = tol * s_max;
    let m = sigma.len();
    let uty = u.slice(s![.., ..m]).t().dot(&y);
    let mut rank = 0;
    let scaled: Array1<f64> = uty
        .iter()
        .zip(sigma.iter())
        .map(|(&c, &s)| {
            if s > cutoff && s > 0. {
                rank += 1;
                c / s
            } else {
                0.
            }
        })
        .collect();
    let coefficients = vt.slice(s![..m, ..]).t().dot(&scaled);
    Ok(SvdSolution {
        coefficients,
        rank,
        singular_values: sigma,
    })
}
