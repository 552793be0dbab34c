use ndarray::{Array1, Array2};

/// Relative pivot size below which a matrix is treated as singular.
const PIVOT_EPS: f64 = 1e-10;

/// Lower-triangular Cholesky factor of a symmetric positive definite matrix.
///
/// Returns `None` when the matrix is not square or a pivot falls below
/// `PIVOT_EPS` times its own diagonal entry. The ratio is the pivot of the
/// unit-diagonal matrix `D^-1/2 A D^-1/2`, so rescaling a row and column of
/// `A` never changes the outcome.
pub fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    if n != a.ncols() {
        return None;
    }
    if a.diag().iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[(i, k)] * l[(j, k)];
            }
            if i == j {
                let diag = a[(j, j)] - sum;
                if !(diag > PIVOT_EPS * a[(j, j)]) {
                    return None;
                }
                l[(j, j)] = diag.sqrt();
            } else {
                l[(i, j)] = (a[(i, j)] - sum) / l[(j, j)];
            }
        }
    }
    Some(l)
}

fn solve_factored(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[(i, j)] * y[j];
        }
        y[i] = (b[i] - sum) / l[(i, i)];
    }

    // L^T x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[(j, i)] * x[j];
        }
        x[i] = (y[i] - sum) / l[(i, i)];
    }
    x
}

/// Solve `A x = b` for symmetric positive definite `A`.
pub fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    if a.nrows() != b.len() {
        return None;
    }
    let l = cholesky(a)?;
    Some(solve_factored(&l, b))
}

/// Inverse of a symmetric positive definite matrix, column by column.
pub fn spd_inverse(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let l = cholesky(a)?;
    let mut inv = Array2::<f64>::zeros((n, n));
    for col in 0..n {
        let mut e = Array1::<f64>::zeros(n);
        e[col] = 1.0;
        let x = solve_factored(&l, &e);
        inv.column_mut(col).assign(&x);
    }
    Some(inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cholesky_solve_2x2() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let x = cholesky_solve(&a, &b).unwrap();
        let residual = a.dot(&x) - &b;
        assert!(residual.iter().all(|r| r.abs() < 1e-12));
    }

    #[test]
    fn test_cholesky_rejects_singular() {
        // Second column duplicates the first
        let a = array![[1.0, 1.0, 0.5], [1.0, 1.0, 0.5], [0.5, 0.5, 2.0]];
        assert!(cholesky(&a).is_none());
        assert!(cholesky_solve(&a, &array![1.0, 1.0, 1.0]).is_none());
    }

    #[test]
    fn test_cholesky_ignores_column_units() {
        // Intercept next to a column measured in currency units
        let a = array![[4.0, 8.0e5], [8.0e5, 1.7e11]];
        let b = array![1.0, 2.0e5];
        let x = cholesky_solve(&a, &b).unwrap();
        let residual = a.dot(&x) - &b;
        assert!(residual[0].abs() < 1e-9);
        assert!(residual[1].abs() < 1e-4);
        assert!(spd_inverse(&a).is_some());

        let duplicated = array![[1.7e11, 1.7e11], [1.7e11, 1.7e11]];
        assert!(cholesky(&duplicated).is_none());
    }

    #[test]
    fn test_spd_inverse_identity_product() {
        let a = array![[5.0, 1.0, 0.0], [1.0, 4.0, 1.0], [0.0, 1.0, 3.0]];
        let inv = spd_inverse(&a).unwrap();
        let eye = a.dot(&inv);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((eye[(i, j)] - expected).abs() < 1e-12);
            }
        }
    }
}
