//! Dense linear algebra for small symmetric matrices
//!
//! Covariance matrices in this workspace are a few dozen assets at most, so
//! these routines favour clarity over blocking or BLAS. Cholesky is used both
//! as the positive-definiteness test and as the solver for minimum-variance
//! weights; Jacobi rotations provide eigenvalues for conditioning checks.

use crate::covariance::CovarianceError;
use ndarray::{Array1, Array2};

/// Maximum number of cyclic Jacobi sweeps
const MAX_JACOBI_SWEEPS: usize = 100;

/// Relative off-diagonal norm at which Jacobi iteration stops
const JACOBI_TOLERANCE: f64 = 1e-14;

fn check_square(matrix: &Array2<f64>) -> Result<usize, CovarianceError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(CovarianceError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }
    Ok(n)
}

/// Return (A + A^T) / 2
pub fn symmetrize(matrix: &Array2<f64>) -> Array2<f64> {
    (matrix + &matrix.t()) * 0.5
}

/// Check that a matrix is square and symmetric within `tolerance`
pub fn is_symmetric(matrix: &Array2<f64>, tolerance: f64) -> bool {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return false;
    }
    (0..n).all(|i| ((i + 1)..n).all(|j| (matrix[[i, j]] - matrix[[j, i]]).abs() <= tolerance))
}

/// Cholesky factorisation A = L L^T
///
/// # Arguments
/// * `matrix` - Symmetric matrix; only the lower triangle is read
///
/// # Returns
/// * Lower-triangular factor `L`
///
/// # Errors
/// * `NotPositiveDefinite` if a pivot is not strictly positive (or not finite)
pub fn cholesky(matrix: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
    let n = check_square(matrix)?;
    let mut l = Array2::<f64>::zeros((n, n));

    for j in 0..n {
        let mut pivot = matrix[[j, j]];
        for k in 0..j {
            pivot -= l[[j, k]] * l[[j, k]];
        }
        if !pivot.is_finite() || pivot <= 0.0 {
            return Err(CovarianceError::NotPositiveDefinite);
        }
        let diag = pivot.sqrt();
        l[[j, j]] = diag;

        for i in (j + 1)..n {
            let mut sum = matrix[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / diag;
        }
    }

    Ok(l)
}

/// Solve L L^T x = b given the lower Cholesky factor `L`
pub fn solve_with_cholesky(
    factor: &Array2<f64>,
    rhs: &Array1<f64>,
) -> Result<Array1<f64>, CovarianceError> {
    let n = check_square(factor)?;
    if rhs.len() != n {
        return Err(CovarianceError::DimensionMismatch {
            expected: n,
            actual: rhs.len(),
        });
    }

    // Forward substitution: L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = rhs[i];
        for k in 0..i {
            sum -= factor[[i, k]] * y[k];
        }
        y[i] = sum / factor[[i, i]];
    }

    // Back substitution: L^T x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= factor[[k, i]] * x[k];
        }
        x[i] = sum / factor[[i, i]];
    }

    Ok(x)
}

/// Solve A x = b for symmetric positive definite A
pub fn cholesky_solve(
    matrix: &Array2<f64>,
    rhs: &Array1<f64>,
) -> Result<Array1<f64>, CovarianceError> {
    let factor = cholesky(matrix)?;
    solve_with_cholesky(&factor, rhs)
}

/// Check if a matrix is symmetric positive definite
///
/// Uses a Cholesky attempt rather than an eigen decomposition.
pub fn is_positive_definite(matrix: &Array2<f64>) -> bool {
    is_symmetric(matrix, 1e-10 * max_abs(matrix).max(1.0)) && cholesky(matrix).is_ok()
}

fn max_abs(matrix: &Array2<f64>) -> f64 {
    matrix.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

/// Eigenvalues of a symmetric matrix via cyclic Jacobi rotations
///
/// # Returns
/// * Eigenvalues sorted in descending order
pub fn symmetric_eigenvalues(matrix: &Array2<f64>) -> Result<Array1<f64>, CovarianceError> {
    let n = check_square(matrix)?;
    let mut a = symmetrize(matrix);
    let scale = a.iter().map(|v| v * v).sum::<f64>().sqrt();

    for _sweep in 0..MAX_JACOBI_SWEEPS {
        if off_diagonal_norm(&a) <= JACOBI_TOLERANCE * scale {
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                if a[[p, q]] != 0.0 {
                    rotate(&mut a, p, q);
                }
            }
        }
    }

    let mut eigenvalues: Vec<f64> = (0..n).map(|i| a[[i, i]]).collect();
    eigenvalues.sort_by(|x, y| y.total_cmp(x));
    Ok(Array1::from(eigenvalues))
}

fn off_diagonal_norm(a: &Array2<f64>) -> f64 {
    let n = a.nrows();
    let mut sum = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                sum += a[[i, j]] * a[[i, j]];
            }
        }
    }
    sum.sqrt()
}

/// Zero a[p, q] with a single Jacobi rotation applied on both sides
fn rotate(a: &mut Array2<f64>, p: usize, q: usize) {
    let n = a.nrows();
    let apq = a[[p, q]];
    let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
    let c = 1.0 / (t * t + 1.0).sqrt();
    let s = t * c;

    a[[p, p]] -= t * apq;
    a[[q, q]] += t * apq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for r in 0..n {
        if r != p && r != q {
            let arp = a[[r, p]];
            let arq = a[[r, q]];
            a[[r, p]] = c * arp - s * arq;
            a[[p, r]] = a[[r, p]];
            a[[r, q]] = s * arp + c * arq;
            a[[q, r]] = a[[r, q]];
        }
    }
}

/// Compute the condition number of a symmetric matrix
///
/// Ratio of the largest to smallest eigenvalue. Returns infinity when the
/// smallest eigenvalue is not strictly positive.
pub fn condition_number(matrix: &Array2<f64>) -> f64 {
    match symmetric_eigenvalues(matrix) {
        Ok(eigenvalues) if !eigenvalues.is_empty() => {
            let max_eig = eigenvalues[0];
            let min_eig = eigenvalues[eigenvalues.len() - 1];
            if min_eig <= f64::EPSILON * max_eig.abs() || min_eig <= 0.0 {
                f64::INFINITY
            } else {
                max_eig / min_eig
            }
        }
        _ => f64::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rstest::rstest;

    #[test]
    fn test_cholesky_reconstructs() {
        let a = array![[4.0, 2.0, 0.4], [2.0, 5.0, 1.0], [0.4, 1.0, 3.0]];
        let l = cholesky(&a).unwrap();
        let rebuilt = l.dot(&l.t());
        for i in 0..3 {
            for j in 0..3 {
                assert_abs_diff_eq!(rebuilt[[i, j]], a[[i, j]], epsilon = 1e-12);
            }
            for j in (i + 1)..3 {
                assert_eq!(l[[i, j]], 0.0);
            }
        }
    }

    #[test]
    fn test_cholesky_rejects_indefinite() {
        // Eigenvalues 3 and -1
        let a = array![[1.0, 2.0], [2.0, 1.0]];
        assert_eq!(cholesky(&a), Err(CovarianceError::NotPositiveDefinite));
    }

    #[test]
    fn test_cholesky_rejects_zero_variance() {
        let a = array![[0.04, 0.0], [0.0, 0.0]];
        assert_eq!(cholesky(&a), Err(CovarianceError::NotPositiveDefinite));
    }

    #[test]
    fn test_cholesky_rejects_non_square() {
        let a = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            cholesky(&a),
            Err(CovarianceError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_cholesky_solve() {
        let a = array![[0.04, 0.01], [0.01, 0.09]];
        let b = array![1.0, 1.0];
        let x = cholesky_solve(&a, &b).unwrap();
        let ax = a.dot(&x);
        assert_abs_diff_eq!(ax[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ax[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_dimension_mismatch() {
        let l = Array2::<f64>::eye(3);
        let b = array![1.0, 1.0];
        assert!(matches!(
            solve_with_cholesky(&l, &b),
            Err(CovarianceError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[rstest]
    #[case(array![[1.0, 0.5], [0.5, 1.0]], true)]
    #[case(array![[1.0, 0.5], [0.5, 0.25]], false)]
    #[case(array![[1.0, 0.3], [0.2, 1.0]], false)]
    #[case(array![[2.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 2.0]], true)]
    fn test_is_positive_definite(#[case] matrix: Array2<f64>, #[case] expected: bool) {
        assert_eq!(is_positive_definite(&matrix), expected);
    }

    #[test]
    fn test_eigenvalues_diagonal() {
        let a = array![[1.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 2.0]];
        let eig = symmetric_eigenvalues(&a).unwrap();
        assert_abs_diff_eq!(eig[0], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(eig[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(eig[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_eigenvalues_dense() {
        // All-ones off diagonal with 2 on the diagonal: eigenvalues 4, 1, 1
        let a = array![[2.0, 1.0, 1.0], [1.0, 2.0, 1.0], [1.0, 1.0, 2.0]];
        let eig = symmetric_eigenvalues(&a).unwrap();
        assert_abs_diff_eq!(eig[0], 4.0, epsilon = 1e-10);
        assert_abs_diff_eq!(eig[1], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(eig[2], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_eigenvalues_preserve_trace() {
        let a = array![[0.04, 0.01, -0.005], [0.01, 0.09, 0.02], [-0.005, 0.02, 0.16]];
        let eig = symmetric_eigenvalues(&a).unwrap();
        assert_abs_diff_eq!(eig.sum(), 0.29, epsilon = 1e-12);
    }

    #[test]
    fn test_condition_number() {
        assert_abs_diff_eq!(condition_number(&Array2::eye(3)), 1.0, epsilon = 1e-12);

        let ill = array![[1000.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.001]];
        assert_abs_diff_eq!(condition_number(&ill), 1e6, epsilon = 1e-3);

        let singular = array![[1.0, 1.0], [1.0, 1.0]];
        assert!(condition_number(&singular).is_infinite());
    }

    #[test]
    fn test_symmetrize_and_is_symmetric() {
        let a = array![[1.0, 0.2], [0.4, 1.0]];
        assert!(!is_symmetric(&a, 1e-12));
        let s = symmetrize(&a);
        assert!(is_symmetric(&s, 0.0));
        assert_abs_diff_eq!(s[[0, 1]], 0.3, epsilon = 1e-15);
    }
}
