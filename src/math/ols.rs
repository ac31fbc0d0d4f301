//! Linear least squares.
//!
//! The smoothing recursion is linear in its initial states once the smoothing
//! coefficients are fixed, so estimating those states is a problem of the form:
//!
//! ```text
//! minimize Σ (r_t - x_t^T θ)^2
//! ```
//!
//! with a tall design (thousands of daily rows, up to a few hundred states).
//!
//! Implementation choices:
//! - The primary path forms the normal equations `XᵀX θ = Xᵀr` and solves them
//!   with a Cholesky factorization. The Gram matrix is only `p × p`, which keeps
//!   the cost dominated by one matrix product.
//! - If the Gram matrix is not positive definite we fall back to SVD on the full
//!   design, which tolerates rank deficiency.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve via the normal equations, falling back to SVD.
pub fn solve_normal_equations(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let gram = x.tr_mul(x);
    let rhs = x.tr_mul(y);

    if let Some(chol) = gram.cholesky() {
        // cond(XᵀX) ≈ (max diag(L) / min diag(L))², so a tiny ratio means the
        // factorization only succeeded through rounding.
        let diag = chol.l_dirty().diagonal();
        let well_conditioned = diag.min() > diag.max() * 1e-6;
        if well_conditioned {
            let theta = chol.solve(&rhs);
            if theta.iter().all(|v| v.is_finite()) {
                return Some(theta);
            }
        }
    }

    solve_least_squares(x, y)
}
