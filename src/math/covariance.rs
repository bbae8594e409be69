//! Parameter covariance from a Jacobian.
//!
//! For a least-squares problem with Jacobian `J` (rows = residuals, columns =
//! free parameters), the covariance estimate is `(JᵀJ)⁻¹`. We form it from the
//! SVD of `J` rather than inverting `JᵀJ` directly:
//!
//! ```text
//! J = U Σ Vᵀ   ⇒   (JᵀJ)⁻¹ = V Σ⁻² Vᵀ
//! ```
//!
//! which avoids squaring the condition number before the rank check.

use nalgebra::DMatrix;

/// Singular values below `RANK_TOL · σ_max` count as zero.
const RANK_TOL: f64 = 1e-12;

/// `(JᵀJ)⁻¹`, or `None` when `J` is rank deficient or not finite.
pub fn normal_inverse(jacobian: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let n = jacobian.ncols();
    if n == 0 || jacobian.nrows() < n || jacobian.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let svd = jacobian.clone().svd(false, true);
    let v_t = svd.v_t?;
    let sigma = &svd.singular_values;
    let sigma_max = sigma.iter().cloned().fold(0.0_f64, f64::max);
    if sigma_max == 0.0 || sigma.iter().any(|&s| s <= RANK_TOL * sigma_max) {
        return None;
    }

    let mut scaled = v_t.transpose();
    for (j, &s) in sigma.iter().enumerate() {
        let inv = 1.0 / (s * s);
        scaled.column_mut(j).scale_mut(inv);
    }
    let inverse = scaled * v_t;

    if inverse.iter().all(|v| v.is_finite()) {
        Some(inverse)
    } else {
        None
    }
}

/// Correlation matrix `c_ij = cov_ij / (σ_i σ_j)`, or `None` if any variance
/// is non-positive.
pub fn correlation(covariance: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let n = covariance.nrows();
    let sd: Vec<f64> = (0..n).map(|i| covariance[(i, i)]).collect();
    if sd.iter().any(|&v| !(v > 0.0)) {
        return None;
    }
    let sd: Vec<f64> = sd.into_iter().map(f64::sqrt).collect();
    Some(DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            1.0
        } else {
            covariance[(i, j)] / (sd[i] * sd[j])
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn inverse_matches_direct_inverse() {
        // Line fit y = a + b x on x = [0, 1, 2, 3]
        let j = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let direct = (j.transpose() * &j).try_inverse().unwrap();
        let via_svd = normal_inverse(&j).unwrap();
        for (a, b) in direct.iter().zip(via_svd.iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-10, epsilon = 1e-14);
        }
    }

    #[test]
    fn collinear_columns_have_no_inverse() {
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        assert!(normal_inverse(&j).is_none());
    }

    #[test]
    fn too_few_rows_have_no_inverse() {
        let j = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        assert!(normal_inverse(&j).is_none());
    }

    #[test]
    fn correlation_has_unit_diagonal() {
        let cov = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 9.0]);
        let corr = correlation(&cov).unwrap();
        assert_eq!(corr[(0, 0)], 1.0);
        assert_relative_eq!(corr[(0, 1)], 1.0 / 6.0, max_relative = 1e-12);
        assert_relative_eq!(corr[(1, 0)], corr[(0, 1)]);
    }
}
