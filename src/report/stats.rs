//! Goodness-of-fit statistics.
//!
//! With `r` the weighted residuals, `n` data points and `k` free parameters:
//!
//! ```text
//! chi-square         = Σ rᵢ²
//! reduced chi-square = chi-square / max(1, n − k)
//! AIC                = n·ln(chi-square/n) + 2k
//! BIC                = n·ln(chi-square/n) + k·ln(n)
//! R²                 = 1 − Σ rᵢ² / Σ ((yᵢ − ȳ)/σᵢ)²
//! ```
//!
//! Chi-square is clamped below at `1e-250·n` before taking logarithms so a
//! perfect fit yields very negative, but finite, information criteria.

use serde::{Deserialize, Serialize};

const CHISQR_FLOOR: f64 = 1.0e-250;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoodnessOfFit {
    pub ndata: usize,
    pub nvarys: usize,
    /// Degrees of freedom, `n − k` (may be zero).
    pub nfree: usize,
    pub chisqr: f64,
    pub redchi: f64,
    pub aic: f64,
    pub bic: f64,
    pub rsquared: f64,
}

impl GoodnessOfFit {
    /// `residuals` are already divided by `σ`; `y` and `weights` (`1/σ`) are
    /// needed for the total sum of squares in R².
    pub fn compute(residuals: &[f64], y: &[f64], weights: &[f64], nvarys: usize) -> Self {
        let ndata = residuals.len();
        let n = ndata as f64;
        let k = nvarys as f64;

        let chisqr: f64 = residuals.iter().map(|r| r * r).sum();
        let nfree = ndata.saturating_sub(nvarys);
        let redchi = chisqr / nfree.max(1) as f64;

        let floored = chisqr.max(CHISQR_FLOOR * n);
        let neg2_log_likelihood = n * (floored / n).ln();
        let aic = neg2_log_likelihood + 2.0 * k;
        let bic = neg2_log_likelihood + n.ln() * k;

        let mean = if ndata > 0 {
            y.iter().sum::<f64>() / n
        } else {
            f64::NAN
        };
        let total: f64 = y
            .iter()
            .zip(weights)
            .map(|(yi, w)| ((yi - mean) * w).powi(2))
            .sum();
        let rsquared = 1.0 - chisqr / total;

        Self {
            ndata,
            nvarys,
            nfree,
            chisqr,
            redchi,
            aic,
            bic,
            rsquared,
        }
    }
}
