//! Inverse normal CDF used by the estimator queries, the placeholder
//! bounds, and the fixed-lag delay computation.

use statrs::distribution::{ContinuousCDF, Normal};

/// Quantile of `N(mean, std_dev)` at probability `p`.
///
/// Collapses onto the mean when the deviation vanishes, which happens with
/// perfectly timed inputs (every quantile then sits on the mean).
pub(crate) fn normal_quantile(mean: f64, std_dev: f64, p: f64) -> f64 {
    if std_dev <= 0.0 {
        return mean;
    }
    match Normal::new(mean, std_dev) {
        Ok(dist) => dist.inverse_cdf(p),
        Err(_) => mean,
    }
}
