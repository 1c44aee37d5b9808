//! Poisson distribution utilities.

use statrs::distribution::{DiscreteCDF, Poisson};
use sw_core::{Error, Result};

use crate::math::ln_factorial;

fn validate_lambda(lambda: f64) -> Result<()> {
    if !lambda.is_finite() || lambda <= 0.0 {
        return Err(Error::Validation(format!("lambda must be finite and > 0, got {}", lambda)));
    }
    Ok(())
}

/// Log-PMF of `Poisson(lambda)` at count `k`.
pub fn logpmf(k: u64, lambda: f64) -> Result<f64> {
    validate_lambda(lambda)?;
    let kf = k as f64;
    Ok(kf * lambda.ln() - lambda - ln_factorial(k))
}

/// `P(X = k)`.
pub fn pmf(k: u64, lambda: f64) -> Result<f64> {
    Ok(logpmf(k, lambda)?.exp())
}

/// `P(X <= k)`.
pub fn cdf(k: u64, lambda: f64) -> Result<f64> {
    validate_lambda(lambda)?;
    let dist = Poisson::new(lambda).map_err(|e| Error::Validation(e.to_string()))?;
    Ok(dist.cdf(k))
}

/// `P(X >= k)`.
pub fn sf_inclusive(k: u64, lambda: f64) -> Result<f64> {
    validate_lambda(lambda)?;
    if k == 0 {
        return Ok(1.0);
    }
    let dist = Poisson::new(lambda).map_err(|e| Error::Validation(e.to_string()))?;
    Ok(dist.sf(k - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_pmf_known() {
        assert_abs_diff_eq!(pmf(0, 2.0).unwrap(), (-2.0f64).exp(), epsilon = 1e-14);
        assert_abs_diff_eq!(pmf(3, 2.0).unwrap(), 8.0 / 6.0 * (-2.0f64).exp(), epsilon = 1e-14);
    }

    #[test]
    fn test_cdf_matches_pmf_sum() {
        let lambda = 3.2;
        let sum: f64 = (0..=5).map(|k| pmf(k, lambda).unwrap()).sum();
        assert_abs_diff_eq!(cdf(5, lambda).unwrap(), sum, epsilon = 1e-10);
        assert_abs_diff_eq!(sf_inclusive(6, lambda).unwrap(), 1.0 - sum, epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_lambda() {
        assert!(pmf(1, 0.0).is_err());
        assert!(cdf(1, -1.0).is_err());
    }
}
