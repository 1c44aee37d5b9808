//! Normal distribution utilities.

use statrs::distribution::{ContinuousCDF, Normal};
use sw_core::{Error, Result};

fn build(mu: f64, sigma: f64) -> Result<Normal> {
    if !mu.is_finite() {
        return Err(Error::Validation(format!("mu must be finite, got {}", mu)));
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(Error::Validation(format!("sigma must be finite and > 0, got {}", sigma)));
    }
    Normal::new(mu, sigma).map_err(|e| Error::Validation(e.to_string()))
}

/// `P(X <= x)` for `X ~ N(mu, sigma)`.
pub fn cdf(x: f64, mu: f64, sigma: f64) -> Result<f64> {
    Ok(build(mu, sigma)?.cdf(x))
}

/// `P(X > x)` for `X ~ N(mu, sigma)`.
pub fn sf(x: f64, mu: f64, sigma: f64) -> Result<f64> {
    Ok(build(mu, sigma)?.sf(x))
}

/// Inverse CDF at probability `p` in `(0, 1)`.
pub fn quantile(p: f64, mu: f64, sigma: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(Error::Validation(format!("p must be in (0,1), got {}", p)));
    }
    Ok(build(mu, sigma)?.inverse_cdf(p))
}

/// Standard normal CDF `Φ(z)`.
pub fn standard_cdf(z: f64) -> f64 {
    0.5 * statrs::function::erf::erfc(-z / std::f64::consts::SQRT_2)
}

/// Standard normal survival function `1 - Φ(z)`.
pub fn standard_sf(z: f64) -> f64 {
    standard_cdf(-z)
}

/// Standard normal quantile `Φ⁻¹(p)`.
pub fn standard_quantile(p: f64) -> Result<f64> {
    quantile(p, 0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_standard_values() {
        assert_abs_diff_eq!(standard_cdf(0.0), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(standard_cdf(1.959963984540054), 0.975, epsilon = 1e-10);
        assert_abs_diff_eq!(standard_sf(1.0), 0.15865525393145707, epsilon = 1e-10);
        assert_abs_diff_eq!(standard_quantile(0.975).unwrap(), 1.959963984540054, epsilon = 1e-9);
    }

    #[test]
    fn test_location_scale() {
        assert_abs_diff_eq!(cdf(110.0, 100.0, 10.0).unwrap(), standard_cdf(1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(sf(90.0, 100.0, 10.0).unwrap(), standard_cdf(1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(quantile(0.5, 3.0, 2.0).unwrap(), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_params() {
        assert!(cdf(0.0, 0.0, 0.0).is_err());
        assert!(cdf(0.0, 0.0, -1.0).is_err());
        assert!(quantile(0.0, 0.0, 1.0).is_err());
        assert!(quantile(1.0, 0.0, 1.0).is_err());
    }
}
