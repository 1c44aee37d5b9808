//! Confidence intervals for a mean or a proportion.
//!
//! `confidence` is a fraction in `(0, 1)`; the interval is
//! `estimate +/- critical * se` with a two-sided critical value.

use serde::{Deserialize, Serialize};
use sw_core::{Error, ProportionSample, Result};
use sw_prob::{normal, student_t};

/// Two-sided interval around a point estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Confidence level in `(0, 1)`.
    pub confidence: f64,
    /// Point estimate.
    pub estimate: f64,
    /// z or t critical value.
    pub critical_value: f64,
    /// Standard error.
    pub standard_error: f64,
    /// `critical_value * standard_error`.
    pub margin: f64,
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

impl ConfidenceInterval {
    fn around(confidence: f64, estimate: f64, critical_value: f64, standard_error: f64) -> Self {
        let margin = critical_value * standard_error;
        Self {
            confidence,
            estimate,
            critical_value,
            standard_error,
            margin,
            lower: estimate - margin,
            upper: estimate + margin,
        }
    }
}

/// Require `0 < confidence < 1`.
pub fn validate_confidence(confidence: f64) -> Result<()> {
    if !confidence.is_finite() || confidence <= 0.0 || confidence >= 1.0 {
        return Err(Error::Validation(format!(
            "confidence level must be in (0,1), got {}",
            confidence
        )));
    }
    Ok(())
}

fn validate_inputs(estimate: f64, spread: f64, n: usize, min_n: usize) -> Result<()> {
    if !estimate.is_finite() {
        return Err(Error::Validation(format!("estimate must be finite, got {}", estimate)));
    }
    if !spread.is_finite() || spread <= 0.0 {
        return Err(Error::Validation(format!("standard deviation must be positive, got {}", spread)));
    }
    if n < min_n {
        return Err(Error::InsufficientData(format!(
            "interval needs a sample size of at least {}, got {}",
            min_n, n
        )));
    }
    Ok(())
}

/// z interval for a mean with known population sigma.
pub fn mean_known_sigma(mean: f64, sigma: f64, n: usize, confidence: f64) -> Result<ConfidenceInterval> {
    validate_confidence(confidence)?;
    validate_inputs(mean, sigma, n, 1)?;
    let z = normal::standard_quantile(1.0 - (1.0 - confidence) / 2.0)?;
    Ok(ConfidenceInterval::around(confidence, mean, z, sigma / (n as f64).sqrt()))
}

/// t interval for a mean with `n - 1` degrees of freedom.
pub fn mean_unknown_sigma(mean: f64, std_dev: f64, n: usize, confidence: f64) -> Result<ConfidenceInterval> {
    validate_confidence(confidence)?;
    validate_inputs(mean, std_dev, n, 2)?;
    let t = student_t::quantile(1.0 - (1.0 - confidence) / 2.0, (n - 1) as f64)?;
    Ok(ConfidenceInterval::around(confidence, mean, t, std_dev / (n as f64).sqrt()))
}

/// Wald interval using the observed proportion.
///
/// The bounds are not clipped to `[0, 1]`.
pub fn proportion(sample: &ProportionSample, confidence: f64) -> Result<ConfidenceInterval> {
    validate_confidence(confidence)?;
    let p_hat = sample.proportion();
    let n = sample.trials as f64;
    let z = normal::standard_quantile(1.0 - (1.0 - confidence) / 2.0)?;
    let se = (p_hat * (1.0 - p_hat) / n).sqrt();
    Ok(ConfidenceInterval::around(confidence, p_hat, z, se))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mean_known_sigma() {
        let ci = mean_known_sigma(42.5, 5.0, 35, 0.90).unwrap();
        assert_abs_diff_eq!(ci.critical_value, 1.6448536269514722, epsilon = 1e-9);
        assert_abs_diff_eq!(ci.standard_error, 5.0 / 35f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(ci.lower, 42.5 - ci.margin, epsilon = 1e-12);
        assert_abs_diff_eq!(ci.margin, 1.390155, epsilon = 1e-6);
    }

    #[test]
    fn test_mean_unknown_sigma() {
        let ci = mean_unknown_sigma(45.0, 5.0, 15, 0.95).unwrap();
        assert_abs_diff_eq!(ci.critical_value, 2.1447866879169273, epsilon = 1e-6);
        assert_abs_diff_eq!(ci.upper, 45.0 + 2.1447866879169273 * 5.0 / 15f64.sqrt(), epsilon = 1e-5);
        assert!(matches!(mean_unknown_sigma(1.0, 1.0, 1, 0.95), Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_proportion_uses_observed_p_hat() {
        let ci = proportion(&ProportionSample::new(176, 225).unwrap(), 0.95).unwrap();
        let p_hat = 176.0 / 225.0;
        assert_abs_diff_eq!(ci.estimate, p_hat, epsilon = 1e-12);
        assert_abs_diff_eq!(ci.standard_error, (p_hat * (1.0 - p_hat) / 225.0).sqrt(), epsilon = 1e-12);
        assert!(ci.lower < p_hat && p_hat < ci.upper);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(mean_known_sigma(0.0, 1.0, 10, 1.0), Err(Error::Validation(_))));
        assert!(matches!(mean_known_sigma(0.0, 0.0, 10, 0.9), Err(Error::Validation(_))));
        assert!(matches!(mean_known_sigma(0.0, 1.0, 0, 0.9), Err(Error::InsufficientData(_))));
    }
}
