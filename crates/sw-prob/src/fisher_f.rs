//! Fisher-Snedecor F distribution utilities.

use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use sw_core::{Error, Result};

use crate::math::invert_cdf;

fn build(d1: f64, d2: f64) -> Result<FisherSnedecor> {
    for (name, d) in [("d1", d1), ("d2", d2)] {
        if !d.is_finite() || d <= 0.0 {
            return Err(Error::Validation(format!("{} must be finite and > 0, got {}", name, d)));
        }
    }
    FisherSnedecor::new(d1, d2).map_err(|e| Error::Validation(e.to_string()))
}

/// `P(F <= x)`.
pub fn cdf(x: f64, d1: f64, d2: f64) -> Result<f64> {
    let dist = build(d1, d2)?;
    Ok(if x <= 0.0 { 0.0 } else { dist.cdf(x) })
}

/// `P(F > x)`.
pub fn sf(x: f64, d1: f64, d2: f64) -> Result<f64> {
    let dist = build(d1, d2)?;
    Ok(if x <= 0.0 { 1.0 } else { dist.sf(x) })
}

/// Inverse CDF at `p` in `(0, 1)`.
pub fn quantile(p: f64, d1: f64, d2: f64) -> Result<f64> {
    let dist = build(d1, d2)?;
    invert_cdf(|x| if x <= 0.0 { 0.0 } else { dist.cdf(x) }, p, 0.0)
}
