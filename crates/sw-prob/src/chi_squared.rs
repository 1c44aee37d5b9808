//! Chi-squared distribution utilities.

use statrs::distribution::{ChiSquared, ContinuousCDF};
use sw_core::{Error, Result};

use crate::math::invert_cdf;

fn build(df: f64) -> Result<ChiSquared> {
    if !df.is_finite() || df <= 0.0 {
        return Err(Error::Validation(format!("df must be finite and > 0, got {}", df)));
    }
    ChiSquared::new(df).map_err(|e| Error::Validation(e.to_string()))
}

/// `P(X <= x)`.
pub fn cdf(x: f64, df: f64) -> Result<f64> {
    let dist = build(df)?;
    Ok(if x <= 0.0 { 0.0 } else { dist.cdf(x) })
}

/// `P(X > x)`.
pub fn sf(x: f64, df: f64) -> Result<f64> {
    let dist = build(df)?;
    Ok(if x <= 0.0 { 1.0 } else { dist.sf(x) })
}

/// Inverse CDF at `p` in `(0, 1)`.
pub fn quantile(p: f64, df: f64) -> Result<f64> {
    let dist = build(df)?;
    invert_cdf(|x| if x <= 0.0 { 0.0 } else { dist.cdf(x) }, p, 0.0)
}
