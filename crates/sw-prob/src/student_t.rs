//! Student-t distribution utilities (standard location / scale).

use statrs::distribution::{ContinuousCDF, StudentsT};
use sw_core::{Error, Result};

use crate::math::invert_cdf;

fn build(df: f64) -> Result<StudentsT> {
    if !df.is_finite() || df <= 0.0 {
        return Err(Error::Validation(format!("df must be finite and > 0, got {}", df)));
    }
    StudentsT::new(0.0, 1.0, df).map_err(|e| Error::Validation(e.to_string()))
}

/// `P(T <= t)` with `df` degrees of freedom.
pub fn cdf(t: f64, df: f64) -> Result<f64> {
    Ok(build(df)?.cdf(t))
}

/// `P(T > t)` with `df` degrees of freedom.
pub fn sf(t: f64, df: f64) -> Result<f64> {
    // Symmetry keeps precision in the upper tail.
    Ok(build(df)?.cdf(-t))
}

/// Inverse CDF at `p` in `(0, 1)`.
pub fn quantile(p: f64, df: f64) -> Result<f64> {
    let dist = build(df)?;
    if !(p > 0.0 && p < 1.0) {
        return Err(Error::Validation(format!("p must be in (0,1), got {}", p)));
    }
    if p == 0.5 {
        return Ok(0.0);
    }
    let upper = p.max(1.0 - p);
    let q = invert_cdf(|x| dist.cdf(x), upper, 0.0)?;
    Ok(if p < 0.5 { -q } else { q })
}
