//! Binomial distribution utilities.

use statrs::distribution::{Binomial, DiscreteCDF};
use sw_core::{Error, Result};

use crate::math::ln_choose;

fn validate_p(p: f64) -> Result<()> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(Error::Validation(format!("p must be finite and in [0,1], got {}", p)));
    }
    Ok(())
}

fn build(n: u64, p: f64) -> Result<Binomial> {
    validate_p(p)?;
    Binomial::new(p, n).map_err(|e| Error::Validation(e.to_string()))
}

/// Log-PMF of `Binom(n, p)` at count `k`.
pub fn logpmf(k: u64, n: u64, p: f64) -> Result<f64> {
    validate_p(p)?;
    if k > n {
        return Ok(f64::NEG_INFINITY);
    }
    if p == 0.0 {
        return Ok(if k == 0 { 0.0 } else { f64::NEG_INFINITY });
    }
    if p == 1.0 {
        return Ok(if k == n { 0.0 } else { f64::NEG_INFINITY });
    }
    let kf = k as f64;
    let nf = n as f64;
    Ok(ln_choose(n, k) + kf * p.ln() + (nf - kf) * (-p).ln_1p())
}

/// `P(X = k)`.
pub fn pmf(k: u64, n: u64, p: f64) -> Result<f64> {
    Ok(logpmf(k, n, p)?.exp())
}

/// `P(X <= k)`.
pub fn cdf(k: u64, n: u64, p: f64) -> Result<f64> {
    if k >= n {
        validate_p(p)?;
        return Ok(1.0);
    }
    Ok(build(n, p)?.cdf(k))
}

/// `P(X >= k)`.
pub fn sf_inclusive(k: u64, n: u64, p: f64) -> Result<f64> {
    if k == 0 {
        validate_p(p)?;
        return Ok(1.0);
    }
    if k > n {
        validate_p(p)?;
        return Ok(0.0);
    }
    Ok(build(n, p)?.sf(k - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_pmf_small() {
        // Binom(4, 0.5): 1, 4, 6, 4, 1 over 16.
        for (k, c) in [1.0, 4.0, 6.0, 4.0, 1.0].iter().enumerate() {
            assert_abs_diff_eq!(pmf(k as u64, 4, 0.5).unwrap(), c / 16.0, epsilon = 1e-12);
        }
        assert_eq!(pmf(5, 4, 0.5).unwrap(), 0.0);
    }

    #[test]
    fn test_cdf_and_sf_are_consistent() {
        let (n, p) = (20, 0.3);
        for k in 0..=n {
            let lower = cdf(k, n, p).unwrap();
            let upper = if k < n { sf_inclusive(k + 1, n, p).unwrap() } else { 0.0 };
            assert_abs_diff_eq!(lower + upper, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_degenerate_p() {
        assert_eq!(pmf(0, 5, 0.0).unwrap(), 1.0);
        assert_eq!(pmf(5, 5, 1.0).unwrap(), 1.0);
        assert!(pmf(1, 5, 1.5).is_err());
    }
}
