//! Hypergeometric distribution utilities.
//!
//! Parameterised as draws of `n` items without replacement from a population of
//! `total` items containing `successes` marked items.

use sw_core::{Error, Result};

use crate::math::ln_choose;

/// Support `[max(0, n + K - N), min(n, K)]` of the number of marked items drawn.
pub fn support(total: u64, successes: u64, n: u64) -> Result<(u64, u64)> {
    if successes > total || n > total {
        return Err(Error::Validation(format!(
            "successes ({}) and draws ({}) must not exceed population ({})",
            successes, n, total
        )));
    }
    let lo = (n + successes).saturating_sub(total);
    let hi = n.min(successes);
    Ok((lo, hi))
}

/// `P(X = k)`.
pub fn pmf(k: u64, total: u64, successes: u64, n: u64) -> Result<f64> {
    let (lo, hi) = support(total, successes, n)?;
    if k < lo || k > hi {
        return Ok(0.0);
    }
    let lp = ln_choose(successes, k) + ln_choose(total - successes, n - k) - ln_choose(total, n);
    Ok(lp.exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_pmf_sums_to_one() {
        let (total, k, n) = (16, 9, 10);
        let (lo, hi) = support(total, k, n).unwrap();
        assert_eq!((lo, hi), (3, 9));
        let s: f64 = (lo..=hi).map(|x| pmf(x, total, k, n).unwrap()).sum();
        assert_abs_diff_eq!(s, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pmf_known() {
        // C(9,8) C(7,2) / C(16,10) = 9 * 21 / 8008
        assert_abs_diff_eq!(pmf(8, 16, 9, 10).unwrap(), 189.0 / 8008.0, epsilon = 1e-12);
        assert_eq!(pmf(2, 16, 9, 10).unwrap(), 0.0);
    }

    #[test]
    fn test_invalid() {
        assert!(support(5, 6, 2).is_err());
    }
}
