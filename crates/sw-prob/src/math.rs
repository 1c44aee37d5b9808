//! Small numerically-stable math and combinatorial utilities.

use statrs::function::gamma::ln_gamma;
use sw_core::{Error, Result};

/// Stable `log(1 + exp(x))`.
///
/// `log(1+exp(x)) = max(x,0) + log(1+exp(-|x|))`.
#[inline]
pub fn log1pexp(x: f64) -> f64 {
    let e = (-x.abs()).exp(); // in (0, 1], no overflow
    x.max(0.0) + e.ln_1p()
}

/// Stable sigmoid: `1 / (1 + exp(-x))`.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    let e = (-x.abs()).exp();
    let recip = 1.0 / (1.0 + e);
    if x >= 0.0 { recip } else { e * recip }
}

/// `ln(n!)`.
#[inline]
pub fn ln_factorial(n: u64) -> f64 {
    ln_gamma(n as f64 + 1.0)
}

/// `ln(n choose k)`, `-inf` when `k > n`.
pub fn ln_choose(n: u64, k: u64) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k)
}

/// Number of ordered arrangements `nPr = n! / (n-r)!`.
pub fn permutations(n: u64, r: u64) -> Result<u128> {
    if r > n {
        return Err(Error::Validation(format!("r must be <= n, got r={} n={}", r, n)));
    }
    let mut acc: u128 = 1;
    for i in (n - r + 1)..=n {
        acc = acc
            .checked_mul(i as u128)
            .ok_or_else(|| Error::Validation(format!("{}P{} overflows u128", n, r)))?;
    }
    Ok(acc)
}

/// Number of unordered selections `nCr`.
pub fn combinations(n: u64, r: u64) -> Result<u128> {
    if r > n {
        return Err(Error::Validation(format!("r must be <= n, got r={} n={}", r, n)));
    }
    let r = r.min(n - r);
    let mut acc: u128 = 1;
    for i in 1..=r {
        // acc * (n - r + i) is always divisible by i at this point.
        acc = acc
            .checked_mul((n - r + i) as u128)
            .ok_or_else(|| Error::Validation(format!("{}C{} overflows u128", n, r)))?
            / i as u128;
    }
    Ok(acc)
}

/// Size of the sample space of `k` independent steps with `n` outcomes each (`n^k`).
pub fn sample_space_size(n: u64, k: u32) -> Result<u128> {
    (n as u128)
        .checked_pow(k)
        .ok_or_else(|| Error::Validation(format!("{}^{} overflows u128", n, k)))
}

/// Invert a monotone CDF on `[lower, +inf)` by bracketing then bisection.
///
/// `p` must lie in `(0, 1)`.
pub fn invert_cdf<F>(cdf: F, p: f64, lower: f64) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    if !(p > 0.0 && p < 1.0) {
        return Err(Error::Validation(format!("probability must be in (0,1), got {}", p)));
    }
    let mut lo = lower;
    let mut hi = lower + 1.0;
    let mut expansions = 0;
    while cdf(hi) < p {
        lo = hi;
        hi = lower + 2.0 * (hi - lower);
        expansions += 1;
        if expansions > 1100 || !hi.is_finite() {
            return Err(Error::Computation(format!("could not bracket quantile for p={}", p)));
        }
    }
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if cdf(mid) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= 1e-14 * hi.abs().max(1.0) {
            break;
        }
    }
    Ok(0.5 * (lo + hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log1pexp_matches_naive_moderate_values() {
        let xs: [f64; 7] = [-10.0, -2.0, -0.1, 0.0, 0.1, 2.0, 10.0];
        for x in xs {
            let naive = (1.0 + x.exp()).ln();
            assert!((naive - log1pexp(x)).abs() < 1e-12, "x={}", x);
        }
        assert!((log1pexp(1e6) - 1e6).abs() < 1e-6);
    }

    #[test]
    fn test_sigmoid_bounds_and_symmetry() {
        for x in [-50.0, -10.0, -1.0, 0.0, 1.0, 10.0, 50.0] {
            let s = sigmoid(x);
            assert!((0.0..=1.0).contains(&s));
            assert!((s + sigmoid(-x) - 1.0).abs() < 1e-15);
        }
    }

    #[test]
    fn test_ln_choose() {
        assert!((ln_choose(10, 3) - 120f64.ln()).abs() < 1e-10);
        assert_eq!(ln_choose(3, 5), f64::NEG_INFINITY);
        assert!(ln_choose(7, 0).abs() < 1e-12);
    }

    #[test]
    fn test_combinatorics() {
        assert_eq!(permutations(5, 2).unwrap(), 20);
        assert_eq!(permutations(5, 0).unwrap(), 1);
        assert_eq!(combinations(5, 2).unwrap(), 10);
        assert_eq!(combinations(52, 5).unwrap(), 2_598_960);
        assert_eq!(combinations(100, 50).unwrap(), 100_891_344_545_564_193_334_812_497_256);
        assert_eq!(sample_space_size(6, 2).unwrap(), 36);
        assert_eq!(sample_space_size(2, 10).unwrap(), 1024);
    }

    #[test]
    fn test_combinatorics_errors() {
        assert!(matches!(permutations(3, 4), Err(Error::Validation(_))));
        assert!(matches!(combinations(3, 4), Err(Error::Validation(_))));
        assert!(matches!(permutations(200, 100), Err(Error::Validation(_))));
        assert!(matches!(sample_space_size(10, 100), Err(Error::Validation(_))));
    }

    #[test]
    fn test_invert_cdf_exponential() {
        let cdf = |x: f64| 1.0 - (-x).exp();
        let q = invert_cdf(cdf, 0.5, 0.0).unwrap();
        assert!((q - 2f64.ln()).abs() < 1e-10);
        assert!(invert_cdf(cdf, 1.0, 0.0).is_err());
    }
}
