//! Exact null distribution of Kendall's statistic for untied samples.
//!
//! Under independence every ranking of `n` untied items is equally likely, so
//! the number of discordant pairs is the inversion count of a uniform random
//! permutation. Its law is the convolution of uniforms on `{0, .., j-1}` for
//! `j = 1..=n` (Mahonian numbers over `n!`).

use sw_core::{Error, Result};

/// Largest sample size for which the exact distribution is used by callers.
pub const EXACT_MAX_N: usize = 33;

/// Number of item pairs `n (n - 1) / 2`.
#[inline]
pub fn total_pairs(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// `P(D <= k)` for `k = 0..=c`, where `D` is the discordant-pair count.
fn lower_cdf(n: usize, c: usize) -> Vec<f64> {
    let mut probs = vec![0.0; c + 1];
    probs[0] = 1.0;
    let mut prefix = vec![0.0; c + 1];
    for j in 2..=n {
        let mut acc = 0.0;
        for (k, p) in probs.iter().enumerate() {
            acc += p;
            prefix[k] = acc;
        }
        for k in 0..=c {
            let window = if k >= j { prefix[k] - prefix[k - j] } else { prefix[k] };
            probs[k] = window / j as f64;
        }
    }
    let mut acc = 0.0;
    probs
        .into_iter()
        .map(|p| {
            acc += p;
            acc
        })
        .collect()
}

fn validate(n: usize) -> Result<()> {
    if n < 2 {
        return Err(Error::Validation(format!("exact Kendall distribution needs n >= 2, got {}", n)));
    }
    Ok(())
}

/// Two-sided exact p-value for `discordant` discordant pairs among `n` untied items.
pub fn two_sided_p(n: usize, discordant: usize) -> Result<f64> {
    validate(n)?;
    let total = total_pairs(n);
    if discordant > total {
        return Err(Error::Validation(format!(
            "discordant pairs ({}) exceed the {} pairs of {} items",
            discordant, total, n
        )));
    }
    let c = discordant.min(total - discordant);
    if 2 * c == total {
        return Ok(1.0);
    }
    let cdf = lower_cdf(n, c);
    Ok((2.0 * cdf[c]).min(1.0))
}

/// Largest discordant count `c <= total / 2` whose two-sided p-value is below `alpha`.
///
/// `None` when no count rejects (small `n`).
pub fn critical_discordant(n: usize, alpha: f64) -> Result<Option<usize>> {
    validate(n)?;
    let total = total_pairs(n);
    let half = total / 2;
    let cdf = lower_cdf(n, half);
    Ok((0..=half).rev().find(|&c| 2 * c != total && 2.0 * cdf[c] < alpha))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_small_n_matches_permutation_counts() {
        // n = 5: one inversion is reached by 1 + 4 of the 120 rankings.
        assert_abs_diff_eq!(two_sided_p(5, 1).unwrap(), 10.0 / 120.0, epsilon = 1e-15);
        assert_abs_diff_eq!(two_sided_p(5, 0).unwrap(), 2.0 / 120.0, epsilon = 1e-15);
        // Symmetric in D and total - D.
        assert_abs_diff_eq!(two_sided_p(5, 9).unwrap(), 10.0 / 120.0, epsilon = 1e-15);
        assert_abs_diff_eq!(two_sided_p(8, 4).unwrap(), 570.0 / 40320.0, epsilon = 1e-14);
    }

    #[test]
    fn test_middle_count_is_one() {
        assert_eq!(two_sided_p(5, 5).unwrap(), 1.0);
        assert_eq!(two_sided_p(2, 0).unwrap(), 1.0);
        assert!(two_sided_p(4, 3).unwrap() <= 1.0);
    }

    #[test]
    fn test_critical_discordant() {
        // n = 8: p(5) = 0.0312, p(6) = 0.0610.
        assert_eq!(critical_discordant(8, 0.05).unwrap(), Some(5));
        // n = 3: the smallest attainable p is 2/6.
        assert_eq!(critical_discordant(3, 0.05).unwrap(), None);
    }

    #[test]
    fn test_full_distribution_sums_to_one() {
        let n = 12;
        let cdf = lower_cdf(n, total_pairs(n));
        assert_abs_diff_eq!(*cdf.last().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(two_sided_p(1, 0), Err(Error::Validation(_))));
        assert!(matches!(two_sided_p(4, 7), Err(Error::Validation(_))));
    }
}
