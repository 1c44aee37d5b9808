//! Proportion tests.
//!
//! One- and two-proportion z tests use the normal approximation and refuse
//! samples that fail the `n p >= 5`, `n (1 - p) >= 5` rule. Fisher's exact test
//! works on 2x2 tables through the hypergeometric distribution.

use serde::{Deserialize, Serialize};
use sw_core::{
    Alternative, ContingencyTable, DegreesOfFreedom, Error, ProportionSample, Result, TestResult,
};
use sw_prob::{Reference, hypergeometric};

use crate::decision::{evaluate, finish, validate_alpha};

/// Minimum expected successes / failures for the normal approximation.
pub const NORMAL_APPROX_MIN: f64 = 5.0;

/// Relative tolerance when collecting tables "as or less likely" than the observed one.
const FISHER_RELATIVE_TOL: f64 = 1.0 + 1e-7;

/// Result of a one-proportion z test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneProportionResult {
    /// z statistic and verdict.
    pub test: TestResult,
    /// Observed proportion.
    pub p_hat: f64,
    /// Hypothesised proportion.
    pub p0: f64,
    /// `sqrt(p0 (1 - p0) / n)`.
    pub standard_error: f64,
}

/// Result of a two-proportion z test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoProportionResult {
    /// z statistic and verdict.
    pub test: TestResult,
    /// Proportion in sample 1.
    pub p1: f64,
    /// Proportion in sample 2.
    pub p2: f64,
    /// `(x1 + x2) / (n1 + n2)`.
    pub pooled_proportion: f64,
    /// Pooled standard error of `p1 - p2`.
    pub standard_error: f64,
}

/// Result of Fisher's exact test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FisherResult {
    /// Exact p-value and verdict. The statistic is the top-left cell count and
    /// there is no critical value.
    pub test: TestResult,
    /// Sample odds ratio `ad / bc` (`+inf` when `bc = 0 < ad`).
    pub odds_ratio: f64,
}

fn normal_approximation_check(n: u64, p: f64, which: &str) -> Result<()> {
    let nf = n as f64;
    if nf * p < NORMAL_APPROX_MIN || nf * (1.0 - p) < NORMAL_APPROX_MIN {
        return Err(Error::InsufficientData(format!(
            "{}: normal approximation requires n*p >= 5 and n*(1-p) >= 5 (n={}, p={})",
            which, n, p
        )));
    }
    Ok(())
}

/// One-proportion z test of `H0: p = p0`.
///
/// The standard error uses the hypothesised `p0`.
pub fn one_proportion_z_test(
    sample: &ProportionSample,
    p0: f64,
    alpha: f64,
    alternative: Alternative,
) -> Result<OneProportionResult> {
    validate_alpha(alpha)?;
    if !p0.is_finite() || p0 <= 0.0 || p0 >= 1.0 {
        return Err(Error::DegenerateInput(format!("p0 must be in (0,1), got {}", p0)));
    }
    let sample = ProportionSample::new(sample.successes, sample.trials)?;
    normal_approximation_check(sample.trials, p0, "sample")?;

    let p_hat = sample.proportion();
    let se = (p0 * (1.0 - p0) / sample.trials as f64).sqrt();
    let z = (p_hat - p0) / se;
    let test =
        evaluate(z, DegreesOfFreedom::NotApplicable, &Reference::StandardNormal, alpha, alternative)?;
    Ok(OneProportionResult { test, p_hat, p0, standard_error: se })
}

/// Two-proportion z test of `H0: p1 = p2` with the pooled standard error.
pub fn two_proportion_z_test(
    s1: &ProportionSample,
    s2: &ProportionSample,
    alpha: f64,
    alternative: Alternative,
) -> Result<TwoProportionResult> {
    validate_alpha(alpha)?;
    let s1 = ProportionSample::new(s1.successes, s1.trials)?;
    let s2 = ProportionSample::new(s2.successes, s2.trials)?;

    let (n1, n2) = (s1.trials as f64, s2.trials as f64);
    let pooled = (s1.successes + s2.successes) as f64 / (n1 + n2);
    if pooled <= 0.0 || pooled >= 1.0 {
        return Err(Error::DegenerateInput(format!(
            "pooled proportion is {}; standard error is zero",
            pooled
        )));
    }
    normal_approximation_check(s1.trials, pooled, "sample 1")?;
    normal_approximation_check(s2.trials, pooled, "sample 2")?;

    let se = (pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2)).sqrt();
    let (p1, p2) = (s1.proportion(), s2.proportion());
    let test = evaluate(
        (p1 - p2) / se,
        DegreesOfFreedom::NotApplicable,
        &Reference::StandardNormal,
        alpha,
        alternative,
    )?;
    Ok(TwoProportionResult { test, p1, p2, pooled_proportion: pooled, standard_error: se })
}

/// Fisher's exact test on a 2x2 table `[[a, b], [c, d]]`.
///
/// Conditioning on the margins, `a` is hypergeometric. Two-sided sums every
/// table no more likely than the observed one; greater is `P(X >= a)`, less is
/// `P(X <= a)`.
pub fn fisher_exact(
    table: &ContingencyTable,
    alpha: f64,
    alternative: Alternative,
) -> Result<FisherResult> {
    validate_alpha(alpha)?;
    if table.n_rows() != 2 || table.n_cols() != 2 {
        return Err(Error::InputShape(format!(
            "Fisher's exact test needs a 2x2 table, got {}x{}",
            table.n_rows(),
            table.n_cols()
        )));
    }
    let (a, b, c, d) = (table.get(0, 0), table.get(0, 1), table.get(1, 0), table.get(1, 1));

    let ad = a as f64 * d as f64;
    let bc = b as f64 * c as f64;
    let odds_ratio = if bc == 0.0 {
        if ad == 0.0 {
            return Err(Error::DegenerateInput("odds ratio is 0/0".to_string()));
        }
        f64::INFINITY
    } else {
        ad / bc
    };

    let total = a + b + c + d;
    let col1 = a + c;
    let row1 = a + b;
    let (lo, hi) = hypergeometric::support(total, col1, row1)?;
    let pmf = |k: u64| hypergeometric::pmf(k, total, col1, row1);

    let p_value = match alternative {
        Alternative::Greater => (a..=hi).map(pmf).sum::<Result<f64>>()?,
        Alternative::Less => (lo..=a).map(pmf).sum::<Result<f64>>()?,
        Alternative::TwoSided => {
            let observed = pmf(a)?;
            let threshold = observed * FISHER_RELATIVE_TOL;
            let mut acc = 0.0;
            for k in lo..=hi {
                let p = pmf(k)?;
                if p <= threshold {
                    acc += p;
                }
            }
            acc
        }
    };

    let test = finish(
        a as f64,
        DegreesOfFreedom::NotApplicable,
        p_value.clamp(0.0, 1.0),
        None,
        alpha,
        alternative,
    )?;
    Ok(FisherResult { test, odds_ratio })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use sw_core::Decision;

    #[test]
    fn test_one_proportion_uses_p0_standard_error() {
        let s = ProportionSample::new(45, 100).unwrap();
        let r = one_proportion_z_test(&s, 0.5, 0.05, Alternative::TwoSided).unwrap();
        assert_abs_diff_eq!(r.p_hat, 0.45, epsilon = 1e-12);
        assert_abs_diff_eq!(r.standard_error, 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(r.test.statistic, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.test.p_value, 0.31731050786291415, epsilon = 1e-10);
        assert_eq!(r.test.decision, Decision::FailToReject);
    }

    #[test]
    fn test_one_proportion_checks() {
        let s = ProportionSample::new(2, 20).unwrap();
        // n * p0 = 4 < 5
        assert!(matches!(
            one_proportion_z_test(&s, 0.2, 0.05, Alternative::TwoSided),
            Err(Error::InsufficientData(_))
        ));
        for p0 in [0.0, 1.0, -0.2] {
            assert!(matches!(
                one_proportion_z_test(&s, p0, 0.05, Alternative::TwoSided),
                Err(Error::DegenerateInput(_))
            ));
        }
    }

    #[test]
    fn test_two_proportion_reference_values() {
        let s1 = ProportionSample::new(68, 80).unwrap();
        let s2 = ProportionSample::new(72, 100).unwrap();
        let r = two_proportion_z_test(&s1, &s2, 0.05, Alternative::TwoSided).unwrap();
        assert_abs_diff_eq!(r.pooled_proportion, 140.0 / 180.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.standard_error, 0.06236095644623236, epsilon = 1e-12);
        assert_abs_diff_eq!(r.test.statistic, 2.0846376869169102, epsilon = 1e-10);
        assert_abs_diff_eq!(r.test.p_value, 0.03710220085947004, epsilon = 1e-9);
        assert_eq!(r.test.decision, Decision::Reject);

        let g = two_proportion_z_test(&s1, &s2, 0.05, Alternative::Greater).unwrap();
        assert_abs_diff_eq!(g.test.p_value, 0.01855110042973502, epsilon = 1e-9);
    }

    #[test]
    fn test_two_proportion_degenerate_pool() {
        let s1 = ProportionSample::new(0, 50).unwrap();
        let s2 = ProportionSample::new(0, 60).unwrap();
        assert!(matches!(
            two_proportion_z_test(&s1, &s2, 0.05, Alternative::TwoSided),
            Err(Error::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_fisher_tea_tasting_table() {
        let t = ContingencyTable::new(vec![vec![8, 2], vec![1, 5]]).unwrap();
        let r = fisher_exact(&t, 0.05, Alternative::TwoSided).unwrap();
        assert_abs_diff_eq!(r.odds_ratio, 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.test.p_value, 400.0 / 11440.0, epsilon = 1e-10);
        assert!(r.test.critical_value.is_none());
        assert_eq!(r.test.decision, Decision::Reject);

        // P(X >= 8) = (189 + 7) / 8008
        let g = fisher_exact(&t, 0.05, Alternative::Greater).unwrap();
        assert_abs_diff_eq!(g.test.p_value, 196.0 / 8008.0, epsilon = 1e-10);
        let l = fisher_exact(&t, 0.05, Alternative::Less).unwrap();
        assert_abs_diff_eq!(l.test.p_value, 1.0 - 7.0 / 8008.0, epsilon = 1e-10);
    }

    #[test]
    fn test_fisher_shape_and_degenerate() {
        let t = ContingencyTable::new(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
        assert!(matches!(fisher_exact(&t, 0.05, Alternative::TwoSided), Err(Error::InputShape(_))));

        let zero = ContingencyTable::new(vec![vec![0, 3], vec![0, 4]]).unwrap();
        assert!(matches!(
            fisher_exact(&zero, 0.05, Alternative::TwoSided),
            Err(Error::DegenerateInput(_))
        ));

        let inf = ContingencyTable::new(vec![vec![5, 0], vec![1, 4]]).unwrap();
        let r = fisher_exact(&inf, 0.05, Alternative::TwoSided).unwrap();
        assert!(r.odds_ratio.is_infinite());
        assert!((0.0..=1.0).contains(&r.test.p_value));
    }
}
