//! Two-sample location tests.
//!
//! - pooled (Student) and Welch t tests from sample summaries or raw samples
//! - z test for two means with known population standard deviations
//! - z test of a raw sample against a population mean

use serde::{Deserialize, Serialize};
use sw_core::{Alternative, DegreesOfFreedom, Error, Result, SampleSummary, TestResult};
use sw_prob::Reference;

use crate::decision::{evaluate, validate_alpha};

/// Minimum per-sample size for the large-sample z tests of means.
pub const Z_TEST_MIN_COUNT: usize = 30;

/// Result of a location test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationResult {
    /// Statistic, df, p-value, critical value and verdict.
    pub test: TestResult,
    /// `mean1 - mean2` (or `mean - mu0` for the population z test).
    pub mean_difference: f64,
    /// Standard error of the mean difference.
    pub standard_error: f64,
    /// Pooled variance (pooled t only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pooled_variance: Option<f64>,
}

fn require_variance(s: &SampleSummary, which: &str) -> Result<()> {
    if s.count < 2 {
        return Err(Error::InsufficientData(format!(
            "{} needs at least 2 observations to estimate a variance, got {}",
            which, s.count
        )));
    }
    Ok(())
}

fn require_large(count: usize, which: &str) -> Result<()> {
    if count < Z_TEST_MIN_COUNT {
        return Err(Error::InsufficientData(format!(
            "{} has {} observations; the z test requires at least {}",
            which, count, Z_TEST_MIN_COUNT
        )));
    }
    Ok(())
}

fn require_positive_se(se: f64) -> Result<()> {
    if !(se > 0.0) || !se.is_finite() {
        return Err(Error::DegenerateInput(format!("standard error must be > 0, got {}", se)));
    }
    Ok(())
}

/// Student's t test assuming equal variances.
pub fn pooled_t_test(
    s1: &SampleSummary,
    s2: &SampleSummary,
    alpha: f64,
    alternative: Alternative,
) -> Result<LocationResult> {
    validate_alpha(alpha)?;
    require_variance(s1, "sample 1")?;
    require_variance(s2, "sample 2")?;

    let (n1, n2) = (s1.count as f64, s2.count as f64);
    let df = n1 + n2 - 2.0;
    let pooled_var = ((n1 - 1.0) * s1.variance() + (n2 - 1.0) * s2.variance()) / df;
    let se = (pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt();
    require_positive_se(se)?;

    let diff = s1.mean - s2.mean;
    let t = diff / se;
    let test = evaluate(
        t,
        DegreesOfFreedom::Single(df),
        &Reference::StudentT { df },
        alpha,
        alternative,
    )?;
    Ok(LocationResult {
        test,
        mean_difference: diff,
        standard_error: se,
        pooled_variance: Some(pooled_var),
    })
}

/// Welch-Satterthwaite degrees of freedom (not rounded).
pub fn welch_df(s1: &SampleSummary, s2: &SampleSummary) -> Result<f64> {
    require_variance(s1, "sample 1")?;
    require_variance(s2, "sample 2")?;
    let a = s1.variance() / s1.count as f64;
    let b = s2.variance() / s2.count as f64;
    let denom = a * a / (s1.count - 1) as f64 + b * b / (s2.count - 1) as f64;
    if denom <= 0.0 {
        return Err(Error::DegenerateInput("both samples have zero variance".to_string()));
    }
    Ok((a + b) * (a + b) / denom)
}

/// Welch's t test (unequal variances).
pub fn welch_t_test(
    s1: &SampleSummary,
    s2: &SampleSummary,
    alpha: f64,
    alternative: Alternative,
) -> Result<LocationResult> {
    validate_alpha(alpha)?;
    require_variance(s1, "sample 1")?;
    require_variance(s2, "sample 2")?;

    let se = (s1.variance() / s1.count as f64 + s2.variance() / s2.count as f64).sqrt();
    require_positive_se(se)?;
    let df = welch_df(s1, s2)?;

    let diff = s1.mean - s2.mean;
    let test = evaluate(
        diff / se,
        DegreesOfFreedom::Single(df),
        &Reference::StudentT { df },
        alpha,
        alternative,
    )?;
    Ok(LocationResult { test, mean_difference: diff, standard_error: se, pooled_variance: None })
}

/// Independent two-sample t test on raw observations.
pub fn two_sample_t_test(
    sample1: &[f64],
    sample2: &[f64],
    equal_var: bool,
    alpha: f64,
    alternative: Alternative,
) -> Result<LocationResult> {
    let s1 = SampleSummary::from_sample(sample1)?;
    let s2 = SampleSummary::from_sample(sample2)?;
    if equal_var {
        pooled_t_test(&s1, &s2, alpha, alternative)
    } else {
        welch_t_test(&s1, &s2, alpha, alternative)
    }
}

/// z test for two means with known population standard deviations.
///
/// `std_dev` in each summary is the population sigma.
pub fn z_test_two_means(
    s1: &SampleSummary,
    s2: &SampleSummary,
    alpha: f64,
    alternative: Alternative,
) -> Result<LocationResult> {
    validate_alpha(alpha)?;
    require_large(s1.count, "sample 1")?;
    require_large(s2.count, "sample 2")?;

    let se = (s1.variance() / s1.count as f64 + s2.variance() / s2.count as f64).sqrt();
    require_positive_se(se)?;

    let diff = s1.mean - s2.mean;
    let test = evaluate(
        diff / se,
        DegreesOfFreedom::NotApplicable,
        &Reference::StandardNormal,
        alpha,
        alternative,
    )?;
    Ok(LocationResult { test, mean_difference: diff, standard_error: se, pooled_variance: None })
}

/// z test of a raw sample against a population with known mean and sigma.
pub fn z_test_population(
    sample: &[f64],
    population_mean: f64,
    population_std: f64,
    alpha: f64,
    alternative: Alternative,
) -> Result<LocationResult> {
    validate_alpha(alpha)?;
    if !population_mean.is_finite() {
        return Err(Error::Validation(format!(
            "population mean must be finite, got {}",
            population_mean
        )));
    }
    if !population_std.is_finite() || population_std <= 0.0 {
        return Err(Error::Validation(format!(
            "population standard deviation must be finite and > 0, got {}",
            population_std
        )));
    }
    let summary = SampleSummary::from_sample(sample)?;
    require_large(summary.count, "sample")?;

    let se = population_std / (summary.count as f64).sqrt();
    let diff = summary.mean - population_mean;
    let test = evaluate(
        diff / se,
        DegreesOfFreedom::NotApplicable,
        &Reference::StandardNormal,
        alpha,
        alternative,
    )?;
    Ok(LocationResult { test, mean_difference: diff, standard_error: se, pooled_variance: None })
}
