//! Decision engine.
//!
//! All calculators turn `(statistic, df, p-value)` into a [`TestResult`]
//! through [`finish`], which applies the single decision rule [`decide`].

use sw_core::{Alternative, Decision, DegreesOfFreedom, Error, Result, TestResult};
use sw_prob::Reference;

/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Require `0 < alpha < 1`.
pub fn validate_alpha(alpha: f64) -> Result<()> {
    if !alpha.is_finite() || alpha <= 0.0 || alpha >= 1.0 {
        return Err(Error::Validation(format!("alpha must be in (0,1), got {}", alpha)));
    }
    Ok(())
}

/// `Reject` iff `p_value < alpha`. A p-value equal to alpha fails to reject.
#[inline]
pub fn decide(p_value: f64, alpha: f64) -> Decision {
    if p_value < alpha { Decision::Reject } else { Decision::FailToReject }
}

/// p-value of `statistic` under `reference` for the given alternative.
///
/// Two-sided is `2 * sf(|s|)` for symmetric references and
/// `2 * min(cdf, sf)` otherwise; greater is `sf(s)`; less is `cdf(s)`.
pub fn tail_p_value(reference: &Reference, statistic: f64, alternative: Alternative) -> Result<f64> {
    let p = match alternative {
        Alternative::TwoSided if reference.is_symmetric() => 2.0 * reference.sf(statistic.abs())?,
        Alternative::TwoSided => {
            2.0 * reference.cdf(statistic)?.min(reference.sf(statistic)?)
        }
        Alternative::Greater => reference.sf(statistic)?,
        Alternative::Less => reference.cdf(statistic)?,
    };
    Ok(p.clamp(0.0, 1.0))
}

/// Rejection threshold of the statistic.
///
/// Two-sided `q(1 - alpha/2)`, greater `q(1 - alpha)`, less `q(alpha)`.
pub fn critical_value(reference: &Reference, alpha: f64, alternative: Alternative) -> Result<f64> {
    validate_alpha(alpha)?;
    match alternative {
        Alternative::TwoSided => reference.quantile(1.0 - alpha / 2.0),
        Alternative::Greater => reference.quantile(1.0 - alpha),
        Alternative::Less => reference.quantile(alpha),
    }
}

/// Assemble a [`TestResult`], applying [`decide`].
pub fn finish(
    statistic: f64,
    degrees_of_freedom: DegreesOfFreedom,
    p_value: f64,
    critical_value: Option<f64>,
    alpha: f64,
    alternative: Alternative,
) -> Result<TestResult> {
    validate_alpha(alpha)?;
    if !statistic.is_finite() {
        return Err(Error::Computation(format!("test statistic is not finite: {}", statistic)));
    }
    if !p_value.is_finite() || !(0.0..=1.0).contains(&p_value) {
        return Err(Error::Computation(format!("p-value outside [0,1]: {}", p_value)));
    }
    if let Some(cv) = critical_value {
        if !cv.is_finite() {
            return Err(Error::Computation(format!("critical value is not finite: {}", cv)));
        }
    }
    log::debug!("statistic={} p={} alpha={} alternative={:?}", statistic, p_value, alpha, alternative);
    Ok(TestResult {
        statistic,
        degrees_of_freedom,
        p_value,
        critical_value,
        alpha,
        alternative,
        decision: decide(p_value, alpha),
    })
}

/// Tail p-value, critical value and verdict of `statistic` under `reference`.
pub fn evaluate(
    statistic: f64,
    degrees_of_freedom: DegreesOfFreedom,
    reference: &Reference,
    alpha: f64,
    alternative: Alternative,
) -> Result<TestResult> {
    validate_alpha(alpha)?;
    let p_value = tail_p_value(reference, statistic, alternative)?;
    let cv = critical_value(reference, alpha, alternative)?;
    finish(statistic, degrees_of_freedom, p_value, Some(cv), alpha, alternative)
}
