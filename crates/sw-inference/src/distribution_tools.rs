//! Normal, binomial and Poisson calculators.

use serde::{Deserialize, Serialize};
use sw_core::{Error, Result};
use sw_prob::{binomial, normal, poisson};

fn validate_sigma(sigma: f64) -> Result<()> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(Error::Validation(format!("sigma must be positive, got {}", sigma)));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Normal
// ---------------------------------------------------------------------------

/// `P(X <= x)` and `P(X > x)` for `X ~ N(mu, sigma^2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalProbability {
    /// `(x - mu) / sigma`.
    pub z: f64,
    /// `P(X <= x)`.
    pub p_at_most: f64,
    /// `P(X > x)`.
    pub p_greater: f64,
}

/// Normal probabilities at `x`.
pub fn normal_probability(mu: f64, sigma: f64, x: f64) -> Result<NormalProbability> {
    validate_sigma(sigma)?;
    if !x.is_finite() || !mu.is_finite() {
        return Err(Error::Validation("mu and x must be finite".to_string()));
    }
    let z = (x - mu) / sigma;
    Ok(NormalProbability { z, p_at_most: normal::standard_cdf(z), p_greater: normal::standard_sf(z) })
}

/// Value `x` with `P(X <= x) = p`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalQuantile {
    /// Standard normal quantile.
    pub z: f64,
    /// `mu + z sigma`.
    pub x: f64,
}

/// Inverse normal CDF, `p` in `(0, 1)`.
pub fn normal_quantile(mu: f64, sigma: f64, p: f64) -> Result<NormalQuantile> {
    validate_sigma(sigma)?;
    let z = normal::standard_quantile(p)?;
    Ok(NormalQuantile { z, x: mu + z * sigma })
}

/// Normal approximation of a discrete point probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContinuityCorrection {
    /// z of `x - 0.5`.
    pub z_low: f64,
    /// z of `x + 0.5`.
    pub z_high: f64,
    /// `P(X < x)`.
    pub p_below: f64,
    /// `P(X <= x)`.
    pub p_at_most: f64,
    /// `P(X = x)`.
    pub p_exact: f64,
}

/// `P(X = x)` approximated on `[x - 0.5, x + 0.5]`.
pub fn continuity_correction(mu: f64, sigma: f64, x: f64) -> Result<ContinuityCorrection> {
    validate_sigma(sigma)?;
    let z_low = (x - 0.5 - mu) / sigma;
    let z_high = (x + 0.5 - mu) / sigma;
    let p_below = normal::standard_cdf(z_low);
    let p_at_most = normal::standard_cdf(z_high);
    Ok(ContinuityCorrection { z_low, z_high, p_below, p_at_most, p_exact: p_at_most - p_below })
}

// ---------------------------------------------------------------------------
// Discrete
// ---------------------------------------------------------------------------

/// Which discrete probability to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscreteQuery {
    /// `P(X = x)`.
    #[default]
    Exactly,
    /// `P(X <= x)`.
    AtMost,
    /// `P(X >= x)`.
    AtLeast,
}

/// Probability mass at one support point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PmfPoint {
    /// Support value.
    pub k: u64,
    /// `P(X = k)`.
    pub probability: f64,
}

/// Binomial probability of `x` under `query`, `X ~ Bin(n, p)`.
pub fn binomial_probability(n: u64, p: f64, x: u64, query: DiscreteQuery) -> Result<f64> {
    if x > n {
        return Err(Error::Validation(format!("x must be <= n, got x={} n={}", x, n)));
    }
    match query {
        DiscreteQuery::Exactly => binomial::pmf(x, n, p),
        DiscreteQuery::AtMost => binomial::cdf(x, n, p),
        DiscreteQuery::AtLeast => binomial::sf_inclusive(x, n, p),
    }
}

/// Most rows a pmf table may hold.
pub const MAX_TABLE_ROWS: u64 = 1_000_000;

fn check_table_rows(upper: u64) -> Result<()> {
    if upper >= MAX_TABLE_ROWS {
        return Err(Error::Validation(format!(
            "pmf table over 0..={} exceeds {} rows",
            upper, MAX_TABLE_ROWS
        )));
    }
    Ok(())
}

/// Full binomial pmf over `0..=n`.
pub fn binomial_pmf_table(n: u64, p: f64) -> Result<Vec<PmfPoint>> {
    check_table_rows(n)?;
    (0..=n).map(|k| Ok(PmfPoint { k, probability: binomial::pmf(k, n, p)? })).collect()
}

/// Poisson probability of `x` under `query`, `X ~ Pois(lambda)`.
pub fn poisson_probability(lambda: f64, x: u64, query: DiscreteQuery) -> Result<f64> {
    match query {
        DiscreteQuery::Exactly => poisson::pmf(x, lambda),
        DiscreteQuery::AtMost => poisson::cdf(x, lambda),
        DiscreteQuery::AtLeast => poisson::sf_inclusive(x, lambda),
    }
}

/// Poisson pmf over `0..=floor(lambda + 4 sqrt(lambda))`.
pub fn poisson_pmf_table(lambda: f64) -> Result<Vec<PmfPoint>> {
    if !lambda.is_finite() || lambda <= 0.0 {
        return Err(Error::Validation(format!("lambda must be positive, got {}", lambda)));
    }
    // Saturating cast; lambda is finite here.
    let upper = (lambda + 4.0 * lambda.sqrt()).floor() as u64;
    check_table_rows(upper)?;
    (0..=upper).map(|k| Ok(PmfPoint { k, probability: poisson::pmf(k, lambda)? })).collect()
}
