//! Sampling statistics and sampling-distribution probabilities.

use serde::{Deserialize, Serialize};
use sw_core::{Error, Result, SampleSummary};
use sw_prob::normal;

use crate::intervals::{self, ConfidenceInterval};

/// Summary of a sample with a z interval and 3-SE control limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingReport {
    /// Sample size.
    pub n: usize,
    /// Sample mean.
    pub mean: f64,
    /// Sample standard deviation (ddof = 1).
    pub std_dev: f64,
    /// z interval of the mean.
    pub interval: ConfidenceInterval,
    /// Coefficient of variation in percent, `None` when the mean is zero.
    pub coefficient_of_variation: Option<f64>,
    /// `mean + 3 SE`.
    pub upper_control_limit: f64,
    /// `mean - 3 SE`.
    pub lower_control_limit: f64,
}

/// Sampling statistics at `confidence_percent` in `[50, 100)`.
pub fn sampling_analysis(data: &[f64], confidence_percent: f64) -> Result<SamplingReport> {
    if !(50.0..100.0).contains(&confidence_percent) {
        return Err(Error::Validation(format!(
            "confidence level must be in [50, 100) percent, got {}",
            confidence_percent
        )));
    }
    let summary = SampleSummary::from_sample(data)?;
    if summary.count < 2 {
        return Err(Error::InsufficientData(
            "sampling statistics need at least 2 observations".to_string(),
        ));
    }
    if summary.std_dev == 0.0 {
        return Err(Error::DegenerateInput("sample standard deviation is zero".to_string()));
    }
    let interval = intervals::mean_known_sigma(
        summary.mean,
        summary.std_dev,
        summary.count,
        confidence_percent / 100.0,
    )?;
    let se = interval.standard_error;
    let coefficient_of_variation =
        (summary.mean != 0.0).then(|| summary.std_dev / summary.mean * 100.0);

    Ok(SamplingReport {
        n: summary.count,
        mean: summary.mean,
        std_dev: summary.std_dev,
        interval,
        coefficient_of_variation,
        upper_control_limit: summary.mean + 3.0 * se,
        lower_control_limit: summary.mean - 3.0 * se,
    })
}

/// Direction of a one-sided probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tail {
    /// `P(X <= x)`.
    AtMost,
    /// `P(X > x)`.
    Greater,
}

/// z score with the probability for the requested tail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailProbability {
    /// Standard error of the sampling distribution.
    pub standard_error: f64,
    /// z score; the lower z of a range query.
    pub z: f64,
    /// Upper z of a range query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_upper: Option<f64>,
    /// The probability.
    pub probability: f64,
}

/// Central limit theorem: probability of a sample mean under `N(mu, sigma^2/n)`.
pub fn clt_probability(mu: f64, sigma: f64, n: usize, x_bar: f64, tail: Tail) -> Result<TailProbability> {
    if !mu.is_finite() || !x_bar.is_finite() {
        return Err(Error::Validation("mean values must be finite".to_string()));
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(Error::Validation(format!("sigma must be positive, got {}", sigma)));
    }
    if n == 0 {
        return Err(Error::InsufficientData("sample size must be at least 1".to_string()));
    }
    let se = sigma / (n as f64).sqrt();
    let z = (x_bar - mu) / se;
    let probability = match tail {
        Tail::AtMost => normal::standard_cdf(z),
        Tail::Greater => normal::standard_sf(z),
    };
    Ok(TailProbability { standard_error: se, z, z_upper: None, probability })
}

/// Query on the sampling distribution of a proportion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum ProportionQuery {
    /// `P(p_hat <= x/n)`.
    AtMost,
    /// `P(p_hat > x/n)`.
    Greater,
    /// `P(a < p_hat < b)`.
    Between {
        /// Lower proportion.
        a: f64,
        /// Upper proportion.
        b: f64,
    },
}

/// Probability for the sample proportion `x / n` under population proportion `p`.
///
/// Requires `n p >= 5` and `n (1 - p) >= 5`.
pub fn proportion_sampling(x: u64, n: u64, p: f64, query: ProportionQuery) -> Result<TailProbability> {
    if n == 0 || x > n {
        return Err(Error::Validation(format!("need 0 <= x <= n and n >= 1, got x={} n={}", x, n)));
    }
    if !(p > 0.0 && p < 1.0) {
        return Err(Error::Validation(format!("population proportion must be in (0,1), got {}", p)));
    }
    let nf = n as f64;
    if nf * p < 5.0 || nf * (1.0 - p) < 5.0 {
        return Err(Error::InsufficientData(format!(
            "normal approximation needs nP >= 5 and n(1-P) >= 5, got {:.3} and {:.3}",
            nf * p,
            nf * (1.0 - p)
        )));
    }
    let se = (p * (1.0 - p) / nf).sqrt();
    match query {
        ProportionQuery::AtMost | ProportionQuery::Greater => {
            let z = (x as f64 / nf - p) / se;
            let probability = if query == ProportionQuery::AtMost {
                normal::standard_cdf(z)
            } else {
                normal::standard_sf(z)
            };
            Ok(TailProbability { standard_error: se, z, z_upper: None, probability })
        }
        ProportionQuery::Between { a, b } => {
            if !(0.0..=1.0).contains(&a) || !(0.0..=1.0).contains(&b) || a > b {
                return Err(Error::Validation(format!(
                    "range bounds must satisfy 0 <= a <= b <= 1, got a={} b={}",
                    a, b
                )));
            }
            let za = (a - p) / se;
            let zb = (b - p) / se;
            let probability = (normal::standard_cdf(zb) - normal::standard_cdf(za)).max(0.0);
            Ok(TailProbability { standard_error: se, z: za, z_upper: Some(zb), probability })
        }
    }
}
