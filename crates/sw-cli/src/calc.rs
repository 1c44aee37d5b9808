//! `statwb calc`: standalone distribution, probability and interval calculators.

use serde::{Deserialize, Serialize};
use sw_core::{ProportionSample, Result};
use sw_inference::descriptive::{Descriptives, describe};
use sw_inference::distribution_tools::{
    self, ContinuityCorrection, DiscreteQuery, NormalProbability, NormalQuantile, PmfPoint,
};
use sw_inference::intervals::{self, ConfidenceInterval};
use sw_inference::outliers::{OutlierMethod, OutlierReport, detect_outliers};
use sw_inference::probability::{self, BayesResult, ClassicalProbability};
use sw_inference::sampling::{
    self, ProportionQuery, SamplingReport, Tail, TailProbability,
};

fn default_confidence() -> f64 {
    0.95
}

fn default_confidence_percent() -> f64 {
    95.0
}

/// One calculator invocation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "calc", rename_all = "snake_case")]
pub enum CalcRequest {
    NormalProbability { mu: f64, sigma: f64, x: f64 },
    NormalQuantile { mu: f64, sigma: f64, p: f64 },
    ContinuityCorrection { mu: f64, sigma: f64, x: f64 },
    Binomial {
        n: u64,
        p: f64,
        x: u64,
        #[serde(default)]
        query: DiscreteQuery,
    },
    BinomialTable { n: u64, p: f64 },
    Poisson {
        lambda: f64,
        x: u64,
        #[serde(default)]
        query: DiscreteQuery,
    },
    PoissonTable { lambda: f64 },
    Clt { mu: f64, sigma: f64, n: usize, x_bar: f64, tail: Tail },
    ProportionSampling { x: u64, n: u64, p: f64, query: ProportionQuery },
    MeanIntervalKnownSigma {
        mean: f64,
        sigma: f64,
        n: usize,
        #[serde(default = "default_confidence")]
        confidence: f64,
    },
    MeanInterval {
        mean: f64,
        std_dev: f64,
        n: usize,
        #[serde(default = "default_confidence")]
        confidence: f64,
    },
    ProportionInterval {
        sample: ProportionSample,
        #[serde(default = "default_confidence")]
        confidence: f64,
    },
    Bayes { p_a: f64, p_b_given_a: f64, p_b_given_not_a: f64 },
    Conditional { p_joint: f64, p_given: f64 },
    Permutations { n: u64, r: u64 },
    Combinations { n: u64, r: u64 },
    SampleSpace { n: u64, k: u32 },
    /// Probability that `dice` fair dice with `faces` faces sum to `sum`.
    DiceSum { dice: u32, faces: u32, sum: u32 },
    Describe { data: Vec<f64> },
    Outliers {
        data: Vec<f64>,
        #[serde(default)]
        detection: OutlierMethod,
    },
    Sampling {
        data: Vec<f64>,
        #[serde(default = "default_confidence_percent")]
        confidence_percent: f64,
    },
}

/// Calculator output, tagged by shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "output", rename_all = "snake_case")]
pub enum CalcOutcome {
    NormalProbability(NormalProbability),
    NormalQuantile(NormalQuantile),
    ContinuityCorrection(ContinuityCorrection),
    Probability { probability: f64 },
    Table { points: Vec<PmfPoint> },
    Tail(TailProbability),
    Interval(ConfidenceInterval),
    Bayes(BayesResult),
    Count { count: u128 },
    Classical(ClassicalProbability<Vec<u32>>),
    Descriptives(Descriptives),
    Outliers(OutlierReport),
    Sampling(SamplingReport),
}

impl CalcRequest {
    /// Evaluate the calculator.
    pub fn run(&self) -> Result<CalcOutcome> {
        Ok(match self {
            CalcRequest::NormalProbability { mu, sigma, x } => {
                CalcOutcome::NormalProbability(distribution_tools::normal_probability(*mu, *sigma, *x)?)
            }
            CalcRequest::NormalQuantile { mu, sigma, p } => {
                CalcOutcome::NormalQuantile(distribution_tools::normal_quantile(*mu, *sigma, *p)?)
            }
            CalcRequest::ContinuityCorrection { mu, sigma, x } => CalcOutcome::ContinuityCorrection(
                distribution_tools::continuity_correction(*mu, *sigma, *x)?,
            ),
            CalcRequest::Binomial { n, p, x, query } => CalcOutcome::Probability {
                probability: distribution_tools::binomial_probability(*n, *p, *x, *query)?,
            },
            CalcRequest::BinomialTable { n, p } => {
                CalcOutcome::Table { points: distribution_tools::binomial_pmf_table(*n, *p)? }
            }
            CalcRequest::Poisson { lambda, x, query } => CalcOutcome::Probability {
                probability: distribution_tools::poisson_probability(*lambda, *x, *query)?,
            },
            CalcRequest::PoissonTable { lambda } => {
                CalcOutcome::Table { points: distribution_tools::poisson_pmf_table(*lambda)? }
            }
            CalcRequest::Clt { mu, sigma, n, x_bar, tail } => {
                CalcOutcome::Tail(sampling::clt_probability(*mu, *sigma, *n, *x_bar, *tail)?)
            }
            CalcRequest::ProportionSampling { x, n, p, query } => {
                CalcOutcome::Tail(sampling::proportion_sampling(*x, *n, *p, *query)?)
            }
            CalcRequest::MeanIntervalKnownSigma { mean, sigma, n, confidence } => {
                CalcOutcome::Interval(intervals::mean_known_sigma(*mean, *sigma, *n, *confidence)?)
            }
            CalcRequest::MeanInterval { mean, std_dev, n, confidence } => {
                CalcOutcome::Interval(intervals::mean_unknown_sigma(*mean, *std_dev, *n, *confidence)?)
            }
            CalcRequest::ProportionInterval { sample, confidence } => {
                CalcOutcome::Interval(intervals::proportion(sample, *confidence)?)
            }
            CalcRequest::Bayes { p_a, p_b_given_a, p_b_given_not_a } => {
                CalcOutcome::Bayes(probability::bayes(*p_a, *p_b_given_a, *p_b_given_not_a)?)
            }
            CalcRequest::Conditional { p_joint, p_given } => {
                CalcOutcome::Probability { probability: probability::conditional(*p_joint, *p_given)? }
            }
            CalcRequest::Permutations { n, r } => {
                CalcOutcome::Count { count: probability::permutations(*n, *r)? }
            }
            CalcRequest::Combinations { n, r } => {
                CalcOutcome::Count { count: probability::combinations(*n, *r)? }
            }
            CalcRequest::SampleSpace { n, k } => {
                CalcOutcome::Count { count: probability::sample_space_size(*n, *k)? }
            }
            CalcRequest::DiceSum { dice, faces, sum } => {
                let space = probability::dice_space(*dice, *faces)?;
                CalcOutcome::Classical(probability::classical(&space, |o| {
                    o.iter().sum::<u32>() == *sum
                })?)
            }
            CalcRequest::Describe { data } => CalcOutcome::Descriptives(describe(data)?),
            CalcRequest::Outliers { data, detection } => {
                CalcOutcome::Outliers(detect_outliers(data, *detection)?)
            }
            CalcRequest::Sampling { data, confidence_percent } => {
                CalcOutcome::Sampling(sampling::sampling_analysis(data, *confidence_percent)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> CalcRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_binomial_query_defaults_to_exactly() {
        let req = parse(r#"{"calc": "binomial", "n": 10, "p": 0.5, "x": 5}"#);
        match req.run().unwrap() {
            CalcOutcome::Probability { probability } => {
                assert!((probability - 252.0 / 1024.0).abs() < 1e-12)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dice_sum_seven() {
        let req = parse(r#"{"calc": "dice_sum", "dice": 2, "faces": 6, "sum": 7}"#);
        match req.run().unwrap() {
            CalcOutcome::Classical(c) => {
                assert_eq!(c.total, 36);
                assert_eq!(c.favorable.len(), 6);
                assert!((c.probability - 1.0 / 6.0).abs() < 1e-12);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_counts_serialize_as_integers() {
        let out = parse(r#"{"calc": "combinations", "n": 52, "r": 5}"#).run().unwrap();
        let text = serde_json::to_string(&out).unwrap();
        assert_eq!(text, r#"{"output":"count","count":2598960}"#);
    }

    #[test]
    fn test_calculator_errors_propagate() {
        let req = parse(r#"{"calc": "bayes", "p_a": 0.5, "p_b_given_a": 0.0, "p_b_given_not_a": 0.0}"#);
        assert!(matches!(req.run(), Err(sw_core::Error::DegenerateInput(_))));
    }
}
