//! Closed enumeration of hypothesis tests.
//!
//! A [`TestRequest`] carries the inputs of exactly one calculator. It is the
//! document format accepted by `statwb test`:
//!
//! ```json
//! {"test": "one_proportion", "sample": {"successes": 45, "trials": 100}, "p0": 0.5}
//! ```
//!
//! `alpha` defaults to 0.05 and `alternative` to two-sided.

use serde::{Deserialize, Serialize};
use sw_core::{
    Alternative, ContingencyTable, GroupedSample, ProportionSample, Result, SampleSummary,
    TestResult, TwoFactorSample,
};

use crate::anova::{OneWayAnovaResult, TwoWayAnovaResult, one_way_anova, two_way_anova};
use crate::chi_square::{ChiSquareResult, chi_square_independence};
use crate::correlation::{CorrelationMethod, CorrelationResult, correlate, infer_kind, select_method};
use crate::decision::DEFAULT_ALPHA;
use crate::location::{
    LocationResult, pooled_t_test, two_sample_t_test, welch_t_test, z_test_population,
    z_test_two_means,
};
use crate::proportion::{
    FisherResult, OneProportionResult, TwoProportionResult, fisher_exact, one_proportion_z_test,
    two_proportion_z_test,
};
use crate::tukey::{PosthocResult, posthoc_tukey};

pub(crate) fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn default_true() -> bool {
    true
}

fn default_factor_a() -> String {
    "A".to_string()
}

fn default_factor_b() -> String {
    "B".to_string()
}

/// Test family, without inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// Equal-variance two-sample t test from summaries.
    PooledT,
    /// Welch t test from summaries.
    WelchT,
    /// Two-sample t test from raw samples.
    TwoSampleT,
    /// z test for two means with known sigmas.
    ZTwoMeans,
    /// z test of a raw sample against a population mean.
    ZPopulation,
    /// One-sample proportion z test.
    OneProportion,
    /// Pooled two-proportion z test.
    TwoProportion,
    /// Fisher's exact test on a 2x2 table.
    FisherExact,
    /// One-way ANOVA.
    OneWayAnova,
    /// Two-way ANOVA with interaction.
    TwoWayAnova,
    /// One-way ANOVA followed by Tukey HSD when significant.
    TukeyHsd,
    /// Chi-square test of independence.
    ChiSquare,
    /// Correlation significance.
    Correlation,
}

/// Inputs for one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum TestRequest {
    /// See [`pooled_t_test`].
    PooledT {
        /// First sample.
        sample1: SampleSummary,
        /// Second sample.
        sample2: SampleSummary,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
        /// Alternative hypothesis.
        #[serde(default)]
        alternative: Alternative,
    },
    /// See [`welch_t_test`].
    WelchT {
        /// First sample.
        sample1: SampleSummary,
        /// Second sample.
        sample2: SampleSummary,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
        /// Alternative hypothesis.
        #[serde(default)]
        alternative: Alternative,
    },
    /// See [`two_sample_t_test`].
    TwoSampleT {
        /// First raw sample.
        sample1: Vec<f64>,
        /// Second raw sample.
        sample2: Vec<f64>,
        /// Pooled (true) or Welch (false).
        #[serde(default = "default_true")]
        equal_var: bool,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
        /// Alternative hypothesis.
        #[serde(default)]
        alternative: Alternative,
    },
    /// See [`z_test_two_means`]; `std_dev` holds the known sigma.
    ZTwoMeans {
        /// First sample.
        sample1: SampleSummary,
        /// Second sample.
        sample2: SampleSummary,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
        /// Alternative hypothesis.
        #[serde(default)]
        alternative: Alternative,
    },
    /// See [`z_test_population`].
    ZPopulation {
        /// Raw sample.
        sample: Vec<f64>,
        /// Hypothesised population mean.
        population_mean: f64,
        /// Known population standard deviation.
        population_std: f64,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
        /// Alternative hypothesis.
        #[serde(default)]
        alternative: Alternative,
    },
    /// See [`one_proportion_z_test`].
    OneProportion {
        /// Observed successes and trials.
        sample: ProportionSample,
        /// Hypothesised proportion.
        p0: f64,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
        /// Alternative hypothesis.
        #[serde(default)]
        alternative: Alternative,
    },
    /// See [`two_proportion_z_test`].
    TwoProportion {
        /// First group.
        sample1: ProportionSample,
        /// Second group.
        sample2: ProportionSample,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
        /// Alternative hypothesis.
        #[serde(default)]
        alternative: Alternative,
    },
    /// See [`fisher_exact`].
    FisherExact {
        /// 2x2 table.
        table: ContingencyTable,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
        /// Alternative hypothesis.
        #[serde(default)]
        alternative: Alternative,
    },
    /// See [`one_way_anova`].
    OneWayAnova {
        /// `[[label, [values...]], ...]`
        groups: GroupedSample,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    /// See [`two_way_anova`].
    TwoWayAnova {
        /// `[{"a": .., "b": .., "value": ..}, ...]`
        observations: TwoFactorSample,
        /// Name of factor A in the effect table.
        #[serde(default = "default_factor_a")]
        factor_a: String,
        /// Name of factor B in the effect table.
        #[serde(default = "default_factor_b")]
        factor_b: String,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    /// See [`posthoc_tukey`].
    TukeyHsd {
        /// Groups.
        groups: GroupedSample,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    /// See [`chi_square_independence`].
    ChiSquare {
        /// Contingency table.
        table: ContingencyTable,
        /// Apply Yates' correction to 2x2 tables.
        #[serde(default)]
        continuity_correction: bool,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    /// See [`correlate`]. Without `method`, the coefficient follows the
    /// variable kinds inferred from the values.
    Correlation {
        /// First variable.
        x: Vec<f64>,
        /// Second variable.
        y: Vec<f64>,
        /// Coefficient to use.
        #[serde(default)]
        method: Option<CorrelationMethod>,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
}

/// Result of [`TestRequest::run`], tagged with the result family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestOutcome {
    /// t or z test on means.
    Location(LocationResult),
    /// One-sample proportion test.
    OneProportion(OneProportionResult),
    /// Two-sample proportion test.
    TwoProportion(TwoProportionResult),
    /// Fisher's exact test.
    Fisher(FisherResult),
    /// One-way ANOVA.
    OneWayAnova(OneWayAnovaResult),
    /// Two-way ANOVA effect table.
    TwoWayAnova(TwoWayAnovaResult),
    /// ANOVA with optional Tukey HSD.
    Posthoc(PosthocResult),
    /// Chi-square independence.
    ChiSquare(ChiSquareResult),
    /// Correlation.
    Correlation(CorrelationResult),
}

impl TestOutcome {
    /// The single headline test, if the outcome has one.
    pub fn primary(&self) -> Option<&TestResult> {
        match self {
            TestOutcome::Location(r) => Some(&r.test),
            TestOutcome::OneProportion(r) => Some(&r.test),
            TestOutcome::TwoProportion(r) => Some(&r.test),
            TestOutcome::Fisher(r) => Some(&r.test),
            TestOutcome::OneWayAnova(r) => Some(&r.test),
            TestOutcome::TwoWayAnova(_) => None,
            TestOutcome::Posthoc(r) => Some(&r.anova.test),
            TestOutcome::ChiSquare(r) => Some(&r.test),
            TestOutcome::Correlation(r) => Some(&r.test),
        }
    }
}

impl TestRequest {
    /// The test family.
    pub fn kind(&self) -> TestKind {
        match self {
            TestRequest::PooledT { .. } => TestKind::PooledT,
            TestRequest::WelchT { .. } => TestKind::WelchT,
            TestRequest::TwoSampleT { .. } => TestKind::TwoSampleT,
            TestRequest::ZTwoMeans { .. } => TestKind::ZTwoMeans,
            TestRequest::ZPopulation { .. } => TestKind::ZPopulation,
            TestRequest::OneProportion { .. } => TestKind::OneProportion,
            TestRequest::TwoProportion { .. } => TestKind::TwoProportion,
            TestRequest::FisherExact { .. } => TestKind::FisherExact,
            TestRequest::OneWayAnova { .. } => TestKind::OneWayAnova,
            TestRequest::TwoWayAnova { .. } => TestKind::TwoWayAnova,
            TestRequest::TukeyHsd { .. } => TestKind::TukeyHsd,
            TestRequest::ChiSquare { .. } => TestKind::ChiSquare,
            TestRequest::Correlation { .. } => TestKind::Correlation,
        }
    }

    /// Replace the significance level. Validation happens in [`TestRequest::run`].
    pub fn set_alpha(&mut self, value: f64) {
        let alpha = match self {
            TestRequest::PooledT { alpha, .. }
            | TestRequest::WelchT { alpha, .. }
            | TestRequest::TwoSampleT { alpha, .. }
            | TestRequest::ZTwoMeans { alpha, .. }
            | TestRequest::ZPopulation { alpha, .. }
            | TestRequest::OneProportion { alpha, .. }
            | TestRequest::TwoProportion { alpha, .. }
            | TestRequest::FisherExact { alpha, .. }
            | TestRequest::OneWayAnova { alpha, .. }
            | TestRequest::TwoWayAnova { alpha, .. }
            | TestRequest::TukeyHsd { alpha, .. }
            | TestRequest::ChiSquare { alpha, .. }
            | TestRequest::Correlation { alpha, .. } => alpha,
        };
        *alpha = value;
    }

    /// Dispatch to the calculator of this kind.
    pub fn run(&self) -> Result<TestOutcome> {
        log::debug!("running {:?}", self.kind());
        Ok(match self {
            TestRequest::PooledT { sample1, sample2, alpha, alternative } => {
                TestOutcome::Location(pooled_t_test(sample1, sample2, *alpha, *alternative)?)
            }
            TestRequest::WelchT { sample1, sample2, alpha, alternative } => {
                TestOutcome::Location(welch_t_test(sample1, sample2, *alpha, *alternative)?)
            }
            TestRequest::TwoSampleT { sample1, sample2, equal_var, alpha, alternative } => {
                TestOutcome::Location(two_sample_t_test(
                    sample1,
                    sample2,
                    *equal_var,
                    *alpha,
                    *alternative,
                )?)
            }
            TestRequest::ZTwoMeans { sample1, sample2, alpha, alternative } => {
                TestOutcome::Location(z_test_two_means(sample1, sample2, *alpha, *alternative)?)
            }
            TestRequest::ZPopulation { sample, population_mean, population_std, alpha, alternative } => {
                TestOutcome::Location(z_test_population(
                    sample,
                    *population_mean,
                    *population_std,
                    *alpha,
                    *alternative,
                )?)
            }
            TestRequest::OneProportion { sample, p0, alpha, alternative } => {
                TestOutcome::OneProportion(one_proportion_z_test(sample, *p0, *alpha, *alternative)?)
            }
            TestRequest::TwoProportion { sample1, sample2, alpha, alternative } => {
                TestOutcome::TwoProportion(two_proportion_z_test(sample1, sample2, *alpha, *alternative)?)
            }
            TestRequest::FisherExact { table, alpha, alternative } => {
                TestOutcome::Fisher(fisher_exact(table, *alpha, *alternative)?)
            }
            TestRequest::OneWayAnova { groups, alpha } => {
                TestOutcome::OneWayAnova(one_way_anova(groups, *alpha)?)
            }
            TestRequest::TwoWayAnova { observations, factor_a, factor_b, alpha } => {
                TestOutcome::TwoWayAnova(two_way_anova(observations, factor_a, factor_b, *alpha)?)
            }
            TestRequest::TukeyHsd { groups, alpha } => {
                TestOutcome::Posthoc(posthoc_tukey(groups, *alpha)?)
            }
            TestRequest::ChiSquare { table, continuity_correction, alpha } => {
                TestOutcome::ChiSquare(chi_square_independence(table, *alpha, *continuity_correction)?)
            }
            TestRequest::Correlation { x, y, method, alpha } => {
                let method = method.unwrap_or_else(|| select_method(infer_kind(x), infer_kind(y)));
                TestOutcome::Correlation(correlate(x, y, method, *alpha)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use sw_core::Decision;

    fn parse(json: &str) -> TestRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_one_proportion_request_defaults() {
        let req = parse(r#"{"test":"one_proportion","sample":{"successes":45,"trials":100},"p0":0.5}"#);
        assert_eq!(req.kind(), TestKind::OneProportion);
        let TestRequest::OneProportion { alpha, alternative, .. } = &req else {
            panic!("wrong variant");
        };
        assert_eq!(*alpha, 0.05);
        assert_eq!(*alternative, Alternative::TwoSided);

        let out = req.run().unwrap();
        let test = out.primary().unwrap();
        assert_abs_diff_eq!(test.statistic, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(test.p_value, 0.31731050786291415, epsilon = 1e-9);
        assert_eq!(test.decision, Decision::FailToReject);
    }

    #[test]
    fn test_set_alpha_overrides_request() {
        let mut req = parse(r#"{"test":"one_proportion","sample":{"successes":45,"trials":100},"p0":0.5}"#);
        req.set_alpha(0.5);
        let out = req.run().unwrap();
        let test = out.primary().unwrap();
        assert_eq!(test.alpha, 0.5);
        assert_eq!(test.decision, Decision::Reject);

        req.set_alpha(1.5);
        assert!(matches!(req.run(), Err(sw_core::Error::Validation(_))));
    }

    #[test]
    fn test_anova_request() {
        let req = parse(r#"{"test":"one_way_anova","groups":[["a",[1,2,3]],["b",[4,5,6]],["c",[7,8,9]]]}"#);
        let TestOutcome::OneWayAnova(r) = req.run().unwrap() else { panic!("wrong outcome") };
        assert_abs_diff_eq!(r.test.statistic, 27.0, epsilon = 1e-9);
        assert_eq!(r.test.decision, Decision::Reject);
    }

    #[test]
    fn test_tukey_request_runs_posthoc() {
        let req = parse(r#"{"test":"tukey_hsd","groups":[["a",[1,2,3]],["b",[4,5,6]],["c",[7,8,9]]],"alpha":0.01}"#);
        let TestOutcome::Posthoc(r) = req.run().unwrap() else { panic!("wrong outcome") };
        assert!(r.tukey.is_some());
    }

    #[test]
    fn test_fisher_and_chi_square_requests() {
        let fisher = parse(r#"{"test":"fisher_exact","table":{"counts":[[8,2],[1,5]]}}"#);
        assert_abs_diff_eq!(fisher.run().unwrap().primary().unwrap().p_value, 400.0 / 11440.0, epsilon = 1e-12);

        let chi = parse(r#"{"test":"chi_square","table":{"counts":[[10,20],[30,40]]},"continuity_correction":true}"#);
        assert_abs_diff_eq!(chi.run().unwrap().primary().unwrap().statistic, 0.44642857142857145, epsilon = 1e-12);
    }

    #[test]
    fn test_correlation_request_selects_method() {
        let req = parse(r#"{"test":"correlation","x":[0,0,1,0,1,1,1,0],"y":[2.1,3.3,4.0,2.8,5.1,4.4,4.9,3.0]}"#);
        let TestOutcome::Correlation(r) = req.run().unwrap() else { panic!("wrong outcome") };
        assert_eq!(r.method, CorrelationMethod::PointBiserial);

        let req = parse(r#"{"test":"correlation","x":[1,2,3,4,5,6,7,8],"y":[2,1,4,3,7,8,6,9],"method":"kendall"}"#);
        let TestOutcome::Correlation(r) = req.run().unwrap() else { panic!("wrong outcome") };
        assert_eq!(r.method, CorrelationMethod::Kendall);
    }

    #[test]
    fn test_invalid_requests() {
        assert!(serde_json::from_str::<TestRequest>(r#"{"test":"no_such_test"}"#).is_err());
        assert!(
            serde_json::from_str::<TestRequest>(r#"{"test":"one_proportion","sample":{"successes":5,"trials":3},"p0":0.5}"#)
                .is_err()
        );
        let bad_alpha = parse(r#"{"test":"fisher_exact","table":{"counts":[[8,2],[1,5]]},"alpha":1.5}"#);
        assert!(bad_alpha.run().is_err());
    }

    #[test]
    fn test_outcome_serializes_with_kind_tag() {
        let req = parse(r#"{"test":"pooled_t","sample1":{"mean":5,"std_dev":1,"count":10},"sample2":{"mean":6,"std_dev":1.5,"count":12}}"#);
        let json = serde_json::to_value(req.run().unwrap()).unwrap();
        assert_eq!(json["kind"], "location");
        assert!(json["test"]["p_value"].is_number());
    }
}
