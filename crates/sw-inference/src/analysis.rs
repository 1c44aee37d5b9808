//! Dataset-driven analyses.
//!
//! A [`DatasetRequest`] names the columns an analysis works on; [`DatasetRequest::run`]
//! reduces the [`Dataset`] to the calculator inputs (dropping missing cells
//! row-wise over the named columns) and calls the calculator.

use serde::{Deserialize, Serialize};
use sw_core::{Alternative, ColumnData, Dataset, Error, Result, SampleSummary};

use crate::anova::{one_way_anova, two_way_anova};
use crate::chi_square::chi_square_independence;
use crate::correlation::{
    CorrelationMatrix, CorrelationMethod, align_pairs, correlate, correlation_matrix, select_method,
};
use crate::descriptive::{Descriptives, describe};
use crate::encoding::{LabelEncoded, label_encode, label_encode_columns, one_hot_encode};
use crate::intervals::{self, ConfidenceInterval};
use crate::kind::{TestOutcome, default_alpha};
use crate::location::{two_sample_t_test, z_test_population};
use crate::outliers::{OutlierMethod, OutlierReport, detect_outliers};
use crate::proportion::{fisher_exact, one_proportion_z_test, two_proportion_z_test};
use crate::regression::{
    LinearRegressionReport, LogisticRegressionReport, RegressionConfig, linear_regression,
    logistic_regression,
};
use crate::sampling::{SamplingReport, sampling_analysis};
use crate::tukey::posthoc_tukey;

fn default_true() -> bool {
    true
}

fn default_confidence() -> f64 {
    0.95
}

fn default_confidence_percent() -> f64 {
    95.0
}

fn default_matrix_method() -> CorrelationMethod {
    CorrelationMethod::Pearson
}

/// An analysis over named dataset columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "analysis", rename_all = "snake_case")]
pub enum DatasetRequest {
    /// Independent two-sample t test on two numeric columns.
    TTest {
        /// First sample column.
        column1: String,
        /// Second sample column.
        column2: String,
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
    /// z test of a numeric column against a population mean.
    ZTest {
        /// Sample column.
        column: String,
        /// Hypothesised mean.
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
    /// One-way ANOVA of `value` by `group`.
    OneWayAnova {
        /// Grouping column.
        group: String,
        /// Numeric response.
        value: String,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    /// Two-way ANOVA of `value` by two factors.
    TwoWayAnova {
        /// First factor column.
        factor_a: String,
        /// Second factor column.
        factor_b: String,
        /// Numeric response.
        value: String,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    /// One-way ANOVA, then Tukey HSD when significant.
    Tukey {
        /// Grouping column.
        group: String,
        /// Numeric response.
        value: String,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    /// One-proportion z test on a 0/1 column.
    OneProportion {
        /// 0/1 outcome column.
        outcome: String,
        /// Hypothesised proportion.
        p0: f64,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
        /// Alternative hypothesis.
        #[serde(default)]
        alternative: Alternative,
    },
    /// Two-proportion z test of a 0/1 outcome across a two-level group.
    TwoProportion {
        /// Grouping column with exactly two categories.
        group: String,
        /// 0/1 outcome column.
        outcome: String,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
        /// Alternative hypothesis.
        #[serde(default)]
        alternative: Alternative,
    },
    /// Fisher's exact test on the `group` x `outcome` crosstab.
    FisherExact {
        /// Row column.
        group: String,
        /// Column column.
        outcome: String,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
        /// Alternative hypothesis.
        #[serde(default)]
        alternative: Alternative,
    },
    /// Chi-square independence on the `rows` x `cols` crosstab.
    ChiSquare {
        /// Row variable.
        rows: String,
        /// Column variable.
        cols: String,
        /// Yates' correction for 2x2 tables.
        #[serde(default)]
        continuity_correction: bool,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    /// Correlation of two columns; the method follows the variable kinds
    /// unless given.
    Correlation {
        /// First column.
        x: String,
        /// Second column.
        y: String,
        /// Coefficient to use.
        #[serde(default)]
        method: Option<CorrelationMethod>,
        /// Significance level.
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    /// Correlation matrix of the numeric columns.
    CorrelationMatrix {
        /// Pearson, Spearman or Kendall.
        #[serde(default = "default_matrix_method")]
        method: CorrelationMethod,
    },
    /// Descriptive statistics of a numeric column.
    Describe {
        /// Column.
        column: String,
    },
    /// Outliers of a numeric column.
    Outliers {
        /// Column.
        column: String,
        /// Detection rule.
        #[serde(default)]
        detection: OutlierMethod,
    },
    /// Sampling statistics of a numeric column.
    Sampling {
        /// Column.
        column: String,
        /// Confidence level in percent.
        #[serde(default = "default_confidence_percent")]
        confidence_percent: f64,
    },
    /// t interval for the mean of a numeric column.
    MeanInterval {
        /// Column.
        column: String,
        /// Confidence level in `(0, 1)`.
        #[serde(default = "default_confidence")]
        confidence: f64,
    },
    /// Wald interval for the proportion of 1s in a 0/1 column.
    ProportionInterval {
        /// 0/1 outcome column.
        outcome: String,
        /// Confidence level in `(0, 1)`.
        #[serde(default = "default_confidence")]
        confidence: f64,
    },
    /// OLS with a train/test split.
    LinearRegression {
        /// Response column.
        dependent: String,
        /// Predictor columns.
        independents: Vec<String>,
        /// Split and solver settings.
        #[serde(default)]
        config: RegressionConfig,
    },
    /// Logistic regression with a train/test split.
    LogisticRegression {
        /// Two-valued response column.
        dependent: String,
        /// Predictor columns.
        independents: Vec<String>,
        /// Split and solver settings.
        #[serde(default)]
        config: RegressionConfig,
    },
    /// One-hot encode categorical columns.
    OneHotEncode {
        /// Columns to encode.
        columns: Vec<String>,
    },
    /// Label-encode categorical columns.
    LabelEncode {
        /// Columns to encode.
        columns: Vec<String>,
    },
}

/// Result of a [`DatasetRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// A hypothesis test.
    Test(TestOutcome),
    /// Correlation matrix.
    CorrelationMatrix(CorrelationMatrix),
    /// Descriptive statistics.
    Descriptives(Descriptives),
    /// Detected outliers.
    Outliers(OutlierReport),
    /// Sampling statistics.
    Sampling(SamplingReport),
    /// Confidence interval.
    Interval(ConfidenceInterval),
    /// Linear regression report.
    LinearRegression(LinearRegressionReport),
    /// Logistic regression report.
    LogisticRegression(LogisticRegressionReport),
    /// One-hot encoded dataset.
    Encoded(Dataset),
    /// Label-encoded dataset with its classes.
    LabelEncoded(LabelEncoded),
}

/// Numeric values of a column for correlation. A two-category categorical
/// column is coded 0/1 in sorted label order.
fn correlation_values(dataset: &Dataset, name: &str) -> Result<Vec<Option<f64>>> {
    match &dataset.column(name)?.values {
        ColumnData::Numeric(_) => dataset.numeric(name),
        ColumnData::Categorical(v) => {
            let encoded = label_encode(v);
            if encoded.classes.len() != 2 {
                return Err(Error::InputShape(format!(
                    "categorical column '{}' has {} categories; only binary categorical columns can be correlated",
                    name,
                    encoded.classes.len()
                )));
            }
            Ok(encoded.codes.into_iter().map(|c| c.map(f64::from)).collect())
        }
    }
}

impl DatasetRequest {
    /// Reduce `dataset` and run the analysis.
    pub fn run(&self, dataset: &Dataset) -> Result<AnalysisOutcome> {
        let outcome = match self {
            DatasetRequest::TTest { column1, column2, equal_var, alpha, alternative } => {
                let a = dataset.numeric_values(column1)?;
                let b = dataset.numeric_values(column2)?;
                AnalysisOutcome::Test(TestOutcome::Location(two_sample_t_test(
                    &a,
                    &b,
                    *equal_var,
                    *alpha,
                    *alternative,
                )?))
            }
            DatasetRequest::ZTest { column, population_mean, population_std, alpha, alternative } => {
                let v = dataset.numeric_values(column)?;
                AnalysisOutcome::Test(TestOutcome::Location(z_test_population(
                    &v,
                    *population_mean,
                    *population_std,
                    *alpha,
                    *alternative,
                )?))
            }
            DatasetRequest::OneWayAnova { group, value, alpha } => {
                let sample = dataset.grouped(group, value)?;
                AnalysisOutcome::Test(TestOutcome::OneWayAnova(one_way_anova(&sample, *alpha)?))
            }
            DatasetRequest::TwoWayAnova { factor_a, factor_b, value, alpha } => {
                let sample = dataset.two_factor(factor_a, factor_b, value)?;
                AnalysisOutcome::Test(TestOutcome::TwoWayAnova(two_way_anova(
                    &sample, factor_a, factor_b, *alpha,
                )?))
            }
            DatasetRequest::Tukey { group, value, alpha } => {
                let sample = dataset.grouped(group, value)?;
                AnalysisOutcome::Test(TestOutcome::Posthoc(posthoc_tukey(&sample, *alpha)?))
            }
            DatasetRequest::OneProportion { outcome, p0, alpha, alternative } => {
                let sample = dataset.binary_proportion(outcome)?;
                AnalysisOutcome::Test(TestOutcome::OneProportion(one_proportion_z_test(
                    &sample,
                    *p0,
                    *alpha,
                    *alternative,
                )?))
            }
            DatasetRequest::TwoProportion { group, outcome, alpha, alternative } => {
                let ((first, s1), (second, s2)) = dataset.group_proportions(group, outcome)?;
                log::debug!("two-proportion test: '{}' vs '{}'", first, second);
                AnalysisOutcome::Test(TestOutcome::TwoProportion(two_proportion_z_test(
                    &s1,
                    &s2,
                    *alpha,
                    *alternative,
                )?))
            }
            DatasetRequest::FisherExact { group, outcome, alpha, alternative } => {
                let table = dataset.crosstab(group, outcome)?;
                AnalysisOutcome::Test(TestOutcome::Fisher(fisher_exact(&table, *alpha, *alternative)?))
            }
            DatasetRequest::ChiSquare { rows, cols, continuity_correction, alpha } => {
                let table = dataset.crosstab(rows, cols)?;
                AnalysisOutcome::Test(TestOutcome::ChiSquare(chi_square_independence(
                    &table,
                    *alpha,
                    *continuity_correction,
                )?))
            }
            DatasetRequest::Correlation { x, y, method, alpha } => {
                let method = match method {
                    Some(m) => *m,
                    None => select_method(dataset.variable_kind(x)?, dataset.variable_kind(y)?),
                };
                let (xs, ys) =
                    align_pairs(&correlation_values(dataset, x)?, &correlation_values(dataset, y)?)?;
                AnalysisOutcome::Test(TestOutcome::Correlation(correlate(&xs, &ys, method, *alpha)?))
            }
            DatasetRequest::CorrelationMatrix { method } => {
                AnalysisOutcome::CorrelationMatrix(correlation_matrix(dataset, *method)?)
            }
            DatasetRequest::Describe { column } => {
                AnalysisOutcome::Descriptives(describe(&dataset.numeric_values(column)?)?)
            }
            DatasetRequest::Outliers { column, detection } => {
                AnalysisOutcome::Outliers(detect_outliers(&dataset.numeric_values(column)?, *detection)?)
            }
            DatasetRequest::Sampling { column, confidence_percent } => AnalysisOutcome::Sampling(
                sampling_analysis(&dataset.numeric_values(column)?, *confidence_percent)?,
            ),
            DatasetRequest::MeanInterval { column, confidence } => {
                let summary = SampleSummary::from_sample(&dataset.numeric_values(column)?)?;
                AnalysisOutcome::Interval(intervals::mean_unknown_sigma(
                    summary.mean,
                    summary.std_dev,
                    summary.count,
                    *confidence,
                )?)
            }
            DatasetRequest::ProportionInterval { outcome, confidence } => AnalysisOutcome::Interval(
                intervals::proportion(&dataset.binary_proportion(outcome)?, *confidence)?,
            ),
            DatasetRequest::LinearRegression { dependent, independents, config } => {
                AnalysisOutcome::LinearRegression(linear_regression(dataset, dependent, independents, config)?)
            }
            DatasetRequest::LogisticRegression { dependent, independents, config } => {
                AnalysisOutcome::LogisticRegression(logistic_regression(
                    dataset,
                    dependent,
                    independents,
                    config,
                )?)
            }
            DatasetRequest::OneHotEncode { columns } => {
                AnalysisOutcome::Encoded(one_hot_encode(dataset, columns)?)
            }
            DatasetRequest::LabelEncode { columns } => {
                AnalysisOutcome::LabelEncoded(label_encode_columns(dataset, columns)?)
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use sw_core::{Column, Decision};

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    fn dataset() -> Dataset {
        let groups = ["a", "a", "a", "b", "b", "b", "c", "c", "c", "a"];
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, f64::NAN];
        let outcome = [1.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0];
        let treated = ["y", "n", "y", "y", "y", "n", "y", "n", "y", "n"];
        Dataset::new(vec![
            Column::categorical("group", groups.iter().map(|g| s(g)).collect()),
            Column::numeric("value", values.iter().map(|&v| Some(v)).collect()),
            Column::numeric("outcome", outcome.iter().map(|&v| Some(v)).collect()),
            Column::categorical("treated", treated.iter().map(|g| s(g)).collect()),
        ])
        .unwrap()
    }

    fn run(json: &str) -> Result<AnalysisOutcome> {
        serde_json::from_str::<DatasetRequest>(json).unwrap().run(&dataset())
    }

    #[test]
    fn test_anova_drops_missing_and_matches_scenario() {
        let out = run(r#"{"analysis":"one_way_anova","group":"group","value":"value"}"#).unwrap();
        let AnalysisOutcome::Test(TestOutcome::OneWayAnova(r)) = out else { panic!("wrong outcome") };
        assert_abs_diff_eq!(r.decomposition.ss_between, 54.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.decomposition.ss_within, 6.0, epsilon = 1e-9);
        assert_eq!(r.test.decision, Decision::Reject);
    }

    #[test]
    fn test_one_proportion_uses_p0_and_interval_uses_p_hat() {
        let out = run(r#"{"analysis":"one_proportion","outcome":"outcome","p0":0.5}"#).unwrap();
        let AnalysisOutcome::Test(TestOutcome::OneProportion(r)) = out else { panic!("wrong outcome") };
        assert_abs_diff_eq!(r.p_hat, 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(r.standard_error, (0.25f64 / 10.0).sqrt(), epsilon = 1e-12);

        let out = run(r#"{"analysis":"proportion_interval","outcome":"outcome"}"#).unwrap();
        let AnalysisOutcome::Interval(ci) = out else { panic!("wrong outcome") };
        assert_abs_diff_eq!(ci.standard_error, (0.21f64 / 10.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_correlation_auto_selects_by_kind() {
        let out = run(r#"{"analysis":"correlation","x":"treated","y":"value"}"#).unwrap();
        let AnalysisOutcome::Test(TestOutcome::Correlation(r)) = out else { panic!("wrong outcome") };
        assert_eq!(r.method, CorrelationMethod::PointBiserial);
        assert_eq!(r.n, 9);

        let out = run(r#"{"analysis":"correlation","x":"treated","y":"outcome"}"#).unwrap();
        let AnalysisOutcome::Test(TestOutcome::Correlation(r)) = out else { panic!("wrong outcome") };
        assert_eq!(r.method, CorrelationMethod::Phi);

        assert!(matches!(
            run(r#"{"analysis":"correlation","x":"group","y":"value"}"#),
            Err(Error::InputShape(_))
        ));
    }

    #[test]
    fn test_crosstab_tests() {
        let out = run(r#"{"analysis":"fisher_exact","group":"treated","outcome":"outcome"}"#).unwrap();
        let AnalysisOutcome::Test(TestOutcome::Fisher(_)) = out else { panic!("wrong outcome") };
        assert!(matches!(
            run(r#"{"analysis":"fisher_exact","group":"group","outcome":"outcome"}"#),
            Err(Error::InputShape(_))
        ));
        let out = run(r#"{"analysis":"chi_square","rows":"group","cols":"treated"}"#).unwrap();
        let AnalysisOutcome::Test(TestOutcome::ChiSquare(r)) = out else { panic!("wrong outcome") };
        assert_eq!(r.row_labels, Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]));
    }

    #[test]
    fn test_describe_and_unknown_column() {
        let out = run(r#"{"analysis":"describe","column":"value"}"#).unwrap();
        let AnalysisOutcome::Descriptives(d) = out else { panic!("wrong outcome") };
        assert_eq!(d.count, 9);
        assert!(matches!(run(r#"{"analysis":"describe","column":"nope"}"#), Err(Error::InputShape(_))));
        assert!(matches!(run(r#"{"analysis":"describe","column":"group"}"#), Err(Error::InputShape(_))));
    }

    #[test]
    fn test_two_proportion_requires_two_groups() {
        // 4 untreated rows at the pooled 0.7 fail the normal approximation.
        assert!(matches!(
            run(r#"{"analysis":"two_proportion","group":"treated","outcome":"outcome"}"#),
            Err(Error::InsufficientData(_))
        ));
        assert!(matches!(
            run(r#"{"analysis":"two_proportion","group":"group","outcome":"outcome"}"#),
            Err(Error::InputShape(_))
        ));
    }

    #[test]
    fn test_encoding_outputs() {
        let out = run(r#"{"analysis":"one_hot_encode","columns":["treated"]}"#).unwrap();
        let AnalysisOutcome::Encoded(d) = out else { panic!("wrong outcome") };
        assert!(d.column("treated_y").is_ok());
        let json = serde_json::to_value(run(r#"{"analysis":"label_encode","columns":["group"]}"#).unwrap()).unwrap();
        assert_eq!(json["output"], "label_encoded");
        assert_eq!(json["classes"]["group"][2], "c");
    }
}
