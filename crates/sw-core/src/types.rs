//! Common data types for StatWorkbench

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Alternative hypothesis selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alternative {
    /// `H1: theta != theta0`
    #[default]
    TwoSided,
    /// `H1: theta > theta0` (right tail)
    Greater,
    /// `H1: theta < theta0` (left tail)
    Less,
}

/// Categorical verdict of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Reject the null hypothesis.
    Reject,
    /// Fail to reject the null hypothesis.
    FailToReject,
}

impl Decision {
    /// `true` for [`Decision::Reject`].
    pub fn is_reject(self) -> bool {
        matches!(self, Decision::Reject)
    }
}

/// Degrees of freedom of the reference distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreesOfFreedom {
    /// z-tests and exact tests.
    NotApplicable,
    /// t and chi-square tests. Welch df is not rounded.
    Single(f64),
    /// F tests: (numerator, denominator).
    Pair(f64, f64),
}

impl DegreesOfFreedom {
    /// Single df value, if this is a single-parameter distribution.
    pub fn single(&self) -> Option<f64> {
        match *self {
            DegreesOfFreedom::Single(v) => Some(v),
            _ => None,
        }
    }
}

/// Outcome of a hypothesis test.
///
/// Built through `sw_inference::decision::finish`, which is the only place the
/// verdict is derived from `p_value` and `alpha`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test statistic (t, z, F, chi-square, odds ratio for Fisher).
    pub statistic: f64,
    /// Degrees of freedom of the reference distribution.
    pub degrees_of_freedom: DegreesOfFreedom,
    /// p-value in `[0, 1]`.
    pub p_value: f64,
    /// Critical value on the statistic scale. `None` for exact tests.
    pub critical_value: Option<f64>,
    /// Significance level used for the decision.
    pub alpha: f64,
    /// Alternative hypothesis.
    pub alternative: Alternative,
    /// Verdict.
    pub decision: Decision,
}

/// Summary of one sample: `{mean, std_dev, count}`.
///
/// For z-tests `std_dev` is the known population standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSampleSummary")]
pub struct SampleSummary {
    /// Sample mean.
    pub mean: f64,
    /// Standard deviation (sample, ddof = 1, unless stated otherwise).
    pub std_dev: f64,
    /// Number of observations.
    pub count: usize,
}

impl SampleSummary {
    /// Create a validated summary.
    pub fn new(mean: f64, std_dev: f64, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(Error::InsufficientData("sample count must be >= 1".to_string()));
        }
        if !mean.is_finite() {
            return Err(Error::Validation(format!("mean must be finite, got {}", mean)));
        }
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(Error::Validation(format!(
                "std_dev must be finite and >= 0, got {}",
                std_dev
            )));
        }
        Ok(Self { mean, std_dev, count })
    }

    /// Summarise raw observations (sample standard deviation, ddof = 1).
    ///
    /// A single observation yields `std_dev = 0`.
    pub fn from_sample(data: &[f64]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InsufficientData("sample must be non-empty".to_string()));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(Error::Validation("sample must contain only finite values".to_string()));
        }
        let n = data.len();
        let mean = data.iter().sum::<f64>() / n as f64;
        let std_dev = if n > 1 {
            let ss: f64 = data.iter().map(|x| (x - mean) * (x - mean)).sum();
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };
        Ok(Self { mean, std_dev, count: n })
    }

    /// `std_dev^2`
    pub fn variance(&self) -> f64 {
        self.std_dev * self.std_dev
    }
}

/// Successes out of trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProportionSample")]
pub struct ProportionSample {
    /// Number of successes.
    pub successes: u64,
    /// Number of trials.
    pub trials: u64,
}

impl ProportionSample {
    /// Create a validated proportion sample.
    pub fn new(successes: u64, trials: u64) -> Result<Self> {
        if trials == 0 {
            return Err(Error::InsufficientData("trials must be >= 1".to_string()));
        }
        if successes > trials {
            return Err(Error::Validation(format!(
                "successes must be <= trials, got {} > {}",
                successes, trials
            )));
        }
        Ok(Self { successes, trials })
    }

    /// Count successes in a 0/1 coded sample.
    pub fn from_binary(data: &[f64]) -> Result<Self> {
        let mut successes = 0u64;
        for &v in data {
            if v == 1.0 {
                successes += 1;
            } else if v != 0.0 {
                return Err(Error::Validation(format!(
                    "binary outcome must be coded 0/1, got {}",
                    v
                )));
            }
        }
        Self::new(successes, data.len() as u64)
    }

    /// Observed proportion `successes / trials`.
    pub fn proportion(&self) -> f64 {
        self.successes as f64 / self.trials as f64
    }
}

#[derive(Deserialize)]
struct RawSampleSummary {
    mean: f64,
    std_dev: f64,
    count: usize,
}

impl TryFrom<RawSampleSummary> for SampleSummary {
    type Error = Error;

    fn try_from(raw: RawSampleSummary) -> Result<Self> {
        Self::new(raw.mean, raw.std_dev, raw.count)
    }
}

#[derive(Deserialize)]
struct RawProportionSample {
    successes: u64,
    trials: u64,
}

impl TryFrom<RawProportionSample> for ProportionSample {
    type Error = Error;

    fn try_from(raw: RawProportionSample) -> Result<Self> {
        Self::new(raw.successes, raw.trials)
    }
}

/// Whether a variable is treated as continuous or binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// Numeric with more than two distinct values.
    Continuous,
    /// Exactly two distinct values.
    Binary,
}

/// Cross-tabulation of non-negative counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawContingencyTable")]
pub struct ContingencyTable {
    counts: Vec<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    row_labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    col_labels: Option<Vec<String>>,
}

impl ContingencyTable {
    /// Create a table from row-major counts. Must be non-empty and rectangular.
    pub fn new(counts: Vec<Vec<u64>>) -> Result<Self> {
        let n_cols = counts.first().map(|r| r.len()).unwrap_or(0);
        if counts.is_empty() || n_cols == 0 {
            return Err(Error::InputShape("contingency table must be non-empty".to_string()));
        }
        for (i, row) in counts.iter().enumerate() {
            if row.len() != n_cols {
                return Err(Error::InputShape(format!(
                    "contingency table must be rectangular: row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
        }
        Ok(Self { counts, row_labels: None, col_labels: None })
    }

    /// Create a labelled table.
    pub fn with_labels(
        counts: Vec<Vec<u64>>,
        row_labels: Vec<String>,
        col_labels: Vec<String>,
    ) -> Result<Self> {
        let table = Self::new(counts)?;
        if row_labels.len() != table.n_rows() || col_labels.len() != table.n_cols() {
            return Err(Error::InputShape(format!(
                "labels do not match a {}x{} table",
                table.n_rows(),
                table.n_cols()
            )));
        }
        Ok(Self { row_labels: Some(row_labels), col_labels: Some(col_labels), ..table })
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.counts.len()
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.counts[0].len()
    }

    /// Count at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.counts[row][col]
    }

    /// Row-major counts.
    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    /// Row labels, if any.
    pub fn row_labels(&self) -> Option<&[String]> {
        self.row_labels.as_deref()
    }

    /// Column labels, if any.
    pub fn col_labels(&self) -> Option<&[String]> {
        self.col_labels.as_deref()
    }

    /// Sum of each row.
    pub fn row_sums(&self) -> Vec<u64> {
        self.counts.iter().map(|r| r.iter().sum()).collect()
    }

    /// Sum of each column.
    pub fn col_sums(&self) -> Vec<u64> {
        (0..self.n_cols()).map(|j| self.counts.iter().map(|r| r[j]).sum()).collect()
    }

    /// Grand total.
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}

#[derive(Deserialize)]
struct RawContingencyTable {
    counts: Vec<Vec<u64>>,
    #[serde(default)]
    row_labels: Option<Vec<String>>,
    #[serde(default)]
    col_labels: Option<Vec<String>>,
}

impl TryFrom<RawContingencyTable> for ContingencyTable {
    type Error = Error;

    fn try_from(raw: RawContingencyTable) -> Result<Self> {
        match (raw.row_labels, raw.col_labels) {
            (Some(r), Some(c)) => Self::with_labels(raw.counts, r, c),
            (None, None) => Self::new(raw.counts),
            _ => Err(Error::InputShape(
                "row_labels and col_labels must be given together".to_string(),
            )),
        }
    }
}

/// Numeric observations keyed by group label, in first-appearance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(String, Vec<f64>)>", into = "Vec<(String, Vec<f64>)>")]
pub struct GroupedSample {
    groups: Vec<(String, Vec<f64>)>,
}

impl GroupedSample {
    /// Create from `(label, observations)` pairs. Labels must be unique and
    /// every group needs at least one finite observation.
    pub fn new(groups: Vec<(String, Vec<f64>)>) -> Result<Self> {
        for (i, (label, values)) in groups.iter().enumerate() {
            if values.is_empty() {
                return Err(Error::InsufficientData(format!("group '{}' has no observations", label)));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(Error::Validation(format!(
                    "group '{}' contains non-finite values",
                    label
                )));
            }
            if groups[..i].iter().any(|(l, _)| l == label) {
                return Err(Error::InputShape(format!("duplicate group label '{}'", label)));
            }
        }
        Ok(Self { groups })
    }

    /// Group parallel `labels` / `values`, keeping first-appearance order.
    pub fn from_pairs(labels: &[String], values: &[f64]) -> Result<Self> {
        if labels.len() != values.len() {
            return Err(Error::InputShape(format!(
                "labels and values must have the same length, got {} and {}",
                labels.len(),
                values.len()
            )));
        }
        let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
        for (label, &v) in labels.iter().zip(values) {
            match groups.iter_mut().find(|(l, _)| l == label) {
                Some((_, vs)) => vs.push(v),
                None => groups.push((label.clone(), vec![v])),
            }
        }
        Self::new(groups)
    }

    /// Number of groups.
    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }

    /// Total number of observations.
    pub fn n_total(&self) -> usize {
        self.groups.iter().map(|(_, v)| v.len()).sum()
    }

    /// Iterate `(label, observations)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.groups.iter().map(|(l, v)| (l.as_str(), v.as_slice()))
    }

    /// All observations, concatenated in group order.
    pub fn all_values(&self) -> Vec<f64> {
        self.groups.iter().flat_map(|(_, v)| v.iter().copied()).collect()
    }
}

impl TryFrom<Vec<(String, Vec<f64>)>> for GroupedSample {
    type Error = Error;

    fn try_from(groups: Vec<(String, Vec<f64>)>) -> Result<Self> {
        Self::new(groups)
    }
}

impl From<GroupedSample> for Vec<(String, Vec<f64>)> {
    fn from(g: GroupedSample) -> Self {
        g.groups
    }
}

/// One observation of a two-factor design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoFactorObservation {
    /// Level of factor A.
    pub a: String,
    /// Level of factor B.
    pub b: String,
    /// Response value.
    pub value: f64,
}

/// Observations for two-way ANOVA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TwoFactorObservation>", into = "Vec<TwoFactorObservation>")]
pub struct TwoFactorSample {
    observations: Vec<TwoFactorObservation>,
}

impl TwoFactorSample {
    /// Create from observations (non-empty, finite responses).
    pub fn new(observations: Vec<TwoFactorObservation>) -> Result<Self> {
        if observations.is_empty() {
            return Err(Error::InsufficientData("two-factor sample must be non-empty".to_string()));
        }
        if observations.iter().any(|o| !o.value.is_finite()) {
            return Err(Error::Validation("responses must be finite".to_string()));
        }
        Ok(Self { observations })
    }

    /// Observations in input order.
    pub fn observations(&self) -> &[TwoFactorObservation] {
        &self.observations
    }

    /// Sorted distinct levels of factor A.
    pub fn levels_a(&self) -> Vec<String> {
        sorted_levels(self.observations.iter().map(|o| o.a.as_str()))
    }

    /// Sorted distinct levels of factor B.
    pub fn levels_b(&self) -> Vec<String> {
        sorted_levels(self.observations.iter().map(|o| o.b.as_str()))
    }
}

impl TryFrom<Vec<TwoFactorObservation>> for TwoFactorSample {
    type Error = Error;

    fn try_from(observations: Vec<TwoFactorObservation>) -> Result<Self> {
        Self::new(observations)
    }
}

impl From<TwoFactorSample> for Vec<TwoFactorObservation> {
    fn from(s: TwoFactorSample) -> Self {
        s.observations
    }
}

fn sorted_levels<'a>(it: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut levels: Vec<String> = it.map(str::to_string).collect();
    levels.sort();
    levels.dedup();
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_summary_from_sample() {
        let s = SampleSummary::from_sample(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.count, 8);
        assert!((s.mean - 5.0).abs() < 1e-12);
        assert!((s.variance() - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_summary_rejects_empty_and_nan() {
        assert!(matches!(SampleSummary::from_sample(&[]), Err(Error::InsufficientData(_))));
        assert!(matches!(
            SampleSummary::from_sample(&[1.0, f64::NAN]),
            Err(Error::Validation(_))
        ));
        assert!(SampleSummary::new(1.0, -0.5, 3).is_err());
    }

    #[test]
    fn test_proportion_sample() {
        let p = ProportionSample::new(45, 100).unwrap();
        assert!((p.proportion() - 0.45).abs() < 1e-12);
        assert!(ProportionSample::new(5, 4).is_err());
        assert!(ProportionSample::new(0, 0).is_err());

        let b = ProportionSample::from_binary(&[1.0, 0.0, 1.0, 1.0]).unwrap();
        assert_eq!((b.successes, b.trials), (3, 4));
        assert!(ProportionSample::from_binary(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_contingency_table_sums() {
        let t = ContingencyTable::new(vec![vec![10, 20], vec![30, 40]]).unwrap();
        assert_eq!(t.row_sums(), vec![30, 70]);
        assert_eq!(t.col_sums(), vec![40, 60]);
        assert_eq!(t.total(), 100);
        assert!(ContingencyTable::new(vec![vec![1, 2], vec![3]]).is_err());
        assert!(ContingencyTable::new(vec![]).is_err());
    }

    #[test]
    fn test_grouped_sample_preserves_first_appearance() {
        let labels: Vec<String> = ["b", "a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let g = GroupedSample::from_pairs(&labels, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let order: Vec<&str> = g.iter().map(|(l, _)| l).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(g.n_total(), 4);
        assert!(GroupedSample::new(vec![("a".into(), vec![])]).is_err());
    }

    #[test]
    fn test_summary_serde_validates() {
        let ok: SampleSummary =
            serde_json::from_str(r#"{"mean":1.5,"std_dev":0.5,"count":4}"#).unwrap();
        assert_eq!(ok.count, 4);
        assert!(serde_json::from_str::<SampleSummary>(r#"{"mean":1.5,"std_dev":-1.0,"count":4}"#).is_err());
        assert!(serde_json::from_str::<ProportionSample>(r#"{"successes":5,"trials":3}"#).is_err());
    }

    #[test]
    fn test_grouped_sample_serde_validates() {
        let ok: GroupedSample = serde_json::from_str(r#"[["a",[1.0,2.0]],["b",[3.0]]]"#).unwrap();
        assert_eq!(ok.n_groups(), 2);
        let bad: std::result::Result<GroupedSample, _> = serde_json::from_str(r#"[["a",[]]]"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_two_factor_levels_sorted() {
        let obs = vec![
            TwoFactorObservation { a: "y".into(), b: "q".into(), value: 1.0 },
            TwoFactorObservation { a: "x".into(), b: "p".into(), value: 2.0 },
            TwoFactorObservation { a: "y".into(), b: "p".into(), value: 3.0 },
        ];
        let s = TwoFactorSample::new(obs).unwrap();
        assert_eq!(s.levels_a(), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(s.levels_b(), vec!["p".to_string(), "q".to_string()]);
    }
}
