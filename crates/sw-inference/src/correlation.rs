//! Correlation analysis.
//!
//! Method selection follows the variable kinds: two continuous variables use
//! Pearson, a binary and a continuous variable use point-biserial, two binary
//! variables use phi. Spearman and Kendall are available on request. Every
//! coefficient is reported with a two-sided significance test; the critical
//! value is expressed on the coefficient scale.
//!
//! Kendall's p-value is exact for untied samples of at most 33 pairs and uses
//! the tie-adjusted normal approximation otherwise.

use serde::{Deserialize, Serialize};
use sw_core::{
    Alternative, Dataset, DegreesOfFreedom, Error, Result, TestResult, VariableKind,
    dataset::crosstab_pairs,
};
use sw_prob::{Reference, kendall};

use crate::chi_square::chi_square_independence;
use crate::decision::{critical_value, finish, tail_p_value, validate_alpha};

/// Minimum number of complete pairs.
pub const MIN_PAIRS: usize = 3;

/// Correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    /// Pearson product-moment.
    Pearson,
    /// Spearman rank (average ranks for ties).
    Spearman,
    /// Kendall tau-b.
    Kendall,
    /// Point-biserial (Pearson with one binary variable).
    PointBiserial,
    /// Phi coefficient from the chi-square statistic of the 2x2 crosstab.
    Phi,
}

/// Correlation with its significance test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// Method used.
    pub method: CorrelationMethod,
    /// Coefficient in `[-1, 1]` (`[0, 1]` for phi).
    pub coefficient: f64,
    /// Number of complete pairs.
    pub n: usize,
    /// Statistic is the coefficient; critical value is the coefficient
    /// magnitude needed to reject at `alpha`.
    pub test: TestResult,
}

/// Drop positions where either side is missing or non-finite.
pub fn align_pairs(x: &[Option<f64>], y: &[Option<f64>]) -> Result<(Vec<f64>, Vec<f64>)> {
    if x.len() != y.len() {
        return Err(Error::InputShape(format!(
            "paired variables must have the same length, got {} and {}",
            x.len(),
            y.len()
        )));
    }
    Ok(x.iter()
        .zip(y)
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .unzip())
}

/// Coefficient implied by the variable kinds.
pub fn select_method(kind_x: VariableKind, kind_y: VariableKind) -> CorrelationMethod {
    match (kind_x, kind_y) {
        (VariableKind::Continuous, VariableKind::Continuous) => CorrelationMethod::Pearson,
        (VariableKind::Binary, VariableKind::Binary) => CorrelationMethod::Phi,
        _ => CorrelationMethod::PointBiserial,
    }
}

/// Binary when the values take exactly two distinct values, else continuous.
pub fn infer_kind(values: &[f64]) -> VariableKind {
    if distinct_count(values) == 2 { VariableKind::Binary } else { VariableKind::Continuous }
}

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

fn distinct_count(v: &[f64]) -> usize {
    let mut s = v.to_vec();
    s.sort_by(f64::total_cmp);
    s.dedup();
    s.len()
}

/// Pearson r; `None` when either side has zero variance.
pub fn pearson_r(x: &[f64], y: &[f64]) -> Option<f64> {
    let (mx, my) = (mean(x), mean(y));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
        syy += (b - my) * (b - my);
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Average ranks (1-based), ties share the mean of their positions.
pub fn average_ranks(v: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..v.len()).collect();
    order.sort_by(|&a, &b| v[a].total_cmp(&v[b]));
    let mut ranks = vec![0.0; v.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && v[order[j + 1]] == v[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}

/// Tie group sizes of a sample.
fn tie_counts(v: &[f64]) -> Vec<f64> {
    let mut s = v.to_vec();
    s.sort_by(f64::total_cmp);
    let mut out = Vec::new();
    let mut i = 0;
    while i < s.len() {
        let mut j = i;
        while j + 1 < s.len() && s[j + 1] == s[i] {
            j += 1;
        }
        if j > i {
            out.push((j - i + 1) as f64);
        }
        i = j + 1;
    }
    out
}

/// Kendall tau-b with the tie-adjusted variance of `S = concordant - discordant`.
struct KendallStats {
    tau: f64,
    s: f64,
    var_s: f64,
    /// `sqrt((n0 - n1) * (n0 - n2))`, the tau-b normaliser of `S`.
    denominator: f64,
    /// Whether either sample has ties.
    tied: bool,
}

fn sign(d: f64) -> f64 {
    if d > 0.0 {
        1.0
    } else if d < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn kendall_stats(x: &[f64], y: &[f64]) -> Option<KendallStats> {
    let n = x.len();
    let mut s = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            s += sign(x[i] - x[j]) * sign(y[i] - y[j]);
        }
    }
    let nf = n as f64;
    let pairs = nf * (nf - 1.0) / 2.0;
    let tx = tie_counts(x);
    let ty = tie_counts(y);
    let tied = |t: &[f64]| t.iter().map(|t| t * (t - 1.0) / 2.0).sum::<f64>();
    let (x_tied, y_tied) = (tied(&tx), tied(&ty));
    if pairs - x_tied <= 0.0 || pairs - y_tied <= 0.0 {
        return None;
    }
    let denominator = ((pairs - x_tied) * (pairs - y_tied)).sqrt();
    let tau = s / denominator;

    let v2 = |t: &[f64]| t.iter().map(|t| t * (t - 1.0) * (t - 2.0)).sum::<f64>();
    let v5 = |t: &[f64]| t.iter().map(|t| t * (t - 1.0) * (2.0 * t + 5.0)).sum::<f64>();
    let m = nf * (nf - 1.0);
    let var_s = (m * (2.0 * nf + 5.0) - v5(&tx) - v5(&ty)) / 18.0
        + 2.0 * x_tied * y_tied / m
        + v2(&tx) * v2(&ty) / (9.0 * m * (nf - 2.0));
    let tied = !tx.is_empty() || !ty.is_empty();
    Some(KendallStats { tau: tau.clamp(-1.0, 1.0), s, var_s, denominator, tied })
}

fn degenerate(method: CorrelationMethod) -> Error {
    Error::DegenerateInput(format!("{:?} correlation is undefined for a constant variable", method))
}

/// t-based test of a Pearson-type coefficient with `n - 2` df.
fn t_test_coefficient(r: f64, n: usize, alpha: f64) -> Result<TestResult> {
    let df = (n - 2) as f64;
    let reference = Reference::StudentT { df };
    let p_value = if 1.0 - r * r <= 0.0 {
        0.0
    } else {
        let t = r * (df / (1.0 - r * r)).sqrt();
        tail_p_value(&reference, t, Alternative::TwoSided)?
    };
    let t_crit = critical_value(&reference, alpha, Alternative::TwoSided)?;
    let r_crit = t_crit / (df + t_crit * t_crit).sqrt();
    finish(r, DegreesOfFreedom::Single(df), p_value, Some(r_crit), alpha, Alternative::TwoSided)
}

/// Exact permutation test of an untied tau. The critical value is the smallest
/// attainable `|tau|` that rejects, `None` when none does.
fn kendall_exact_test(k: &KendallStats, n: usize, alpha: f64) -> Result<TestResult> {
    let total = kendall::total_pairs(n);
    let discordant = ((total as f64 - k.s) / 2.0).round() as usize;
    let p_value = kendall::two_sided_p(n, discordant)?;
    let tau_crit = kendall::critical_discordant(n, alpha)?
        .map(|c| 1.0 - 2.0 * c as f64 / total as f64);
    finish(k.tau, DegreesOfFreedom::NotApplicable, p_value, tau_crit, alpha, Alternative::TwoSided)
}

/// Normal approximation of `S` with the tie-adjusted variance.
fn kendall_asymptotic_test(k: &KendallStats, alpha: f64) -> Result<TestResult> {
    let reference = Reference::StandardNormal;
    let sd = k.var_s.sqrt();
    let p_value = tail_p_value(&reference, k.s / sd, Alternative::TwoSided)?;
    let z_crit = critical_value(&reference, alpha, Alternative::TwoSided)?;
    // tau whose S sits z_crit standard deviations from zero.
    let tau_crit = z_crit * sd / k.denominator;
    finish(k.tau, DegreesOfFreedom::NotApplicable, p_value, Some(tau_crit), alpha, Alternative::TwoSided)
}

/// Correlate two aligned samples with the given method.
pub fn correlate(
    x: &[f64],
    y: &[f64],
    method: CorrelationMethod,
    alpha: f64,
) -> Result<CorrelationResult> {
    validate_alpha(alpha)?;
    if x.len() != y.len() {
        return Err(Error::InputShape(format!(
            "paired variables must have the same length, got {} and {}",
            x.len(),
            y.len()
        )));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(Error::Validation("correlation inputs must be finite".to_string()));
    }
    let n = x.len();
    if n < MIN_PAIRS {
        return Err(Error::InsufficientData(format!(
            "correlation needs at least {} complete pairs, got {}",
            MIN_PAIRS, n
        )));
    }

    let (coefficient, test) = match method {
        CorrelationMethod::Pearson => {
            let r = pearson_r(x, y).ok_or_else(|| degenerate(method))?;
            (r, t_test_coefficient(r, n, alpha)?)
        }
        CorrelationMethod::Spearman => {
            let r = pearson_r(&average_ranks(x), &average_ranks(y)).ok_or_else(|| degenerate(method))?;
            (r, t_test_coefficient(r, n, alpha)?)
        }
        CorrelationMethod::PointBiserial => {
            if distinct_count(x) != 2 && distinct_count(y) != 2 {
                return Err(Error::InputShape(
                    "point-biserial correlation needs one variable with exactly two values".to_string(),
                ));
            }
            let r = pearson_r(x, y).ok_or_else(|| degenerate(method))?;
            (r, t_test_coefficient(r, n, alpha)?)
        }
        CorrelationMethod::Kendall => {
            let k = kendall_stats(x, y).ok_or_else(|| degenerate(method))?;
            let test = if !k.tied && n <= kendall::EXACT_MAX_N {
                kendall_exact_test(&k, n, alpha)?
            } else {
                kendall_asymptotic_test(&k, alpha)?
            };
            (k.tau, test)
        }
        CorrelationMethod::Phi => {
            if distinct_count(x) < 2 || distinct_count(y) < 2 {
                return Err(degenerate(method));
            }
            let pairs: Vec<(String, String)> =
                x.iter().zip(y).map(|(a, b)| (a.to_string(), b.to_string())).collect();
            let table = crosstab_pairs(&pairs)?;
            let chi = chi_square_independence(&table, alpha, true)?;
            let total = n as f64;
            let phi = (chi.test.statistic / total).sqrt();
            let phi_crit = chi.test.critical_value.map(|c| (c / total).sqrt());
            let test = finish(
                phi,
                chi.test.degrees_of_freedom,
                chi.test.p_value,
                phi_crit,
                alpha,
                Alternative::Greater,
            )?;
            (phi, test)
        }
    };
    log::debug!("{:?} correlation over {} pairs: {}", method, n, coefficient);
    Ok(CorrelationResult { method, coefficient, n, test })
}

/// Pairwise-complete correlation matrix over numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Method used.
    pub method: CorrelationMethod,
    /// Column names, in dataset order.
    pub columns: Vec<String>,
    /// `values[i][j]`; `None` when undefined (fewer than 2 pairs or a constant column).
    pub values: Vec<Vec<Option<f64>>>,
}

fn coefficient_only(x: &[f64], y: &[f64], method: CorrelationMethod) -> Option<f64> {
    if x.len() < 2 {
        return None;
    }
    match method {
        CorrelationMethod::Spearman => pearson_r(&average_ranks(x), &average_ranks(y)),
        CorrelationMethod::Kendall => kendall_stats(x, y).map(|k| k.tau),
        _ => pearson_r(x, y),
    }
}

/// Correlation matrix of every numeric column (Pearson, Spearman or Kendall).
pub fn correlation_matrix(dataset: &Dataset, method: CorrelationMethod) -> Result<CorrelationMatrix> {
    if !matches!(
        method,
        CorrelationMethod::Pearson | CorrelationMethod::Spearman | CorrelationMethod::Kendall
    ) {
        return Err(Error::Validation(format!(
            "correlation matrix supports pearson, spearman or kendall, got {:?}",
            method
        )));
    }
    let columns: Vec<String> = dataset.numeric_columns().into_iter().map(str::to_string).collect();
    if columns.is_empty() {
        return Err(Error::InputShape("dataset has no numeric columns".to_string()));
    }
    let data = columns.iter().map(|c| dataset.numeric(c)).collect::<Result<Vec<_>>>()?;

    let k = columns.len();
    let mut values = vec![vec![None; k]; k];
    for i in 0..k {
        for j in i..k {
            let (x, y) = align_pairs(&data[i], &data[j])?;
            let v = if i == j {
                (distinct_count(&x) > 1).then_some(1.0)
            } else {
                coefficient_only(&x, &y, method)
            };
            values[i][j] = v;
            values[j][i] = v;
        }
    }
    Ok(CorrelationMatrix { method, columns, values })
}
