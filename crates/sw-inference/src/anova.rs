//! Analysis of variance.
//!
//! One-way ANOVA partitions the total sum of squares into between-group and
//! within-group parts. Two-way ANOVA uses Type II sums of squares from least
//! squares fits of nested treatment-coded models.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use sw_core::{
    Alternative, DegreesOfFreedom, Error, GroupedSample, Result, TestResult, TwoFactorSample,
};
use sw_prob::Reference;

use crate::decision::{evaluate, validate_alpha};

// ---------------------------------------------------------------------------
// One-way
// ---------------------------------------------------------------------------

/// Per-group summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Group label.
    pub label: String,
    /// Number of observations.
    pub count: usize,
    /// Group mean.
    pub mean: f64,
}

/// Sum-of-squares decomposition of a grouped sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneWayDecomposition {
    /// Groups in input order.
    pub groups: Vec<GroupStats>,
    /// Mean of all observations.
    pub grand_mean: f64,
    /// `sum n_i (mean_i - grand)^2`
    pub ss_between: f64,
    /// `sum sum (x - mean_i)^2`
    pub ss_within: f64,
    /// `ss_between + ss_within`
    pub ss_total: f64,
    /// `k - 1`
    pub df_between: f64,
    /// `n - k`
    pub df_within: f64,
    /// `n - 1`
    pub df_total: f64,
    /// `ss_between / df_between`
    pub ms_between: f64,
    /// `ss_within / df_within`
    pub ms_within: f64,
    /// `ss_total / df_total`
    pub ms_total: f64,
}

impl OneWayDecomposition {
    /// Decompose. Needs at least two groups and `n - k >= 1`.
    ///
    /// A zero within-group sum of squares is reported as is.
    pub fn compute(sample: &GroupedSample) -> Result<Self> {
        let k = sample.n_groups();
        let n = sample.n_total();
        if k < 2 {
            return Err(Error::InputShape(format!("ANOVA needs at least 2 groups, got {}", k)));
        }
        if n <= k {
            return Err(Error::InsufficientData(format!(
                "ANOVA needs more observations than groups (n={}, k={})",
                n, k
            )));
        }

        let grand_mean = sample.all_values().iter().sum::<f64>() / n as f64;
        let mut groups = Vec::with_capacity(k);
        let mut ss_between = 0.0;
        let mut ss_within = 0.0;
        for (label, values) in sample.iter() {
            let count = values.len();
            let mean = values.iter().sum::<f64>() / count as f64;
            ss_between += count as f64 * (mean - grand_mean).powi(2);
            ss_within += values.iter().map(|x| (x - mean).powi(2)).sum::<f64>();
            groups.push(GroupStats { label: label.to_string(), count, mean });
        }

        let ss_total = ss_between + ss_within;
        let df_between = (k - 1) as f64;
        let df_within = (n - k) as f64;
        let df_total = (n - 1) as f64;
        Ok(Self {
            groups,
            grand_mean,
            ss_between,
            ss_within,
            ss_total,
            df_between,
            df_within,
            df_total,
            ms_between: ss_between / df_between,
            ms_within: ss_within / df_within,
            ms_total: ss_total / df_total,
        })
    }
}

/// Result of a one-way ANOVA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneWayAnovaResult {
    /// Sums of squares and mean squares.
    pub decomposition: OneWayDecomposition,
    /// F statistic, `F(k-1, n-k)` p-value, F-critical and verdict.
    pub test: TestResult,
}

/// One-way ANOVA F test.
pub fn one_way_anova(sample: &GroupedSample, alpha: f64) -> Result<OneWayAnovaResult> {
    validate_alpha(alpha)?;
    let decomposition = OneWayDecomposition::compute(sample)?;
    if decomposition.ms_within <= 0.0 {
        return Err(Error::DegenerateInput(
            "within-group variance is zero; F is undefined".to_string(),
        ));
    }
    let f = decomposition.ms_between / decomposition.ms_within;
    let (d1, d2) = (decomposition.df_between, decomposition.df_within);
    let test = evaluate(
        f,
        DegreesOfFreedom::Pair(d1, d2),
        &Reference::FisherF { d1, d2 },
        alpha,
        Alternative::Greater,
    )?;
    log::debug!("one-way ANOVA: k={} F={} p={}", decomposition.groups.len(), f, test.p_value);
    Ok(OneWayAnovaResult { decomposition, test })
}

// ---------------------------------------------------------------------------
// Two-way (Type II)
// ---------------------------------------------------------------------------

/// One effect row of a two-way ANOVA table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaEffect {
    /// Effect name (factor A label, factor B label, or `A:B`).
    pub source: String,
    /// Type II sum of squares.
    pub sum_sq: f64,
    /// Effect degrees of freedom.
    pub df: f64,
    /// `sum_sq / df`
    pub mean_sq: f64,
    /// F against the residual mean square, p-value, F-critical and verdict.
    pub test: TestResult,
}

/// Residual row of a two-way ANOVA table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaResidual {
    /// Residual sum of squares of the full model.
    pub sum_sq: f64,
    /// Residual degrees of freedom.
    pub df: f64,
    /// `sum_sq / df`
    pub mean_sq: f64,
}

/// Two-way ANOVA table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoWayAnovaResult {
    /// Factor A, factor B and interaction rows (rows with zero df are omitted).
    pub effects: Vec<AnovaEffect>,
    /// Residual row.
    pub residual: AnovaResidual,
}

/// Column blocks of the treatment-coded design.
struct Design {
    y: DVector<f64>,
    a: Vec<DVector<f64>>,
    b: Vec<DVector<f64>>,
    ab: Vec<DVector<f64>>,
}

impl Design {
    fn build(sample: &TwoFactorSample) -> Result<Self> {
        let levels_a = sample.levels_a();
        let levels_b = sample.levels_b();
        if levels_a.len() < 2 || levels_b.len() < 2 {
            return Err(Error::InputShape(format!(
                "two-way ANOVA needs at least 2 levels per factor, got {} and {}",
                levels_a.len(),
                levels_b.len()
            )));
        }
        let obs = sample.observations();
        let n = obs.len();
        let y = DVector::from_iterator(n, obs.iter().map(|o| o.value));

        // First (sorted) level is the reference category.
        let dummy = |levels: &[String], pick: fn(&sw_core::TwoFactorObservation) -> &str| {
            levels[1..]
                .iter()
                .map(|level| {
                    DVector::from_iterator(
                        n,
                        obs.iter().map(|o| if pick(o) == level.as_str() { 1.0 } else { 0.0 }),
                    )
                })
                .collect::<Vec<_>>()
        };
        let a = dummy(&levels_a[..], |o| o.a.as_str());
        let b = dummy(&levels_b[..], |o| o.b.as_str());
        let ab = a.iter().flat_map(|da| b.iter().map(move |db| da.component_mul(db))).collect();
        Ok(Self { y, a, b, ab })
    }

    fn matrix(&self, blocks: &[&[DVector<f64>]]) -> DMatrix<f64> {
        let n = self.y.len();
        let mut cols = vec![DVector::from_element(n, 1.0)];
        for block in blocks {
            cols.extend(block.iter().cloned());
        }
        DMatrix::from_columns(&cols)
    }
}

/// Residual sum of squares and rank of the least squares fit of `y` on `x`.
pub(crate) fn least_squares_rss(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(f64, usize)> {
    let svd = x.clone().svd(true, true);
    let max_sv = svd.singular_values.max();
    let eps = max_sv * 1e-10;
    let rank = svd.rank(eps);
    let beta = svd.solve(y, eps).map_err(|e| Error::Computation(e.to_string()))?;
    let resid = y - x * beta;
    Ok((resid.norm_squared(), rank))
}

/// Two-way ANOVA with interaction, Type II sums of squares.
///
/// `SS(A) = RSS(B) - RSS(A + B)`, `SS(B) = RSS(A) - RSS(A + B)` and
/// `SS(A:B) = RSS(A + B) - RSS(A + B + A:B)`, each tested against the residual
/// mean square of the full model.
pub fn two_way_anova(
    sample: &TwoFactorSample,
    factor_a: &str,
    factor_b: &str,
    alpha: f64,
) -> Result<TwoWayAnovaResult> {
    validate_alpha(alpha)?;
    let design = Design::build(sample)?;
    let n = design.y.len();

    let (rss_a, rank_a) = least_squares_rss(&design.matrix(&[&design.a]), &design.y)?;
    let (rss_b, rank_b) = least_squares_rss(&design.matrix(&[&design.b]), &design.y)?;
    let (rss_ab, rank_ab) =
        least_squares_rss(&design.matrix(&[&design.a, &design.b]), &design.y)?;
    let (rss_full, rank_full) =
        least_squares_rss(&design.matrix(&[&design.a, &design.b, &design.ab]), &design.y)?;

    let df_resid = n as f64 - rank_full as f64;
    if df_resid < 1.0 {
        return Err(Error::InsufficientData(format!(
            "two-way ANOVA has no residual degrees of freedom (n={}, model rank={})",
            n, rank_full
        )));
    }
    let ms_resid = rss_full / df_resid;
    if ms_resid <= 1e-12 * design.y.norm_squared().max(1.0) {
        return Err(Error::DegenerateInput("residual mean square is zero".to_string()));
    }

    let rows = [
        (factor_a.to_string(), rss_b - rss_ab, rank_ab.saturating_sub(rank_b)),
        (factor_b.to_string(), rss_a - rss_ab, rank_ab.saturating_sub(rank_a)),
        (format!("{}:{}", factor_a, factor_b), rss_ab - rss_full, rank_full.saturating_sub(rank_ab)),
    ];

    let mut effects = Vec::with_capacity(3);
    for (source, ss, df) in rows {
        if df == 0 {
            log::warn!("two-way ANOVA: effect '{}' is not estimable and is omitted", source);
            continue;
        }
        let df = df as f64;
        let ss = ss.max(0.0);
        let ms = ss / df;
        let test = evaluate(
            ms / ms_resid,
            DegreesOfFreedom::Pair(df, df_resid),
            &Reference::FisherF { d1: df, d2: df_resid },
            alpha,
            Alternative::Greater,
        )?;
        effects.push(AnovaEffect { source, sum_sq: ss, df, mean_sq: ms, test });
    }

    Ok(TwoWayAnovaResult {
        effects,
        residual: AnovaResidual { sum_sq: rss_full, df: df_resid, mean_sq: ms_resid },
    })
}
