//! Tukey HSD post-hoc comparisons (Tukey-Kramer for unequal group sizes).

use serde::{Deserialize, Serialize};
use sw_core::{Decision, Error, GroupedSample, Result};
use sw_prob::studentized_range;

use crate::anova::{OneWayAnovaResult, OneWayDecomposition, one_way_anova};
use crate::decision::{decide, validate_alpha};

/// One pairwise comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TukeyComparison {
    /// First group (sorted order).
    pub group1: String,
    /// Second group.
    pub group2: String,
    /// `mean(group2) - mean(group1)`
    pub mean_diff: f64,
    /// Family-wise adjusted p-value.
    pub p_adj: f64,
    /// Lower simultaneous confidence bound.
    pub lower: f64,
    /// Upper simultaneous confidence bound.
    pub upper: f64,
    /// `true` when `p_adj < alpha`.
    pub reject: bool,
}

/// All pairwise comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TukeyResult {
    /// Significance level.
    pub alpha: f64,
    /// Studentized range critical value `q(1-alpha; k, n-k)`.
    pub q_critical: f64,
    /// Within-group mean square.
    pub ms_within: f64,
    /// Within-group degrees of freedom.
    pub df_within: f64,
    /// One row per unordered pair.
    pub comparisons: Vec<TukeyComparison>,
}

/// Tukey HSD on a grouped sample.
pub fn tukey_hsd(sample: &GroupedSample, alpha: f64) -> Result<TukeyResult> {
    validate_alpha(alpha)?;
    let decomposition = OneWayDecomposition::compute(sample)?;
    if decomposition.ms_within <= 0.0 {
        return Err(Error::DegenerateInput(
            "within-group variance is zero; Tukey HSD is undefined".to_string(),
        ));
    }

    let mut groups = decomposition.groups.clone();
    groups.sort_by(|a, b| a.label.cmp(&b.label));
    let k = groups.len() as f64;
    let df = decomposition.df_within;
    let msw = decomposition.ms_within;
    let q_critical = studentized_range::quantile(1.0 - alpha, k, df)?;

    let mut comparisons = Vec::with_capacity(groups.len() * (groups.len() - 1) / 2);
    for (i, g1) in groups.iter().enumerate() {
        for g2 in &groups[i + 1..] {
            let mean_diff = g2.mean - g1.mean;
            let se = (msw / 2.0 * (1.0 / g1.count as f64 + 1.0 / g2.count as f64)).sqrt();
            let q = mean_diff.abs() / se;
            let p_adj = studentized_range::sf(q, k, df)?;
            let margin = q_critical * se;
            comparisons.push(TukeyComparison {
                group1: g1.label.clone(),
                group2: g2.label.clone(),
                mean_diff,
                p_adj,
                lower: mean_diff - margin,
                upper: mean_diff + margin,
                reject: decide(p_adj, alpha) == Decision::Reject,
            });
        }
    }

    Ok(TukeyResult { alpha, q_critical, ms_within: msw, df_within: df, comparisons })
}

/// Outcome of ANOVA followed by Tukey HSD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosthocResult {
    /// The one-way ANOVA.
    pub anova: OneWayAnovaResult,
    /// Pairwise comparisons, present only when the ANOVA rejects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tukey: Option<TukeyResult>,
}

/// Run the one-way ANOVA and, only if it rejects, Tukey HSD.
pub fn posthoc_tukey(sample: &GroupedSample, alpha: f64) -> Result<PosthocResult> {
    let anova = one_way_anova(sample, alpha)?;
    let tukey = if anova.test.decision.is_reject() {
        Some(tukey_hsd(sample, alpha)?)
    } else {
        log::info!("ANOVA did not reject at alpha={}; skipping Tukey HSD", alpha);
        None
    };
    Ok(PosthocResult { anova, tukey })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::pooled_t_test;
    use approx::assert_abs_diff_eq;
    use sw_core::{Alternative, SampleSummary};

    fn groups(data: &[(&str, &[f64])]) -> GroupedSample {
        GroupedSample::new(data.iter().map(|(l, v)| (l.to_string(), v.to_vec())).collect()).unwrap()
    }

    #[test]
    fn test_pairs_sorted_and_bounds() {
        let g = groups(&[
            ("c", &[7.0, 8.0, 9.0]),
            ("a", &[1.0, 2.0, 3.0]),
            ("b", &[4.0, 5.0, 6.0]),
        ]);
        let r = tukey_hsd(&g, 0.05).unwrap();
        let pairs: Vec<(&str, &str)> =
            r.comparisons.iter().map(|c| (c.group1.as_str(), c.group2.as_str())).collect();
        assert_eq!(pairs, vec![("a", "b"), ("a", "c"), ("b", "c")]);

        assert_abs_diff_eq!(r.q_critical, 4.339195, epsilon = 1e-3);
        let se = (1.0f64 / 3.0).sqrt();
        let ab = &r.comparisons[0];
        assert_abs_diff_eq!(ab.mean_diff, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ab.upper - ab.lower, 2.0 * r.q_critical * se, epsilon = 1e-9);
        assert!(r.comparisons.iter().all(|c| c.reject && c.p_adj < 0.05));
        assert!(r.comparisons[1].p_adj < ab.p_adj);
        // q = 3 / sqrt(1/3) and 6 / sqrt(1/3) on (3, 6).
        assert_abs_diff_eq!(ab.p_adj, 0.024229053412425575, epsilon = 1e-5);
        assert_abs_diff_eq!(r.comparisons[1].p_adj, 0.0007942179104906255, epsilon = 1e-5);
    }

    #[test]
    fn test_two_groups_matches_pooled_t() {
        let a = [5.1, 4.8, 6.2, 5.5, 5.9];
        let b = [6.3, 7.1, 6.8, 5.9, 7.4, 6.6];
        let r = tukey_hsd(&groups(&[("a", &a), ("b", &b)]), 0.05).unwrap();
        let t = pooled_t_test(
            &SampleSummary::from_sample(&a).unwrap(),
            &SampleSummary::from_sample(&b).unwrap(),
            0.05,
            Alternative::TwoSided,
        )
        .unwrap();
        assert_abs_diff_eq!(r.comparisons[0].p_adj, t.test.p_value, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_within_variance() {
        let g = groups(&[("a", &[1.0, 1.0]), ("b", &[2.0, 2.0])]);
        assert!(matches!(tukey_hsd(&g, 0.05), Err(Error::DegenerateInput(_))));
    }

    #[test]
    fn test_posthoc_only_after_rejection() {
        let separated = groups(&[("a", &[1.0, 2.0, 3.0]), ("b", &[4.0, 5.0, 6.0]), ("c", &[7.0, 8.0, 9.0])]);
        assert!(posthoc_tukey(&separated, 0.05).unwrap().tukey.is_some());

        let overlapping = groups(&[("a", &[1.0, 5.0, 9.0]), ("b", &[2.0, 6.0, 8.0]), ("c", &[3.0, 4.0, 7.0])]);
        let r = posthoc_tukey(&overlapping, 0.05).unwrap();
        assert!(!r.anova.test.decision.is_reject());
        assert!(r.tukey.is_none());
    }
}
