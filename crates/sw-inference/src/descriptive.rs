//! Descriptive statistics.

use serde::{Deserialize, Serialize};
use sw_core::{Error, Result};

/// Summary of a numeric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptives {
    /// Number of finite values.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median (equal to `q2`).
    pub median: f64,
    /// Most frequent values, ascending. Every value when all are unique.
    pub modes: Vec<f64>,
    /// Minimum.
    pub min: f64,
    /// Maximum.
    pub max: f64,
    /// `max - min`.
    pub range: f64,
    /// Sample variance (ddof = 1).
    pub variance: f64,
    /// Sample standard deviation.
    pub std_dev: f64,
    /// First quartile.
    pub q1: f64,
    /// Second quartile.
    pub q2: f64,
    /// Third quartile.
    pub q3: f64,
    /// `q3 - q1`.
    pub iqr: f64,
    /// Values outside the 1.5 IQR fences, in input order.
    pub outliers: Vec<f64>,
}

/// Linear-interpolation quantile (R type 7) of an ascending sample.
pub fn quantile(sorted: &[f64], p: f64) -> Result<f64> {
    if sorted.is_empty() {
        return Err(Error::InsufficientData("quantile of an empty sample".to_string()));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::Validation(format!("quantile level must be in [0,1], got {}", p)));
    }
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Ok(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Sorted copy of the finite values.
pub(crate) fn sorted_finite(data: &[f64]) -> Vec<f64> {
    let mut v: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    v.sort_by(f64::total_cmp);
    v
}

/// `(q1, q3, lower fence, upper fence)` with 1.5 IQR fences.
pub(crate) fn iqr_fences(sorted: &[f64]) -> Result<(f64, f64, f64, f64)> {
    let q1 = quantile(sorted, 0.25)?;
    let q3 = quantile(sorted, 0.75)?;
    let iqr = q3 - q1;
    Ok((q1, q3, q1 - 1.5 * iqr, q3 + 1.5 * iqr))
}

fn modes(sorted: &[f64]) -> Vec<f64> {
    let mut runs: Vec<(f64, usize)> = Vec::new();
    for &x in sorted {
        match runs.last_mut() {
            Some((v, n)) if *v == x => *n += 1,
            _ => runs.push((x, 1)),
        }
    }
    let best = runs.iter().map(|r| r.1).max().unwrap_or(0);
    runs.into_iter().filter(|r| r.1 == best).map(|r| r.0).collect()
}

/// Describe the finite values of `data`. Non-finite entries are skipped.
pub fn describe(data: &[f64]) -> Result<Descriptives> {
    let sorted = sorted_finite(data);
    let count = sorted.len();
    if count < 2 {
        return Err(Error::InsufficientData(format!(
            "descriptive statistics need at least 2 finite values, got {}",
            count
        )));
    }
    let n = count as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let (q1, q3, lower, upper) = iqr_fences(&sorted)?;
    let q2 = quantile(&sorted, 0.5)?;
    let min = sorted[0];
    let max = sorted[count - 1];
    let outliers =
        data.iter().copied().filter(|x| x.is_finite() && (*x < lower || *x > upper)).collect();

    Ok(Descriptives {
        count,
        mean,
        median: q2,
        modes: modes(&sorted),
        min,
        max,
        range: max - min,
        variance,
        std_dev: variance.sqrt(),
        q1,
        q2,
        q3,
        iqr: q3 - q1,
        outliers,
    })
}
