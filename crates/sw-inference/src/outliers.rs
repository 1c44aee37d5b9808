//! Outlier detection by z-score or IQR fences.

use serde::{Deserialize, Serialize};
use sw_core::{Error, Result};

use crate::descriptive::{iqr_fences, sorted_finite};

/// Detection rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OutlierMethod {
    /// `|x - mean| / sigma > threshold`, population sigma.
    ZScore {
        /// Cut-off in standard deviations.
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    /// Outside `[q1 - 1.5 IQR, q3 + 1.5 IQR]`.
    Iqr,
}

fn default_threshold() -> f64 {
    3.0
}

impl Default for OutlierMethod {
    fn default() -> Self {
        Self::ZScore { threshold: default_threshold() }
    }
}

/// Detected outliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    /// Rule applied.
    pub method: OutlierMethod,
    /// Number of finite values analysed.
    pub n_analyzed: usize,
    /// Lower bound of the accepted range.
    pub lower: f64,
    /// Upper bound of the accepted range.
    pub upper: f64,
    /// Positions of outliers in the input.
    pub indices: Vec<usize>,
    /// Outlying values, in input order.
    pub values: Vec<f64>,
}

/// Flag outliers among the finite values of `data`.
pub fn detect_outliers(data: &[f64], method: OutlierMethod) -> Result<OutlierReport> {
    let sorted = sorted_finite(data);
    let n = sorted.len();
    if n < 2 {
        return Err(Error::InsufficientData(format!(
            "outlier detection needs at least 2 finite values, got {}",
            n
        )));
    }

    let (lower, upper) = match method {
        OutlierMethod::ZScore { threshold } => {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(Error::Validation(format!(
                    "z-score threshold must be positive, got {}",
                    threshold
                )));
            }
            let mean = sorted.iter().sum::<f64>() / n as f64;
            let sigma = (sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
            if sigma == 0.0 {
                return Err(Error::DegenerateInput(
                    "z-scores are undefined for a constant sample".to_string(),
                ));
            }
            (mean - threshold * sigma, mean + threshold * sigma)
        }
        OutlierMethod::Iqr => {
            let (_, _, lower, upper) = iqr_fences(&sorted)?;
            (lower, upper)
        }
    };

    let (indices, values): (Vec<usize>, Vec<f64>) = data
        .iter()
        .enumerate()
        .filter(|(_, x)| x.is_finite() && (**x < lower || **x > upper))
        .map(|(i, x)| (i, *x))
        .unzip();
    log::debug!("{:?}: {} of {} values outside [{}, {}]", method, values.len(), n, lower, upper);

    Ok(OutlierReport { method, n_analyzed: n, lower, upper, indices, values })
}
