//! Chi-square test of independence on a contingency table.

use serde::{Deserialize, Serialize};
use sw_core::{Alternative, ContingencyTable, DegreesOfFreedom, Error, Result, TestResult};
use sw_prob::Reference;

use crate::decision::{evaluate, validate_alpha};

/// Result of a chi-square independence test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareResult {
    /// Statistic, `(r-1)(c-1)` df, upper-tail p-value, critical value and verdict.
    pub test: TestResult,
    /// Expected counts `row_sum * col_sum / total`.
    pub expected: Vec<Vec<f64>>,
    /// Observed minus expected.
    pub residuals: Vec<Vec<f64>>,
    /// Whether Yates' continuity correction was applied.
    pub continuity_corrected: bool,
    /// Row labels of the table, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_labels: Option<Vec<String>>,
    /// Column labels of the table, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_labels: Option<Vec<String>>,
}

/// Pearson chi-square test of independence.
///
/// With `continuity_correction` and one degree of freedom each observed count
/// is moved towards its expected count by `min(0.5, |o - e|)` (Yates).
pub fn chi_square_independence(
    table: &ContingencyTable,
    alpha: f64,
    continuity_correction: bool,
) -> Result<ChiSquareResult> {
    validate_alpha(alpha)?;
    let (r, c) = (table.n_rows(), table.n_cols());
    if r < 2 || c < 2 {
        return Err(Error::InputShape(format!(
            "chi-square test needs at least 2 rows and 2 columns, got {}x{}",
            r, c
        )));
    }

    let row_sums = table.row_sums();
    let col_sums = table.col_sums();
    let total = table.total() as f64;
    if total == 0.0 {
        return Err(Error::DegenerateInput("contingency table total is zero".to_string()));
    }

    let expected: Vec<Vec<f64>> = row_sums
        .iter()
        .map(|&rs| col_sums.iter().map(|&cs| rs as f64 * cs as f64 / total).collect())
        .collect();
    for (i, row) in expected.iter().enumerate() {
        if let Some(j) = row.iter().position(|&e| e == 0.0) {
            return Err(Error::DegenerateInput(format!(
                "expected frequency is zero at row {}, column {}",
                i, j
            )));
        }
    }

    let df = ((r - 1) * (c - 1)) as f64;
    let corrected = continuity_correction && df == 1.0;
    let mut statistic = 0.0;
    let mut residuals = vec![vec![0.0; c]; r];
    for i in 0..r {
        for j in 0..c {
            let o = table.get(i, j) as f64;
            let e = expected[i][j];
            residuals[i][j] = o - e;
            let d = e - o;
            let o_adj = if corrected && d != 0.0 { o + d.signum() * d.abs().min(0.5) } else { o };
            statistic += (o_adj - e).powi(2) / e;
        }
    }

    let test = evaluate(
        statistic,
        DegreesOfFreedom::Single(df),
        &Reference::ChiSquared { df },
        alpha,
        Alternative::Greater,
    )?;
    Ok(ChiSquareResult {
        test,
        expected,
        residuals,
        continuity_corrected: corrected,
        row_labels: table.row_labels().map(<[String]>::to_vec),
        col_labels: table.col_labels().map(<[String]>::to_vec),
    })
}
