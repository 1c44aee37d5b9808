//! Linear and logistic regression on dataset columns.
//!
//! Both workflows drop incomplete rows, split the remaining rows into a
//! train and a test part with a seeded shuffle, fit on train and report on
//! test.

use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use sw_core::{Dataset, Error, Result};
use sw_prob::math::{log1pexp, sigmoid};
use sw_prob::{Reference, student_t};

/// Regression workflow settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    /// Fraction of rows held out for testing.
    pub test_fraction: f64,
    /// Shuffle seed.
    pub seed: u64,
    /// Inverse L2 penalty strength for logistic regression.
    pub inverse_regularization: f64,
    /// Newton iteration limit for logistic regression.
    pub max_iter: usize,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self { test_fraction: 0.2, seed: 42, inverse_regularization: 1.0, max_iter: 100 }
    }
}

// ---------------------------------------------------------------------------
// Train / test split
// ---------------------------------------------------------------------------

/// Row indices of a train/test partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    /// Training rows.
    pub train: Vec<usize>,
    /// Held-out rows.
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and hold out `ceil(test_fraction * n)` rows.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<Split> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::Validation(format!(
            "test fraction must be in (0,1), got {}",
            test_fraction
        )));
    }
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(Error::InsufficientData(format!(
            "cannot split {} rows into non-empty train and test parts",
            n
        )));
    }
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let train = indices.split_off(n_test);
    Ok(Split { train, test: indices })
}

// ---------------------------------------------------------------------------
// OLS
// ---------------------------------------------------------------------------

/// One estimated coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// `const` or the feature name.
    pub name: String,
    /// Estimate.
    pub estimate: f64,
    /// Standard error.
    pub std_error: f64,
    /// `estimate / std_error`.
    pub t: f64,
    /// Two-sided p-value on `df_resid`.
    pub p_value: f64,
    /// Lower 95% bound.
    pub lower: f64,
    /// Upper 95% bound.
    pub upper: f64,
}

/// Ordinary least squares with an intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlsFit {
    /// Intercept first, then one entry per feature.
    pub coefficients: Vec<Coefficient>,
    /// Observations used.
    pub n: usize,
    /// Number of features.
    pub df_model: f64,
    /// `n - features - 1`.
    pub df_resid: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Adjusted R^2.
    pub adj_r_squared: f64,
    /// Overall F statistic.
    pub f_statistic: f64,
    /// p-value of the F statistic.
    pub f_p_value: f64,
    /// Gaussian log-likelihood at the estimate.
    pub log_likelihood: f64,
    /// Akaike information criterion.
    pub aic: f64,
    /// Bayesian information criterion.
    pub bic: f64,
}

fn design_with_intercept(x: &[Vec<f64>], p: usize) -> Result<DMatrix<f64>> {
    for (i, row) in x.iter().enumerate() {
        if row.len() != p {
            return Err(Error::InputShape(format!(
                "X must be rectangular: row {} has len {}, expected {}",
                i,
                row.len(),
                p
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(Error::Validation("X must contain only finite values".to_string()));
        }
    }
    Ok(DMatrix::from_fn(x.len(), p + 1, |i, j| if j == 0 { 1.0 } else { x[i][j - 1] }))
}

impl OlsFit {
    /// Fit `y = b0 + X b` by least squares. `names` labels the columns of `x`.
    pub fn fit(x: &[Vec<f64>], y: &[f64], names: &[String]) -> Result<Self> {
        let n = y.len();
        let p = names.len();
        if p == 0 {
            return Err(Error::InputShape("OLS needs at least one feature".to_string()));
        }
        if x.len() != n {
            return Err(Error::InputShape(format!("X has {} rows but y has {}", x.len(), n)));
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(Error::Validation("y must contain only finite values".to_string()));
        }
        let k = p + 1;
        if n <= k {
            return Err(Error::InsufficientData(format!(
                "OLS with {} parameters needs more than {} observations, got {}",
                k, k, n
            )));
        }

        let design = design_with_intercept(x, p)?;
        let target = DVector::from_column_slice(y);
        let xtx_inv = (design.transpose() * &design)
            .try_inverse()
            .ok_or_else(|| Error::Computation("OLS solve failed (singular XtX)".to_string()))?;
        let beta = &xtx_inv * design.transpose() * &target;
        let resid = &target - &design * &beta;
        let rss = resid.norm_squared();

        let nf = n as f64;
        let y_mean = target.mean();
        let tss = target.iter().map(|v| (v - y_mean).powi(2)).sum::<f64>();
        if tss <= 0.0 {
            return Err(Error::DegenerateInput("dependent variable is constant".to_string()));
        }
        if rss <= 1e-12 * tss {
            return Err(Error::DegenerateInput(
                "perfect fit, residual variance is zero".to_string(),
            ));
        }

        let df_model = p as f64;
        let df_resid = nf - k as f64;
        let sigma2 = rss / df_resid;
        let t_crit = student_t::quantile(0.975, df_resid)?;
        let reference = Reference::StudentT { df: df_resid };

        let mut coefficients = Vec::with_capacity(k);
        for j in 0..k {
            let estimate = beta[j];
            let std_error = (sigma2 * xtx_inv[(j, j)]).sqrt();
            let t = estimate / std_error;
            let p_value = (2.0 * reference.sf(t.abs())?).min(1.0);
            let name = if j == 0 { "const".to_string() } else { names[j - 1].clone() };
            coefficients.push(Coefficient {
                name,
                estimate,
                std_error,
                t,
                p_value,
                lower: estimate - t_crit * std_error,
                upper: estimate + t_crit * std_error,
            });
        }

        let r_squared = 1.0 - rss / tss;
        let adj_r_squared = 1.0 - (1.0 - r_squared) * (nf - 1.0) / df_resid;
        let f_statistic = ((tss - rss) / df_model) / sigma2;
        let f_p_value = Reference::FisherF { d1: df_model, d2: df_resid }.sf(f_statistic)?;
        let log_likelihood =
            -nf / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (rss / nf).ln() + 1.0);
        let aic = -2.0 * log_likelihood + 2.0 * k as f64;
        let bic = -2.0 * log_likelihood + nf.ln() * k as f64;

        log::debug!("OLS fit: n={} features={} R^2={}", n, p, r_squared);
        Ok(Self {
            coefficients,
            n,
            df_model,
            df_resid,
            r_squared,
            adj_r_squared,
            f_statistic,
            f_p_value,
            log_likelihood,
            aic,
            bic,
        })
    }

    /// Predictions for rows of `x`.
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        let p = self.coefficients.len() - 1;
        let design = design_with_intercept(x, p)?;
        let beta = DVector::from_iterator(p + 1, self.coefficients.iter().map(|c| c.estimate));
        Ok((design * beta).iter().copied().collect())
    }
}

// ---------------------------------------------------------------------------
// Logistic
// ---------------------------------------------------------------------------

/// L2-penalised logistic regression on standardised features.
///
/// Minimises `C * sum_i logloss_i + 0.5 * ||w||^2`; the intercept is not
/// penalised. Coefficients are on the standardised scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticFit {
    /// Feature names.
    pub names: Vec<String>,
    /// Intercept.
    pub intercept: f64,
    /// One coefficient per standardised feature.
    pub coefficients: Vec<f64>,
    /// Training means used for standardisation.
    pub means: Vec<f64>,
    /// Training population standard deviations (1 for constant features).
    pub scales: Vec<f64>,
    /// Newton iterations performed.
    pub iterations: usize,
    /// Whether the step size fell below tolerance.
    pub converged: bool,
}

impl LogisticFit {
    /// Fit on rows `x` with 0/1 labels `y`.
    pub fn fit(x: &[Vec<f64>], y: &[u8], names: &[String], c: f64, max_iter: usize) -> Result<Self> {
        let n = y.len();
        let p = names.len();
        if p == 0 {
            return Err(Error::InputShape("logistic regression needs at least one feature".to_string()));
        }
        if x.len() != n {
            return Err(Error::InputShape(format!("X has {} rows but y has {}", x.len(), n)));
        }
        if !(c.is_finite() && c > 0.0) {
            return Err(Error::Validation(format!("inverse regularisation must be positive, got {}", c)));
        }
        if y.iter().any(|&v| v > 1) {
            return Err(Error::Validation("labels must be 0 or 1".to_string()));
        }
        let positives = y.iter().filter(|&&v| v == 1).count();
        if positives == 0 || positives == n {
            return Err(Error::DegenerateInput(
                "training labels contain a single class".to_string(),
            ));
        }
        let raw = design_with_intercept(x, p)?;

        let nf = n as f64;
        let mut means = Vec::with_capacity(p);
        let mut scales = Vec::with_capacity(p);
        for j in 1..=p {
            let col = raw.column(j);
            let mean = col.mean();
            let sd = (col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / nf).sqrt();
            means.push(mean);
            scales.push(if sd > 0.0 { sd } else { 1.0 });
        }
        let design = standardize(&raw, &means, &scales);
        let labels = DVector::from_iterator(n, y.iter().map(|&v| v as f64));

        let k = p + 1;
        let mut penalty = DMatrix::<f64>::identity(k, k);
        penalty[(0, 0)] = 0.0;
        let mut w = DVector::<f64>::zeros(k);
        let mut converged = false;
        let mut iterations = 0;
        while iterations < max_iter {
            iterations += 1;
            let eta = &design * &w;
            let prob = eta.map(sigmoid);
            let grad = design.transpose() * (&prob - &labels) * c + &penalty * &w;
            let weights = prob.map(|q| q * (1.0 - q));
            let weighted = DMatrix::from_fn(n, k, |i, j| design[(i, j)] * weights[i]);
            let hess = design.transpose() * weighted * c + &penalty;
            let step = hess
                .cholesky()
                .ok_or_else(|| Error::Computation("logistic Hessian is not positive definite".to_string()))?
                .solve(&grad);
            w -= &step;
            if step.amax() < 1e-10 {
                converged = true;
                break;
            }
        }
        if !converged {
            log::warn!("logistic regression did not converge in {} iterations", max_iter);
        }

        let objective: f64 = (&design * &w)
            .iter()
            .zip(labels.iter())
            .map(|(e, l)| log1pexp(*e) - l * e)
            .sum::<f64>()
            * c
            + 0.5 * w.rows(1, p).norm_squared();
        log::debug!("logistic fit: n={} iterations={} objective={}", n, iterations, objective);

        Ok(Self {
            names: names.to_vec(),
            intercept: w[0],
            coefficients: w.iter().skip(1).copied().collect(),
            means,
            scales,
            iterations,
            converged,
        })
    }

    /// `P(y = 1)` for each raw row.
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        let raw = design_with_intercept(x, self.coefficients.len())?;
        let design = standardize(&raw, &self.means, &self.scales);
        Ok(design
            .row_iter()
            .map(|row| {
                let eta = self.intercept
                    + row.iter().skip(1).zip(&self.coefficients).map(|(v, b)| v * b).sum::<f64>();
                sigmoid(eta)
            })
            .collect())
    }

    /// Class 1 when `P(y = 1) > 0.5`.
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<u8>> {
        Ok(self.predict_proba(x)?.into_iter().map(|q| u8::from(q > 0.5)).collect())
    }
}

fn standardize(raw: &DMatrix<f64>, means: &[f64], scales: &[f64]) -> DMatrix<f64> {
    DMatrix::from_fn(raw.nrows(), raw.ncols(), |i, j| {
        if j == 0 { 1.0 } else { (raw[(i, j)] - means[j - 1]) / scales[j - 1] }
    })
}

// ---------------------------------------------------------------------------
// Dataset workflows
// ---------------------------------------------------------------------------

/// Rows where the dependent and every independent column are present.
struct CompleteRows {
    x: Vec<Vec<f64>>,
    y: Vec<f64>,
}

fn complete_rows(dataset: &Dataset, dependent: &str, independents: &[String]) -> Result<CompleteRows> {
    if independents.is_empty() {
        return Err(Error::InputShape("at least one independent variable is required".to_string()));
    }
    if independents.iter().any(|c| c == dependent) {
        return Err(Error::InputShape(format!(
            "'{}' cannot be both dependent and independent",
            dependent
        )));
    }
    let y_col = dataset.numeric(dependent)?;
    let x_cols = independents.iter().map(|c| dataset.numeric(c)).collect::<Result<Vec<_>>>()?;

    let mut x = Vec::new();
    let mut y = Vec::new();
    for (i, yi) in y_col.iter().enumerate() {
        let Some(yi) = yi else { continue };
        let row: Option<Vec<f64>> = x_cols.iter().map(|c| c[i]).collect();
        if let Some(row) = row {
            x.push(row);
            y.push(*yi);
        }
    }
    let dropped = y_col.len() - y.len();
    if dropped > 0 {
        log::debug!("dropped {} incomplete rows", dropped);
    }
    Ok(CompleteRows { x, y })
}

fn pick<T: Clone>(v: &[T], idx: &[usize]) -> Vec<T> {
    idx.iter().map(|&i| v[i].clone()).collect()
}

/// Held-out prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Observed value.
    pub actual: f64,
    /// Fitted value.
    pub predicted: f64,
    /// `actual - predicted`.
    pub residual: f64,
}

/// Linear regression fitted on the train part and evaluated on the test part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressionReport {
    /// Dependent column.
    pub dependent: String,
    /// Training rows.
    pub n_train: usize,
    /// Test rows.
    pub n_test: usize,
    /// Train fit.
    pub fit: OlsFit,
    /// Test predictions.
    pub predictions: Vec<Prediction>,
    /// Mean squared error on the test rows.
    pub test_mse: f64,
}

/// OLS of `dependent` on `independents`.
pub fn linear_regression(
    dataset: &Dataset,
    dependent: &str,
    independents: &[String],
    config: &RegressionConfig,
) -> Result<LinearRegressionReport> {
    let rows = complete_rows(dataset, dependent, independents)?;
    let split = train_test_split(rows.y.len(), config.test_fraction, config.seed)?;
    let fit = OlsFit::fit(&pick(&rows.x, &split.train), &pick(&rows.y, &split.train), independents)?;

    let x_test = pick(&rows.x, &split.test);
    let y_test = pick(&rows.y, &split.test);
    let predictions: Vec<Prediction> = fit
        .predict(&x_test)?
        .into_iter()
        .zip(&y_test)
        .map(|(predicted, &actual)| Prediction { actual, predicted, residual: actual - predicted })
        .collect();
    let test_mse =
        predictions.iter().map(|p| p.residual * p.residual).sum::<f64>() / predictions.len() as f64;

    Ok(LinearRegressionReport {
        dependent: dependent.to_string(),
        n_train: split.train.len(),
        n_test: split.test.len(),
        fit,
        predictions,
        test_mse,
    })
}

/// Named standardised coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCoefficient {
    /// Feature column.
    pub feature: String,
    /// Coefficient on the standardised scale.
    pub coefficient: f64,
}

/// Logistic regression fitted on the train part and evaluated on the test part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionReport {
    /// Dependent column.
    pub dependent: String,
    /// The two observed values of the dependent column, `classes[1]` is coded 1.
    pub classes: [f64; 2],
    /// Training rows.
    pub n_train: usize,
    /// Test rows.
    pub n_test: usize,
    /// Share of correctly classified test rows.
    pub accuracy: f64,
    /// Intercept.
    pub intercept: f64,
    /// Coefficients by feature.
    pub coefficients: Vec<FeatureCoefficient>,
    /// `confusion_matrix[actual][predicted]` on the test rows.
    pub confusion_matrix: [[u64; 2]; 2],
    /// Whether the solver converged.
    pub converged: bool,
}

/// Logistic regression of a two-valued `dependent` on `independents`.
pub fn logistic_regression(
    dataset: &Dataset,
    dependent: &str,
    independents: &[String],
    config: &RegressionConfig,
) -> Result<LogisticRegressionReport> {
    let rows = complete_rows(dataset, dependent, independents)?;
    let mut distinct = rows.y.clone();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    if distinct.len() != 2 {
        return Err(Error::InputShape(format!(
            "dependent variable must be binary (two distinct values), found {}",
            distinct.len()
        )));
    }
    let classes = [distinct[0], distinct[1]];
    let labels: Vec<u8> = rows.y.iter().map(|&v| u8::from(v == classes[1])).collect();

    let split = train_test_split(labels.len(), config.test_fraction, config.seed)?;
    let fit = LogisticFit::fit(
        &pick(&rows.x, &split.train),
        &pick(&labels, &split.train),
        independents,
        config.inverse_regularization,
        config.max_iter,
    )?;

    let actual = pick(&labels, &split.test);
    let predicted = fit.predict(&pick(&rows.x, &split.test))?;
    let mut confusion_matrix = [[0u64; 2]; 2];
    for (&a, &p) in actual.iter().zip(&predicted) {
        confusion_matrix[a as usize][p as usize] += 1;
    }
    let correct = confusion_matrix[0][0] + confusion_matrix[1][1];
    let accuracy = correct as f64 / actual.len() as f64;

    Ok(LogisticRegressionReport {
        dependent: dependent.to_string(),
        classes,
        n_train: split.train.len(),
        n_test: split.test.len(),
        accuracy,
        intercept: fit.intercept,
        coefficients: independents
            .iter()
            .zip(&fit.coefficients)
            .map(|(f, &c)| FeatureCoefficient { feature: f.clone(), coefficient: c })
            .collect(),
        confusion_matrix,
        converged: fit.converged,
    })
}
