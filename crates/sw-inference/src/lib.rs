//! # sw-inference
//!
//! Statistical calculators for StatWorkbench.
//!
//! This crate provides:
//! - two-sample location tests (pooled / Welch t, z)
//! - proportion tests and Fisher's exact test
//! - one-way and two-way ANOVA, Tukey HSD
//! - chi-square independence and correlation analysis
//! - descriptive, outlier, sampling and confidence-interval tools
//! - distribution and probability calculators
//! - OLS / logistic regression and categorical encoding
//!
//! ## Architecture
//!
//! Every calculator is a pure function of its inputs. Test statistics are
//! turned into verdicts only through [`decision::finish`], so the decision rule
//! lives in one place. [`kind::TestRequest`] and [`analysis::DatasetRequest`]
//! are the serialisable entry points used by the CLI.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Dataset-driven analyses naming columns.
pub mod analysis;
/// One-way and two-way analysis of variance.
pub mod anova;
/// Chi-square test of independence.
pub mod chi_square;
/// Correlation selection, coefficients and significance.
pub mod correlation;
/// Shared decision rule, tail probabilities and critical values.
pub mod decision;
/// Descriptive statistics.
pub mod descriptive;
/// Normal, binomial and Poisson calculators.
pub mod distribution_tools;
/// Label and one-hot encoding of categorical columns.
pub mod encoding;
/// Confidence intervals for a mean or a proportion.
pub mod intervals;
/// Closed enumeration of test kinds and their dispatcher.
pub mod kind;
/// Two-sample t and z tests.
pub mod location;
/// Z-score and IQR outlier detection.
pub mod outliers;
/// Bayes, conditional, classical probability and combinatorics.
pub mod probability;
/// One- and two-proportion z tests, Fisher's exact test.
pub mod proportion;
/// OLS and logistic regression with a train/test split.
pub mod regression;
/// Sampling distribution and central-limit calculators.
pub mod sampling;
/// Tukey HSD post-hoc comparisons.
pub mod tukey;

pub use analysis::{AnalysisOutcome, DatasetRequest};
pub use decision::decide;
pub use kind::{TestKind, TestOutcome, TestRequest};
