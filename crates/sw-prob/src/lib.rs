//! Probability building blocks for StatWorkbench.
//!
//! This crate hosts the distribution math used by the calculators:
//! - reference distributions for test statistics (CDF / SF / quantile) over `statrs`
//! - discrete PMFs (binomial, Poisson, hypergeometric)
//! - the studentized range distribution (not available in `statrs`)
//! - the exact null distribution of Kendall's statistic
//! - small numeric and combinatorial helpers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod binomial;
pub mod chi_squared;
pub mod distributions;
pub mod fisher_f;
pub mod hypergeometric;
pub mod kendall;
pub mod math;
pub mod normal;
pub mod poisson;
pub mod student_t;
pub mod studentized_range;

pub use distributions::Reference;
