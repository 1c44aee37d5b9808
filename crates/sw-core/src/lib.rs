//! # sw-core
//!
//! Core types for StatWorkbench.
//!
//! This crate holds the value records shared by every calculator
//! (sample summaries, contingency tables, grouped samples, test results),
//! the column-oriented [`Dataset`] that dataset-driven analyses reduce
//! from, and the error taxonomy.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dataset;
pub mod error;
pub mod types;

pub use dataset::{Column, ColumnData, Dataset};
pub use error::{Error, Result};
pub use types::{
    Alternative, ContingencyTable, Decision, DegreesOfFreedom, GroupedSample, ProportionSample,
    SampleSummary, TestResult, TwoFactorObservation, TwoFactorSample, VariableKind,
};

/// StatWorkbench version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
