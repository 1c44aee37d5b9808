//! Error types for StatWorkbench

use thiserror::Error;

/// StatWorkbench error type
///
/// Every calculator reports failures through one of these variants instead of
/// returning NaN or infinite results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Wrong table dimensions, too few groups/columns, mismatched pair lengths.
    #[error("Input shape error: {0}")]
    InputShape(String),

    /// Too few observations for the requested procedure.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Zero variance, zero expected frequency or another zero denominator.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Parameter outside its domain.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Numerical failure (singular system, failed solve).
    #[error("Computation error: {0}")]
    Computation(String),
}

impl Error {
    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InputShape(_) => "input_shape",
            Error::InsufficientData(_) => "insufficient_data",
            Error::DegenerateInput(_) => "degenerate_input",
            Error::Validation(_) => "validation",
            Error::Computation(_) => "computation",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_class() {
        let e = Error::DegenerateInput("standard error is 0".to_string());
        assert_eq!(e.to_string(), "Degenerate input: standard error is 0");
        assert_eq!(e.kind(), "degenerate_input");
    }
}
