//! Reference distributions of test statistics.
//!
//! A single enum over the continuous distributions the calculators compare
//! their statistics against, so tail probabilities and critical values can be
//! computed uniformly. Each variant forwards to its per-distribution module.

use serde::{Deserialize, Serialize};
use sw_core::Result;

/// Null distribution of a test statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Reference {
    /// `N(0, 1)`.
    StandardNormal,
    /// Student-t with `df` degrees of freedom.
    StudentT {
        /// Degrees of freedom.
        df: f64,
    },
    /// `F(d1, d2)`.
    FisherF {
        /// Numerator degrees of freedom.
        d1: f64,
        /// Denominator degrees of freedom.
        d2: f64,
    },
    /// Chi-squared with `df` degrees of freedom.
    ChiSquared {
        /// Degrees of freedom.
        df: f64,
    },
}

impl Reference {
    /// `P(S <= x)`.
    pub fn cdf(&self, x: f64) -> Result<f64> {
        match *self {
            Reference::StandardNormal => Ok(crate::normal::standard_cdf(x)),
            Reference::StudentT { df } => crate::student_t::cdf(x, df),
            Reference::FisherF { d1, d2 } => crate::fisher_f::cdf(x, d1, d2),
            Reference::ChiSquared { df } => crate::chi_squared::cdf(x, df),
        }
    }

    /// `P(S > x)`.
    pub fn sf(&self, x: f64) -> Result<f64> {
        match *self {
            Reference::StandardNormal => Ok(crate::normal::standard_sf(x)),
            Reference::StudentT { df } => crate::student_t::sf(x, df),
            Reference::FisherF { d1, d2 } => crate::fisher_f::sf(x, d1, d2),
            Reference::ChiSquared { df } => crate::chi_squared::sf(x, df),
        }
    }

    /// Inverse CDF at `p` in `(0, 1)`.
    pub fn quantile(&self, p: f64) -> Result<f64> {
        match *self {
            Reference::StandardNormal => crate::normal::standard_quantile(p),
            Reference::StudentT { df } => crate::student_t::quantile(p, df),
            Reference::FisherF { d1, d2 } => crate::fisher_f::quantile(p, d1, d2),
            Reference::ChiSquared { df } => crate::chi_squared::quantile(p, df),
        }
    }

    /// `true` for distributions symmetric about zero.
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Reference::StandardNormal | Reference::StudentT { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_forwarding_matches_modules() {
        let t = Reference::StudentT { df: 7.0 };
        assert_relative_eq!(t.cdf(1.3).unwrap(), crate::student_t::cdf(1.3, 7.0).unwrap());
        let f = Reference::FisherF { d1: 2.0, d2: 9.0 };
        assert_relative_eq!(f.sf(3.0).unwrap(), crate::fisher_f::sf(3.0, 2.0, 9.0).unwrap());
        let c = Reference::ChiSquared { df: 3.0 };
        assert_relative_eq!(
            c.quantile(0.9).unwrap(),
            crate::chi_squared::quantile(0.9, 3.0).unwrap()
        );
    }

    #[test]
    fn test_cdf_sf_complement() {
        let refs = [
            Reference::StandardNormal,
            Reference::StudentT { df: 4.5 },
            Reference::FisherF { d1: 3.0, d2: 12.0 },
            Reference::ChiSquared { df: 2.0 },
        ];
        for r in refs {
            for x in [0.2, 1.0, 2.5] {
                assert_relative_eq!(r.cdf(x).unwrap() + r.sf(x).unwrap(), 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_symmetry_flag() {
        assert!(Reference::StandardNormal.is_symmetric());
        assert!(!Reference::ChiSquared { df: 1.0 }.is_symmetric());
    }

    proptest::proptest! {
        #[test]
        fn prop_quantile_inverts_cdf(p in 0.01f64..0.99, df in 1.0f64..60.0) {
            for r in [
                Reference::StandardNormal,
                Reference::StudentT { df },
                Reference::FisherF { d1: 2.0, d2: df },
                Reference::ChiSquared { df },
            ] {
                let q = r.quantile(p).unwrap();
                proptest::prop_assert!((r.cdf(q).unwrap() - p).abs() < 1e-8);
            }
        }
    }
}
