//! Elementary probability: Bayes, conditional, classical, counting.

use serde::{Deserialize, Serialize};
use sw_core::{Error, Result};

pub use sw_prob::math::{combinations, permutations, sample_space_size};

fn validate_probability(name: &str, p: f64) -> Result<()> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(Error::Validation(format!("{} must be in [0,1], got {}", name, p)));
    }
    Ok(())
}

/// Posterior from Bayes' theorem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BayesResult {
    /// `P(B) = P(B|A) P(A) + P(B|not A) (1 - P(A))`.
    pub p_b: f64,
    /// `P(A|B)`.
    pub posterior: f64,
}

/// `P(A|B)` from the prior `P(A)`, `P(B|A)` and `P(B|not A)`.
pub fn bayes(p_a: f64, p_b_given_a: f64, p_b_given_not_a: f64) -> Result<BayesResult> {
    validate_probability("P(A)", p_a)?;
    validate_probability("P(B|A)", p_b_given_a)?;
    validate_probability("P(B|not A)", p_b_given_not_a)?;
    let p_b = p_b_given_a * p_a + p_b_given_not_a * (1.0 - p_a);
    if p_b <= 0.0 {
        return Err(Error::DegenerateInput("P(B) is zero, posterior is undefined".to_string()));
    }
    Ok(BayesResult { p_b, posterior: p_b_given_a * p_a / p_b })
}

/// `P(A|B) = P(A and B) / P(B)`.
pub fn conditional(p_joint: f64, p_given: f64) -> Result<f64> {
    validate_probability("joint probability", p_joint)?;
    validate_probability("conditioning probability", p_given)?;
    if p_given == 0.0 {
        return Err(Error::DegenerateInput("conditioning event has probability zero".to_string()));
    }
    if p_joint > p_given {
        return Err(Error::Validation(format!(
            "joint probability {} exceeds the conditioning probability {}",
            p_joint, p_given
        )));
    }
    Ok(p_joint / p_given)
}

/// Favourable over total outcomes of an equally likely sample space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicalProbability<T> {
    /// Number of outcomes in the sample space.
    pub total: usize,
    /// Distinct favourable outcomes, ascending.
    pub favorable: Vec<T>,
    /// `favorable.len() / total`.
    pub probability: f64,
}

/// Classical probability of `event` over `space`.
pub fn classical<T, F>(space: &[T], event: F) -> Result<ClassicalProbability<T>>
where
    T: Clone + Ord,
    F: Fn(&T) -> bool,
{
    if space.is_empty() {
        return Err(Error::InputShape("sample space must not be empty".to_string()));
    }
    let mut favorable: Vec<T> = space.iter().filter(|x| event(x)).cloned().collect();
    favorable.sort();
    favorable.dedup();
    let probability = favorable.len() as f64 / space.len() as f64;
    Ok(ClassicalProbability { total: space.len(), favorable, probability })
}

/// Ordered outcomes of rolling `dice` dice with `faces` faces.
pub fn dice_space(dice: u32, faces: u32) -> Result<Vec<Vec<u32>>> {
    if dice == 0 || faces == 0 {
        return Err(Error::Validation("dice and faces must be at least 1".to_string()));
    }
    let size = sample_space_size(faces as u64, dice)?;
    if size > 1_000_000 {
        return Err(Error::Validation(format!("sample space of {} outcomes is too large", size)));
    }
    let mut space: Vec<Vec<u32>> = vec![Vec::new()];
    for _ in 0..dice {
        space = space
            .into_iter()
            .flat_map(|prefix| {
                (1..=faces).map(move |f| {
                    let mut next = prefix.clone();
                    next.push(f);
                    next
                })
            })
            .collect();
    }
    Ok(space)
}
