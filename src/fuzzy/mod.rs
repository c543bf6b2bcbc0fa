//! Mamdani fuzzy inference
//!
//! This module provides the single-input, single-output controller core:
//! - Piecewise-linear membership functions
//! - Linguistic variables (named term tables over one universe)
//! - Rule bases mapping input terms to output terms
//! - Max aggregation and first-of-maxima defuzzification
//!
//! Every value here is immutable once built, so one [`InferenceEngine`] can
//! be shared by any number of threads without locking.
//!
//! # Example
//!
//! ```rust
//! use fuzzctl::fuzzy::{InferenceEngine, LinguisticVariable, Rule, RuleBase};
//!
//! let temperature = LinguisticVariable::from_terms(
//!     "temperature",
//!     vec![
//!         ("cold", vec![(0.0, 1.0), (10.0, 0.0)]),
//!         ("hot", vec![(10.0, 0.0), (20.0, 1.0)]),
//!     ],
//!     None,
//! )?;
//! let heating = LinguisticVariable::from_terms(
//!     "heating",
//!     vec![
//!         ("low", vec![(0.0, 1.0), (5.0, 0.0)]),
//!         ("high", vec![(5.0, 0.0), (10.0, 1.0)]),
//!     ],
//!     None,
//! )?;
//! let rules = RuleBase::new(vec![Rule::new("cold", "low"), Rule::new("hot", "high")])?;
//!
//! let engine = InferenceEngine::new(temperature, heating, rules);
//! let level = engine.crisp(2.0)?;
//! assert!((level - 1.0).abs() < 1e-9);
//! # Ok::<(), fuzzctl::FuzzyError>(())
//! ```

pub mod membership;
pub mod variable;
pub mod rules;
pub mod engine;

pub use membership::{FuzzyValue, MembershipFunction};
pub use variable::{LinguisticVariable, TermTable};
pub use rules::{Rule, RuleBase};
pub use engine::{
    EngineConfig, Evaluation, InferenceEngine, Outcome, RuleFiring, TermActivation,
    DEFAULT_FALLBACK,
};

use crate::error::FuzzyResult;

/// Tolerance for every float comparison in segment search
pub const EPSILON: f64 = 1e-12;

/// Approximate equality under [`EPSILON`]
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Build a linguistic variable from a term table and an optional universe
pub fn build_variable<I, S>(
    name: &str,
    terms: I,
    universe: Option<(f64, f64)>,
) -> FuzzyResult<LinguisticVariable>
where
    I: IntoIterator<Item = (S, Vec<(f64, f64)>)>,
    S: Into<String>,
{
    LinguisticVariable::from_terms(name, terms, universe)
}

/// Build a rule base from `(input term, output term)` pairs
pub fn build_rule_base<I, A, B>(rules: I) -> FuzzyResult<RuleBase>
where
    I: IntoIterator<Item = (A, B)>,
    A: Into<String>,
    B: Into<String>,
{
    RuleBase::new(rules.into_iter().map(|(a, b)| Rule::new(a, b)).collect())
}

/// Evaluate one crisp input
pub fn evaluate(engine: &InferenceEngine, crisp_input: f64) -> FuzzyResult<Evaluation> {
    engine.evaluate(crisp_input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(0.1 + 0.2, 0.3));
        assert!(!approx_eq(0.3, 0.3 + 1e-9));
    }

    #[test]
    fn test_free_function_entry_points() {
        let input = build_variable("t", vec![("cold", vec![(0.0, 1.0), (10.0, 0.0)])], None).unwrap();
        let output = build_variable("h", vec![("low", vec![(0.0, 1.0), (5.0, 0.0)])], None).unwrap();
        let rules = build_rule_base(vec![("cold", "low")]).unwrap();
        let engine = InferenceEngine::new(input, output, rules);

        let eval = evaluate(&engine, 2.0).unwrap();
        assert!((eval.output - 1.0).abs() < 1e-9);
    }
}
