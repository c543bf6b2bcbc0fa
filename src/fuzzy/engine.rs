//! Mamdani evaluation with first-of-maxima defuzzification
//!
//! # Algorithm
//!
//! ```text
//! for each rule (in → out):
//!     strength = input[in].degree(x0)          dropped if <= 0
//! for each output term:
//!     level = max(strength of rules targeting it)
//!     candidate = leftmost x where output[term] reaches level
//! result = candidate of the term with the highest level
//!          (ties: smallest candidate), or the fallback if nothing fired
//! ```
//!
//! Every rule is checked against both variables before any membership is
//! computed, so a dangling term name fails the evaluation even when the rule
//! would not have fired.

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;

use super::{approx_eq, FuzzyValue, LinguisticVariable, RuleBase};
use crate::error::{FuzzyError, FuzzyResult};

/// Crisp output when no rule fires
pub const DEFAULT_FALLBACK: f64 = 0.0;

/// Engine settings
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Output returned when no rule fires
    pub fallback: f64,
    /// Evaluate batches on the rayon thread pool
    pub parallel: bool,
    /// Batches shorter than this run sequentially
    pub min_parallel_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            fallback: DEFAULT_FALLBACK,
            parallel: true,
            min_parallel_len: 64,
        }
    }
}

/// One rule's firing strength for an input
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RuleFiring {
    pub rule_index: usize,
    pub input_term: String,
    pub output_term: String,
    pub strength: f64,
}

/// Aggregated activation of one output term
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TermActivation {
    pub term: String,
    /// Max strength over the rules targeting this term
    pub level: f64,
    /// Where the term's curve reaches `level`; `None` excludes the term
    pub candidate: Option<f64>,
}

/// How the crisp output was chosen
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Output taken from this term at this activation level
    Fired { term: String, level: f64 },
    /// No rule fired; the output is the fallback value
    NoRuleFired,
}

/// Result of evaluating one crisp input
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Evaluation {
    pub input: f64,
    pub output: f64,
    pub outcome: Outcome,
    /// Every rule with a positive firing strength, in rule order
    pub firings: Vec<RuleFiring>,
    /// Activated output terms, in order of first activation
    pub activations: Vec<TermActivation>,
}

impl Evaluation {
    pub fn fired(&self) -> bool {
        matches!(self.outcome, Outcome::Fired { .. })
    }

    /// Name of the output term the result came from
    pub fn winning_term(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Fired { term, .. } => Some(term),
            Outcome::NoRuleFired => None,
        }
    }
}

/// Single-input, single-output Mamdani controller
///
/// Holds no mutable state; `evaluate` is a pure function of the input and
/// the three immutable parts, so one engine can serve concurrent callers.
#[derive(Clone, Debug)]
pub struct InferenceEngine {
    input: LinguisticVariable,
    output: LinguisticVariable,
    rules: RuleBase,
    config: EngineConfig,
}

impl InferenceEngine {
    pub fn new(input: LinguisticVariable, output: LinguisticVariable, rules: RuleBase) -> Self {
        Self::with_config(input, output, rules, EngineConfig::default())
    }

    pub fn with_config(
        input: LinguisticVariable,
        output: LinguisticVariable,
        rules: RuleBase,
        config: EngineConfig,
    ) -> Self {
        InferenceEngine {
            input,
            output,
            rules,
            config,
        }
    }

    pub fn input(&self) -> &LinguisticVariable {
        &self.input
    }

    pub fn output(&self) -> &LinguisticVariable {
        &self.output
    }

    pub fn rules(&self) -> &RuleBase {
        &self.rules
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check that every rule names terms its variables define
    ///
    /// Reports the first offending rule, input side before output side.
    pub fn validate(&self) -> FuzzyResult<()> {
        for (index, rule) in self.rules.iter().enumerate() {
            if !self.input.contains_term(rule.input_term()) {
                return Err(FuzzyError::undefined_term(
                    "input",
                    self.input.name(),
                    rule.input_term(),
                    index,
                ));
            }
            if !self.output.contains_term(rule.output_term()) {
                return Err(FuzzyError::undefined_term(
                    "output",
                    self.output.name(),
                    rule.output_term(),
                    index,
                ));
            }
        }
        Ok(())
    }

    /// Evaluate one crisp input
    pub fn evaluate(&self, x0: f64) -> FuzzyResult<Evaluation> {
        self.validate()?;

        // Firing strengths
        let mut firings = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            let strength = match self.input.term(rule.input_term()) {
                Some(mf) => FuzzyValue::new(mf.degree(x0)),
                None => continue,
            };
            tracing::trace!(rule = index, term = rule.input_term(), strength = strength.value(), "rule strength");
            if strength.is_zero() {
                continue;
            }
            firings.push(RuleFiring {
                rule_index: index,
                input_term: rule.input_term().to_string(),
                output_term: rule.output_term().to_string(),
                strength: strength.value(),
            });
        }

        // Max aggregation per output term
        let mut levels: IndexMap<&str, FuzzyValue> = IndexMap::new();
        for firing in &firings {
            let level = levels
                .entry(firing.output_term.as_str())
                .or_insert_with(FuzzyValue::default);
            *level = level.or(&FuzzyValue::new(firing.strength));
        }

        // Candidate per term
        let mut activations = Vec::with_capacity(levels.len());
        for (term, level) in &levels {
            let Some(mf) = self.output.term(term) else {
                continue;
            };
            let candidate = mf.leftmost_reaching(level.value());
            if candidate.is_none() {
                tracing::warn!(
                    variable = self.output.name(),
                    term = %term,
                    level = level.value(),
                    height = mf.height(),
                    "output term never reaches its activation level; excluded"
                );
            }
            activations.push(TermActivation {
                term: term.to_string(),
                level: level.value(),
                candidate,
            });
        }

        // Highest level wins, smallest x breaks ties
        let mut best: Option<(&TermActivation, f64)> = None;
        for activation in &activations {
            let Some(x) = activation.candidate else {
                continue;
            };
            best = match best {
                None => Some((activation, x)),
                Some((current, current_x)) => {
                    let better = if approx_eq(activation.level, current.level) {
                        x < current_x
                    } else {
                        activation.level > current.level
                    };
                    if better {
                        Some((activation, x))
                    } else {
                        Some((current, current_x))
                    }
                }
            };
        }

        let (output, outcome) = match best {
            Some((activation, x)) => (
                x,
                Outcome::Fired {
                    term: activation.term.clone(),
                    level: activation.level,
                },
            ),
            None => {
                tracing::info!(
                    input = x0,
                    fallback = self.config.fallback,
                    "no rule fired; returning fallback output"
                );
                (self.config.fallback, Outcome::NoRuleFired)
            }
        };

        tracing::debug!(input = x0, output, fired = firings.len(), "evaluated");

        Ok(Evaluation {
            input: x0,
            output,
            outcome,
            firings,
            activations,
        })
    }

    /// Evaluate and return only the crisp output
    pub fn crisp(&self, x0: f64) -> FuzzyResult<f64> {
        self.evaluate(x0).map(|e| e.output)
    }

    /// Evaluate many inputs, keeping their order
    pub fn evaluate_batch(&self, inputs: &[f64]) -> Vec<FuzzyResult<Evaluation>> {
        if self.config.parallel && inputs.len() >= self.config.min_parallel_len {
            inputs.par_iter().map(|&x| self.evaluate(x)).collect()
        } else {
            inputs.iter().map(|&x| self.evaluate(x)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::fuzzy::Rule;

    fn temperature() -> LinguisticVariable {
        LinguisticVariable::from_terms(
            "temperature",
            vec![
                ("cold", vec![(0.0, 1.0), (10.0, 0.0)]),
                ("hot", vec![(10.0, 0.0), (20.0, 1.0)]),
            ],
            None,
        )
        .unwrap()
    }

    fn heating() -> LinguisticVariable {
        LinguisticVariable::from_terms(
            "heating",
            vec![
                ("low", vec![(0.0, 1.0), (5.0, 0.0)]),
                ("high", vec![(5.0, 0.0), (10.0, 1.0)]),
            ],
            None,
        )
        .unwrap()
    }

    fn engine(rules: Vec<Rule>) -> InferenceEngine {
        InferenceEngine::new(temperature(), heating(), RuleBase::new(rules).unwrap())
    }

    fn thermostat() -> InferenceEngine {
        engine(vec![Rule::new("cold", "low"), Rule::new("hot", "high")])
    }

    #[test]
    fn test_end_to_end_cold_input() {
        let eval = thermostat().evaluate(2.0).unwrap();

        assert!((eval.output - 1.0).abs() < 1e-9);
        assert_eq!(eval.winning_term(), Some("low"));
        assert_eq!(eval.firings.len(), 1);
        assert!((eval.firings[0].strength - 0.8).abs() < 1e-12);
        assert_eq!(eval.activations.len(), 1);
        assert_eq!(eval.activations[0].term, "low");
    }

    #[test]
    fn test_end_to_end_hot_input() {
        // hot.degree(15) = 0.5, high reaches 0.5 at x = 7.5
        let eval = thermostat().evaluate(15.0).unwrap();
        assert!((eval.output - 7.5).abs() < 1e-9);
        assert_eq!(eval.winning_term(), Some("high"));
    }

    #[test]
    fn test_flat_topped_falling_term_uses_crossing() {
        let output = LinguisticVariable::from_terms(
            "heating",
            vec![("low", vec![(0.0, 1.0), (3.0, 1.0), (8.0, 0.0)])],
            None,
        )
        .unwrap();
        let rules = RuleBase::new(vec![Rule::new("cold", "low")]).unwrap();
        let eval = InferenceEngine::new(temperature(), output, rules).evaluate(2.0).unwrap();

        // cold = 0.8 at 2; low falls through 0.8 at x = 4, not at its first point
        assert_eq!(eval.activations[0].candidate.map(|x| (x - 4.0).abs() < 1e-9), Some(true));
        assert!((eval.output - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_aggregation_for_shared_consequent() {
        let input = LinguisticVariable::from_terms(
            "x",
            vec![
                ("a", vec![(0.0, 0.3), (10.0, 0.3)]),
                ("b", vec![(0.0, 0.7), (10.0, 0.7)]),
            ],
            None,
        )
        .unwrap();
        let output = LinguisticVariable::from_terms(
            "y",
            vec![("up", vec![(0.0, 0.0), (10.0, 1.0)])],
            None,
        )
        .unwrap();
        let rules = RuleBase::new(vec![Rule::new("a", "up"), Rule::new("b", "up")]).unwrap();
        let eval = InferenceEngine::new(input, output, rules).evaluate(5.0).unwrap();

        assert_eq!(eval.activations.len(), 1);
        assert!((eval.activations[0].level - 0.7).abs() < 1e-12);
        assert!((eval.output - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_highest_level_term_wins() {
        // At x0 = 4: cold = 0.6, warm = 0.4
        let input = LinguisticVariable::from_terms(
            "temperature",
            vec![
                ("cold", vec![(0.0, 1.0), (10.0, 0.0)]),
                ("warm", vec![(0.0, 0.0), (10.0, 1.0)]),
            ],
            None,
        )
        .unwrap();
        let rules = RuleBase::new(vec![Rule::new("warm", "high"), Rule::new("cold", "low")]).unwrap();
        let eval = InferenceEngine::new(input, heating(), rules).evaluate(4.0).unwrap();

        assert_eq!(eval.winning_term(), Some("low"));
        // low reaches 0.6 at x = 2
        assert!((eval.output - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_tie_takes_smallest_candidate() {
        // At x0 = 5 both terms fire at 0.5
        let input = LinguisticVariable::from_terms(
            "temperature",
            vec![
                ("cold", vec![(0.0, 1.0), (10.0, 0.0)]),
                ("warm", vec![(0.0, 0.0), (10.0, 1.0)]),
            ],
            None,
        )
        .unwrap();
        let rules = RuleBase::new(vec![Rule::new("warm", "high"), Rule::new("cold", "low")]).unwrap();
        let eval = InferenceEngine::new(input, heating(), rules).evaluate(5.0).unwrap();

        // high reaches 0.5 at 7.5, low at 2.5
        assert_eq!(eval.winning_term(), Some("low"));
        assert!((eval.output - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_rule_order_does_not_matter() {
        let forward = thermostat();
        let reversed = engine(vec![Rule::new("hot", "high"), Rule::new("cold", "low")]);
        for &x in &[-3.0, 0.0, 2.0, 9.5, 10.0, 12.0, 20.0, 40.0] {
            assert_eq!(forward.crisp(x).unwrap(), reversed.crisp(x).unwrap());
        }
    }

    #[test]
    fn test_no_rule_fired_returns_fallback() {
        // cold and hot are both zero at exactly 10
        let eval = thermostat().evaluate(10.0).unwrap();
        assert_eq!(eval.output, 0.0);
        assert_eq!(eval.outcome, Outcome::NoRuleFired);
        assert!(!eval.fired());
        assert!(eval.firings.is_empty());
    }

    #[test]
    fn test_custom_fallback() {
        let config = EngineConfig {
            fallback: -1.0,
            ..EngineConfig::default()
        };
        let rules = RuleBase::new(vec![Rule::new("cold", "low")]).unwrap();
        let engine = InferenceEngine::with_config(temperature(), heating(), rules, config);
        assert_eq!(engine.crisp(50.0).unwrap(), -1.0);
    }

    #[test]
    fn test_unreachable_term_is_excluded() {
        let output = LinguisticVariable::from_terms(
            "heating",
            vec![
                ("low", vec![(0.0, 1.0), (5.0, 0.0)]),
                ("weak", vec![(0.0, 0.0), (5.0, 0.2), (10.0, 0.0)]),
            ],
            None,
        )
        .unwrap();
        let rules = RuleBase::new(vec![Rule::new("cold", "weak"), Rule::new("cold", "low")]).unwrap();
        let eval = InferenceEngine::new(temperature(), output, rules).evaluate(0.0).unwrap();

        let weak = eval.activations.iter().find(|a| a.term == "weak").unwrap();
        assert_eq!(weak.candidate, None);
        assert_eq!(eval.winning_term(), Some("low"));
        assert_eq!(eval.output, 0.0);
    }

    #[test]
    fn test_only_unreachable_terms_means_no_fire() {
        let output = LinguisticVariable::from_terms(
            "heating",
            vec![("weak", vec![(0.0, 0.0), (5.0, 0.2), (10.0, 0.0)])],
            None,
        )
        .unwrap();
        let rules = RuleBase::new(vec![Rule::new("cold", "weak")]).unwrap();
        let eval = InferenceEngine::new(temperature(), output, rules).evaluate(0.0).unwrap();
        assert_eq!(eval.outcome, Outcome::NoRuleFired);
        assert_eq!(eval.output, 0.0);
    }

    #[test]
    fn test_undefined_input_term() {
        let err = engine(vec![Rule::new("cold", "low"), Rule::new("warm", "high")])
            .evaluate(2.0)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UndefinedTermReference);
        assert_eq!(err.context_field("term"), Some("warm"));
        assert_eq!(err.context_field("rule_index"), Some("1"));
        assert_eq!(err.context_field("role"), Some("input"));
    }

    #[test]
    fn test_undefined_output_term_even_when_not_firing() {
        // hot does not fire at 2, the bad consequent is still reported
        let err = engine(vec![Rule::new("cold", "low"), Rule::new("hot", "max")])
            .evaluate(2.0)
            .unwrap_err();
        assert!(err.is_undefined_term());
        assert_eq!(err.context_field("term"), Some("max"));
        assert_eq!(err.context_field("role"), Some("output"));
        assert_eq!(err.context_field("variable"), Some("heating"));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let engine = thermostat();
        let first = engine.evaluate(13.7).unwrap();
        let second = engine.evaluate(13.7).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_batch_keeps_order() {
        let config = EngineConfig {
            parallel: true,
            min_parallel_len: 1,
            ..EngineConfig::default()
        };
        let rules = RuleBase::new(vec![Rule::new("cold", "low"), Rule::new("hot", "high")]).unwrap();
        let engine = InferenceEngine::with_config(temperature(), heating(), rules, config);

        let inputs: Vec<f64> = (0..200).map(|i| i as f64 * 0.1).collect();
        let results = engine.evaluate_batch(&inputs);
        assert_eq!(results.len(), inputs.len());
        for (x, result) in inputs.iter().zip(&results) {
            let eval = result.as_ref().unwrap();
            assert_eq!(eval.input, *x);
            assert_eq!(eval.output, engine.crisp(*x).unwrap());
        }
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InferenceEngine>();
        assert_send_sync::<LinguisticVariable>();
        assert_send_sync::<RuleBase>();
    }

    #[test]
    fn test_outcome_serializes_with_kind_tag() {
        let eval = thermostat().evaluate(10.0).unwrap();
        let json = serde_json::to_value(&eval).unwrap();
        assert_eq!(json["outcome"]["kind"], "no_rule_fired");
        assert_eq!(json["output"], 0.0);
    }
}
