//! Rules and rule bases

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, FuzzyError, FuzzyResult};

/// IF input is `input_term` THEN output is `output_term`
///
/// Term names are not checked against any variable here; the engine does
/// that when it evaluates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    input_term: String,
    output_term: String,
}

impl Rule {
    pub fn new(input_term: impl Into<String>, output_term: impl Into<String>) -> Self {
        Self {
            input_term: input_term.into(),
            output_term: output_term.into(),
        }
    }

    /// The antecedent term, on the input variable
    pub fn input_term(&self) -> &str {
        &self.input_term
    }

    /// The consequent term, on the output variable
    pub fn output_term(&self) -> &str {
        &self.output_term
    }
}

/// An ordered, non-empty list of rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleBase {
    rules: Vec<Rule>,
}

impl RuleBase {
    /// Fails on an empty list or on a rule with a blank term name
    pub fn new(rules: Vec<Rule>) -> FuzzyResult<Self> {
        if rules.is_empty() {
            return Err(FuzzyError::new(ErrorCode::EmptyRuleBase, "rule base has no rules"));
        }

        for (index, rule) in rules.iter().enumerate() {
            let missing = if rule.input_term.trim().is_empty() {
                Some("antecedent")
            } else if rule.output_term.trim().is_empty() {
                Some("consequent")
            } else {
                None
            };
            if let Some(field) = missing {
                return Err(FuzzyError::new(
                    ErrorCode::MissingRuleField,
                    format!("rule #{} has an empty {} term", index, field),
                )
                .with_context("rule_index", index.to_string())
                .with_context("field", field));
            }
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleBase {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
