//! JSON decoding for variables and rule bases
//!
//! Variable documents may list terms under `"terms"` or directly at the root,
//! next to an optional `"universe"` (or `"domain"`) bound:
//!
//! ```json
//! {"universe": [0, 40], "terms": {"cold": [[0, 1], [10, 0]], "hot": {"points": [[10, 0], [20, 1]]}}}
//! {"cold": [[0, 1], [10, 0]], "hot": [[10, 0], [20, 1]]}
//! ```
//!
//! Rule documents are a list of objects, or an object holding that list under
//! `"rules"`. Each rule names its input term under `"if"` (or the configured
//! input key) and its output term under `"then"` (or the output key):
//!
//! ```json
//! {"rules": [{"if": "cold", "then": "low"}, {"temperature": "hot", "heating": "high"}]}
//! ```

use serde_json::{Map, Value};

use crate::error::{ErrorCode, FuzzyError, FuzzyResult};
use crate::fuzzy::{InferenceEngine, LinguisticVariable, Rule, RuleBase, TermTable};

/// Keys that hold the universe bound
const UNIVERSE_KEYS: [&str; 2] = ["universe", "domain"];

/// Keys a term object may keep its points under
const POINT_KEYS: [&str; 3] = ["points", "mf", "vertices"];

/// Decoding error
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("{what} must be a JSON object")]
    NotAnObject { what: String },

    #[error("Variable '{variable}': universe/domain must be [min, max]")]
    InvalidUniverse { variable: String },

    #[error("Variable '{variable}': no terms found (expected a 'terms' object or terms at the root)")]
    NoTerms { variable: String },

    #[error("Term '{term}': points must be a list of at least 2 [x, mu] pairs")]
    InvalidTermEntry { term: String },

    #[error("Term '{term}': point #{index} must be [x, mu]")]
    InvalidPoint { term: String, index: usize },

    #[error("Rules must be a non-empty list (or an object with a 'rules' list)")]
    InvalidRuleList,

    #[error("Rule #{index} must be a JSON object")]
    RuleNotAnObject { index: usize },

    #[error("Rule #{index} has no {field} term")]
    MissingRuleField { index: usize, field: &'static str },
}

impl ParseError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ParseError::InvalidJson { .. } => ErrorCode::InvalidJson,
            ParseError::NotAnObject { .. } | ParseError::RuleNotAnObject { .. } => ErrorCode::InvalidShape,
            ParseError::InvalidUniverse { .. } => ErrorCode::InvalidUniverse,
            ParseError::NoTerms { .. } => ErrorCode::EmptyTermTable,
            ParseError::InvalidTermEntry { .. } => ErrorCode::TooFewPoints,
            ParseError::InvalidPoint { .. } => ErrorCode::InvalidPoint,
            ParseError::InvalidRuleList => ErrorCode::EmptyRuleBase,
            ParseError::MissingRuleField { .. } => ErrorCode::MissingRuleField,
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::InvalidJson { message: err.to_string() }
    }
}

impl From<ParseError> for FuzzyError {
    fn from(err: ParseError) -> Self {
        let mut out = FuzzyError::new(err.code(), err.to_string()).with_context("format", "JSON");
        match &err {
            ParseError::InvalidUniverse { variable } | ParseError::NoTerms { variable } => {
                out = out.with_context("variable", variable.as_str());
            }
            ParseError::InvalidTermEntry { term } => {
                out = out.with_context("term", term.as_str());
            }
            ParseError::InvalidPoint { term, index } => {
                out = out
                    .with_context("term", term.as_str())
                    .with_context("point_index", index.to_string())
                    .with_hint("Points are written as [x, mu] with numeric x and mu");
            }
            ParseError::RuleNotAnObject { index } => {
                out = out.with_context("rule_index", index.to_string());
            }
            ParseError::MissingRuleField { index, field } => {
                out = out
                    .with_context("rule_index", index.to_string())
                    .with_context("field", *field);
            }
            _ => {}
        }
        out
    }
}

/// Keys accepted for a rule's antecedent and consequent, besides `if`/`then`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleKeys {
    pub input: String,
    pub output: String,
}

impl RuleKeys {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

impl Default for RuleKeys {
    fn default() -> Self {
        Self::new("temperature", "heating")
    }
}

// ============================================================================
// Variables
// ============================================================================

/// Decode a variable document into a term table and optional universe
pub fn term_table_from_value(
    name: &str,
    value: &Value,
) -> Result<(TermTable, Option<(f64, f64)>), ParseError> {
    let object = value.as_object().ok_or_else(|| ParseError::NotAnObject {
        what: format!("Variable '{}'", name),
    })?;

    let universe = match UNIVERSE_KEYS.iter().find_map(|k| object.get(*k).filter(|v| !v.is_null())) {
        Some(bound) => Some(parse_universe(name, bound)?),
        None => None,
    };

    let terms: Map<String, Value> = match object.get("terms") {
        Some(Value::Object(terms)) => terms.clone(),
        Some(_) => return Err(ParseError::NoTerms { variable: name.to_string() }),
        None => object
            .iter()
            .filter(|(k, _)| !UNIVERSE_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    };
    if terms.is_empty() {
        return Err(ParseError::NoTerms { variable: name.to_string() });
    }

    let mut table = TermTable::new();
    for (term, entry) in &terms {
        table.insert(term.clone(), parse_points(term, entry)?);
    }

    Ok((table, universe))
}

fn parse_universe(variable: &str, value: &Value) -> Result<(f64, f64), ParseError> {
    let invalid = || ParseError::InvalidUniverse { variable: variable.to_string() };
    match value.as_array().map(Vec::as_slice) {
        Some([min, max]) => Ok((min.as_f64().ok_or_else(invalid)?, max.as_f64().ok_or_else(invalid)?)),
        _ => Err(invalid()),
    }
}

fn parse_points(term: &str, entry: &Value) -> Result<Vec<(f64, f64)>, ParseError> {
    let points = match entry {
        Value::Object(fields) => POINT_KEYS
            .iter()
            .find_map(|k| fields.get(*k).filter(|v| !is_blank(v))),
        other => Some(other),
    };
    let points = match points.and_then(Value::as_array) {
        Some(points) if points.len() >= 2 => points,
        _ => return Err(ParseError::InvalidTermEntry { term: term.to_string() }),
    };

    points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let invalid = || ParseError::InvalidPoint { term: term.to_string(), index };
            match point.as_array().map(Vec::as_slice) {
                Some([x, mu]) => Ok((x.as_f64().ok_or_else(invalid)?, mu.as_f64().ok_or_else(invalid)?)),
                _ => Err(invalid()),
            }
        })
        .collect()
}

/// Null or an empty list, skipped in favour of the next alias
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Build a variable from an already-decoded JSON value
pub fn variable_from_value(name: &str, value: &Value) -> FuzzyResult<LinguisticVariable> {
    let (table, universe) = term_table_from_value(name, value)?;
    LinguisticVariable::from_terms(name, table, universe)
}

/// Build a variable from a JSON document
pub fn parse_variable(name: &str, json: &str) -> FuzzyResult<LinguisticVariable> {
    let value: Value = serde_json::from_str(json).map_err(ParseError::from)?;
    variable_from_value(name, &value)
}

// ============================================================================
// Rules
// ============================================================================

/// Decode a rule document into rules, without building the rule base
pub fn rule_list_from_value(value: &Value, keys: &RuleKeys) -> Result<Vec<Rule>, ParseError> {
    let list = match value {
        Value::Object(object) => object.get("rules").and_then(Value::as_array),
        Value::Array(list) => Some(list),
        _ => None,
    };
    let list = match list {
        Some(list) if !list.is_empty() => list,
        _ => return Err(ParseError::InvalidRuleList),
    };

    list.iter()
        .enumerate()
        .map(|(index, entry)| {
            let fields = entry.as_object().ok_or(ParseError::RuleNotAnObject { index })?;
            let input = rule_field(fields, &["if", keys.input.as_str()])
                .ok_or(ParseError::MissingRuleField { index, field: "antecedent" })?;
            let output = rule_field(fields, &["then", keys.output.as_str()])
                .ok_or(ParseError::MissingRuleField { index, field: "consequent" })?;
            Ok(Rule::new(input, output))
        })
        .collect()
}

/// First non-empty string among `keys`
fn rule_field<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| fields.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

/// Build a rule base from an already-decoded JSON value
pub fn rules_from_value(value: &Value, keys: &RuleKeys) -> FuzzyResult<RuleBase> {
    RuleBase::new(rule_list_from_value(value, keys)?)
}

/// Build a rule base from a JSON document
pub fn parse_rules(json: &str, keys: &RuleKeys) -> FuzzyResult<RuleBase> {
    let value: Value = serde_json::from_str(json).map_err(ParseError::from)?;
    rules_from_value(&value, keys)
}

// ============================================================================
// One-shot entry points
// ============================================================================

/// Build an engine from three JSON documents
///
/// The engine is validated before it is returned, so a rule naming an
/// undefined term fails here.
pub fn engine_from_json(
    input_json: &str,
    output_json: &str,
    rules_json: &str,
    keys: &RuleKeys,
) -> FuzzyResult<InferenceEngine> {
    let input = parse_variable(&keys.input, input_json)?;
    let output = parse_variable(&keys.output, output_json)?;
    let rules = parse_rules(rules_json, keys)?;

    let engine = InferenceEngine::new(input, output, rules);
    engine.validate()?;
    tracing::debug!(
        input = engine.input().name(),
        output = engine.output().name(),
        rules = engine.rules().len(),
        "engine built"
    );
    Ok(engine)
}

/// Decode the three documents and evaluate a single input
///
/// ```rust
/// let heating = fuzzctl::parser::run_controller(
///     r#"{"cold": [[0, 1], [10, 0]], "hot": [[10, 0], [20, 1]]}"#,
///     r#"{"low": [[0, 1], [5, 0]], "high": [[5, 0], [10, 1]]}"#,
///     r#"[{"if": "cold", "then": "low"}, {"if": "hot", "then": "high"}]"#,
///     2.0,
/// )?;
/// assert!((heating - 1.0).abs() < 1e-9);
/// # Ok::<(), fuzzctl::FuzzyError>(())
/// ```
pub fn run_controller(input_json: &str, output_json: &str, rules_json: &str, x0: f64) -> FuzzyResult<f64> {
    engine_from_json(input_json, output_json, rules_json, &RuleKeys::default())?.crisp(x0)
}
