//! fuzzctl - single-input, single-output Mamdani fuzzy controller
//!
//! # Architecture
//!
//! - [`fuzzy::MembershipFunction`] - piecewise-linear curve over `(x, μ)` points
//! - [`fuzzy::LinguisticVariable`] - named terms over one universe
//! - [`fuzzy::RuleBase`] - ordered `IF input is A THEN output is B` rules
//! - [`fuzzy::InferenceEngine`] - max aggregation and first-of-maxima
//!   defuzzification
//! - [`parser`] - JSON documents to variables and rule bases
//! - [`config`] - TOML configuration with environment overrides
//!
//! # Features
//!
//! - Flat extrapolation outside a term's control points
//! - Vertical steps and plateaus in membership curves
//! - Configurable fallback when no rule fires
//! - Evaluation trace (per-rule strengths, per-term activations)
//! - Parallel batch evaluation
//!
//! # Example
//!
//! ```rust
//! use fuzzctl::parser::{engine_from_json, RuleKeys};
//!
//! let engine = engine_from_json(
//!     r#"{"cold": [[0, 1], [10, 0]], "hot": [[10, 0], [20, 1]]}"#,
//!     r#"{"low": [[0, 1], [5, 0]], "high": [[5, 0], [10, 1]]}"#,
//!     r#"{"rules": [{"if": "cold", "then": "low"}, {"if": "hot", "then": "high"}]}"#,
//!     &RuleKeys::default(),
//! )?;
//!
//! let eval = engine.evaluate(15.0)?;
//! assert_eq!(eval.winning_term(), Some("high"));
//! assert!((eval.output - 7.5).abs() < 1e-9);
//! # Ok::<(), fuzzctl::FuzzyError>(())
//! ```

pub mod config;
pub mod error;
pub mod fuzzy;
pub mod parser;

// Re-export fuzzy types
pub use fuzzy::{
    EngineConfig, Evaluation, FuzzyValue, InferenceEngine, LinguisticVariable, MembershipFunction,
    Outcome, Rule, RuleBase, RuleFiring, TermActivation, TermTable, DEFAULT_FALLBACK, EPSILON,
};

// Re-export parser types
pub use parser::{engine_from_json, parse_rules, parse_variable, run_controller, ParseError, RuleKeys};

// Re-export configuration types
pub use config::{ConfigError, FuzzConfig, LogLevel, OutputFormat};

// Re-export error types
pub use error::{ErrorCode, ErrorContext, FuzzyError, FuzzyResult};
