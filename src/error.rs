//! Structured error handling for fuzzctl
//!
//! Provides a single error type for every failure the controller can report:
//! - Error codes for programmatic handling
//! - Structured error output (JSON-friendly)
//! - Context preservation (term name, rule index, source location)
//!
//! # Error Categories
//!
//! - Malformed input (1xxx) - construction of variables and rule bases
//! - Evaluation (2xxx) - rules referencing terms the variables do not define
//! - Configuration (7xxx) - config file and environment problems
//! - Internal (9xxx)
//!
//! A rule base that fires nothing is *not* an error; see
//! [`Outcome::NoRuleFired`](crate::fuzzy::Outcome::NoRuleFired).
//!
//! # Example
//!
//! ```rust,ignore
//! use fuzzctl::error::{FuzzyError, ErrorCode};
//!
//! fn check_points(term: &str, points: &[(f64, f64)]) -> Result<(), FuzzyError> {
//!     if points.len() < 2 {
//!         return Err(FuzzyError::malformed("term needs at least two points")
//!             .with_code(ErrorCode::TooFewPoints)
//!             .with_context("term", term));
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Malformed input (1xxx)
    /// Generic malformed input
    MalformedInput = 1000,
    /// Document is not valid JSON
    InvalidJson = 1001,
    /// Document has the wrong shape (not an object / not a list)
    InvalidShape = 1002,
    /// Variable has no terms
    EmptyTermTable = 1003,
    /// Term has fewer than two control points
    TooFewPoints = 1004,
    /// Control point is not a pair of finite numbers
    InvalidPoint = 1005,
    /// Universe is not `[min, max]` with `min <= max`
    InvalidUniverse = 1006,
    /// Rule base has no rules
    EmptyRuleBase = 1007,
    /// Rule lacks its antecedent or consequent
    MissingRuleField = 1008,
    /// Term name declared twice
    DuplicateTerm = 1009,

    // Evaluation errors (2xxx)
    /// Rule names a term that its variable does not define
    UndefinedTermReference = 2001,

    // Config errors (7xxx)
    /// Generic config error
    ConfigError = 7000,
    /// Config file not found
    ConfigNotFound = 7001,
    /// Invalid config syntax
    InvalidConfigSyntax = 7002,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::MalformedInput => "Malformed input",
            ErrorCode::InvalidJson => "Invalid JSON document",
            ErrorCode::InvalidShape => "Unexpected document shape",
            ErrorCode::EmptyTermTable => "Empty term table",
            ErrorCode::TooFewPoints => "Too few control points",
            ErrorCode::InvalidPoint => "Invalid control point",
            ErrorCode::InvalidUniverse => "Invalid universe",
            ErrorCode::EmptyRuleBase => "Empty rule base",
            ErrorCode::MissingRuleField => "Missing rule field",
            ErrorCode::DuplicateTerm => "Duplicate term name",

            ErrorCode::UndefinedTermReference => "Undefined term reference",

            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::ConfigNotFound => "Configuration file not found",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",

            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Whether this code belongs to the malformed-input family
    pub fn is_malformed_input(&self) -> bool {
        (1000..2000).contains(&self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// Source location (file:line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Stack of error causes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field to the context
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for fuzzctl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FuzzyError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods for common error types
    // ========================================================================

    /// Create a malformed-input error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedInput, message)
    }

    /// Create an error for a rule naming a term its variable lacks
    pub fn undefined_term(role: &str, variable: &str, term: &str, rule_index: usize) -> Self {
        Self::new(
            ErrorCode::UndefinedTermReference,
            format!(
                "rule #{} references {} term '{}' which variable '{}' does not define",
                rule_index, role, term, variable
            ),
        )
        .with_context("term", term)
        .with_context("variable", variable)
        .with_context("role", role)
        .with_context("rule_index", rule_index.to_string())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.causes.push(cause.into());
        self
    }

    /// Add source location
    pub fn at(mut self, location: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.location = Some(location.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Look up a context field
    pub fn context_field(&self, key: &str) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|c| c.fields.get(key))
            .map(String::as_str)
    }

    /// True for construction-time failures
    pub fn is_malformed_input(&self) -> bool {
        self.code.is_malformed_input()
    }

    /// True when a rule references a term its variable does not define
    pub fn is_undefined_term(&self) -> bool {
        self.code == ErrorCode::UndefinedTermReference
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, self.message)
        })
    }
}

impl fmt::Display for FuzzyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            if let Some(ref loc) = ctx.location {
                write!(f, " at {}", loc)?;
            }
            if !ctx.causes.is_empty() {
                write!(f, "\nCaused by:")?;
                for cause in &ctx.causes {
                    write!(f, "\n  - {}", cause)?;
                }
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for FuzzyError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for FuzzyError {
    fn from(err: serde_json::Error) -> Self {
        FuzzyError::malformed(err.to_string())
            .with_code(ErrorCode::InvalidJson)
            .with_context("format", "JSON")
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// A Result type using FuzzyError
pub type FuzzyResult<T> = Result<T, FuzzyError>;

// ============================================================================
// Macros for convenient error creation
// ============================================================================

/// Create a FuzzyError with context from the current location
#[macro_export]
macro_rules! fuzzy_error {
    ($code:expr, $msg:expr) => {
        $crate::error::FuzzyError::new($code, $msg)
            .at(format!("{}:{}", file!(), line!()))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::FuzzyError::new($code, format!($fmt, $($arg)*))
            .at(format!("{}:{}", file!(), line!()))
    };
}

/// Bail out early with an error
#[macro_export]
macro_rules! fuzzy_bail {
    ($code:expr, $msg:expr) => {
        return Err($crate::fuzzy_error!($code, $msg))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::fuzzy_error!($code, $fmt, $($arg)*))
    };
}

/// Ensure a condition holds, or return an error
#[macro_export]
macro_rules! fuzzy_ensure {
    ($cond:expr, $code:expr, $msg:expr) => {
        if !$cond {
            $crate::fuzzy_bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::fuzzy_bail!($code, $fmt, $($arg)*);
        }
    };
}

// ============================================================================
// Tests
// ============================================================================
