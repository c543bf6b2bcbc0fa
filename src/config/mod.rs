//! Configuration for fuzzctl
//!
//! Provides:
//! - TOML configuration files
//! - Environment variable overrides
//! - Multiple config file locations
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./fuzzctl.toml` - Project-local configuration
//! 2. `~/.config/fuzzctl/config.toml` - User configuration (XDG)
//! 3. `~/.fuzzctl/config.toml` - User configuration (legacy)
//! 4. `/etc/fuzzctl/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `FUZZCTL_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `FUZZCTL_FORMAT` - Output format (text, json)
//! - `FUZZCTL_FALLBACK` - Output when no rule fires
//! - `FUZZCTL_PARALLEL` - Evaluate batches in parallel (true/false)
//! - `FUZZCTL_INPUT_KEY` - Rule key naming the input term
//! - `FUZZCTL_OUTPUT_KEY` - Rule key naming the output term
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! log_level = "normal"
//! format = "text"
//! precision = 6
//!
//! [engine]
//! fallback = 0.0
//!
//! [rules]
//! input_key = "temperature"
//! output_key = "heating"
//!
//! [batch]
//! parallel = true
//! min_parallel_len = 64
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, FuzzyError};
use crate::fuzzy::{EngineConfig, DEFAULT_FALLBACK};
use crate::parser::RuleKeys;

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FuzzConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Inference settings
    pub engine: EngineSection,
    /// Rule document keys
    pub rules: RulesConfig,
    /// Batch evaluation
    pub batch: BatchConfig,
}

/// General configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level
    pub log_level: LogLevel,
    /// Output format (text, json)
    pub format: OutputFormat,
    /// Decimal places in text output
    pub precision: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Normal,
            format: OutputFormat::Text,
            precision: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Output returned when no rule fires
    pub fallback: f64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self { fallback: DEFAULT_FALLBACK }
    }
}

/// Keys accepted in rule objects besides `if` / `then`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub input_key: String,
    pub output_key: String,
}

impl Default for RulesConfig {
    fn default() -> Self {
        let keys = RuleKeys::default();
        Self {
            input_key: keys.input,
            output_key: keys.output,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Evaluate batches on the rayon thread pool
    pub parallel: bool,
    /// Shorter batches run sequentially
    pub min_parallel_len: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            parallel: engine.parallel,
            min_parallel_len: engine.min_parallel_len,
        }
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// `tracing` filter directive for this level
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "warn",
            LogLevel::Verbose => "info",
            LogLevel::Debug => "debug",
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl FuzzConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from default locations, then apply environment
    /// variable overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for path in Self::config_paths() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config");
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<string>"), e.to_string()))
    }

    /// Get the list of config file search paths
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./fuzzctl.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("fuzzctl").join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".fuzzctl").join("config.toml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/fuzzctl/config.toml"));

        paths
    }

    /// Apply `FUZZCTL_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any key lookup; unparsable values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("FUZZCTL_LOG_LEVEL") {
            if let Some(level) = LogLevel::from_str(&val) {
                self.general.log_level = level;
            }
        }

        if let Some(val) = lookup("FUZZCTL_FORMAT") {
            if let Some(format) = OutputFormat::from_str(&val) {
                self.general.format = format;
            }
        }

        if let Some(val) = lookup("FUZZCTL_FALLBACK") {
            match val.parse::<f64>() {
                Ok(fallback) if fallback.is_finite() => self.engine.fallback = fallback,
                _ => tracing::warn!(value = %val, "ignoring FUZZCTL_FALLBACK"),
            }
        }

        if let Some(val) = lookup("FUZZCTL_PARALLEL") {
            self.batch.parallel = val == "true" || val == "1" || val == "yes";
        }

        if let Some(val) = lookup("FUZZCTL_INPUT_KEY") {
            if !val.trim().is_empty() {
                self.rules.input_key = val;
            }
        }

        if let Some(val) = lookup("FUZZCTL_OUTPUT_KEY") {
            if !val.trim().is_empty() {
                self.rules.output_key = val;
            }
        }
    }

    /// Engine settings carried by this configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            fallback: self.engine.fallback,
            parallel: self.batch.parallel,
            min_parallel_len: self.batch.min_parallel_len,
        }
    }

    pub fn rule_keys(&self) -> RuleKeys {
        RuleKeys::new(self.rules.input_key.as_str(), self.rules.output_key.as_str())
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Write configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))
    }

    /// Generate a default configuration file content
    pub fn default_config_content() -> &'static str {
        r#"# fuzzctl configuration file

[general]
# Logging level: quiet, normal, verbose, debug
log_level = "normal"
# Output format: text, json
format = "text"
# Decimal places in text output
precision = 6

[engine]
# Output returned when no rule fires
fallback = 0.0

[rules]
# Keys accepted in rule objects besides "if" / "then"
input_key = "temperature"
output_key = "heating"

[batch]
# Evaluate many inputs on a thread pool
parallel = true
# Batches shorter than this are evaluated sequentially
min_parallel_len = 64
"#
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// IO error reading/writing config file
    IoError(PathBuf, String),
    /// Parse error in config file
    ParseError(PathBuf, String),
    /// Serialization error
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, msg) => {
                write!(f, "IO error reading {}: {}", path.display(), msg)
            }
            ConfigError::ParseError(path, msg) => {
                write!(f, "Parse error in {}: {}", path.display(), msg)
            }
            ConfigError::SerializeError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for FuzzyError {
    fn from(err: ConfigError) -> Self {
        let message = err.to_string();
        match err {
            ConfigError::IoError(path, _) => FuzzyError::config(message)
                .with_code(ErrorCode::ConfigNotFound)
                .with_context("path", path.display().to_string()),
            ConfigError::ParseError(path, _) => FuzzyError::config(message)
                .with_code(ErrorCode::InvalidConfigSyntax)
                .with_context("path", path.display().to_string())
                .with_hint("Run `fuzzctl --init-config` for a commented template"),
            ConfigError::SerializeError(_) => FuzzyError::config(message),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
