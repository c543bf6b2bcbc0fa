//! fuzzctl - Mamdani fuzzy controller
//!
//! Command-line interface: decode the input variable, output variable and
//! rule base from JSON files, then evaluate one or more crisp inputs.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use fuzzctl::config::{FuzzConfig, LogLevel, OutputFormat as ConfigFormat};
use fuzzctl::parser::{parse_rules, parse_variable, RuleKeys};
use fuzzctl::{Evaluation, InferenceEngine, Outcome};

#[derive(Parser)]
#[command(name = "fuzzctl")]
#[command(version)]
#[command(about = "Single-input Mamdani fuzzy controller with first-of-maxima defuzzification", long_about = None)]
struct Cli {
    /// Crisp input values to evaluate
    #[arg(value_name = "VALUE", allow_negative_numbers = true)]
    values: Vec<f64>,

    /// Input variable (JSON term table)
    #[arg(long = "input-var", value_name = "FILE", required_unless_present = "init_config")]
    input_var: Option<PathBuf>,

    /// Output variable (JSON term table)
    #[arg(long = "output-var", value_name = "FILE", required_unless_present = "init_config")]
    output_var: Option<PathBuf>,

    /// Rule base (JSON)
    #[arg(long, value_name = "FILE", required_unless_present = "init_config")]
    rules: Option<PathBuf>,

    /// Name of the input variable, also accepted as a rule key
    #[arg(long = "input-name", value_name = "NAME")]
    input_name: Option<String>,

    /// Name of the output variable, also accepted as a rule key
    #[arg(long = "output-name", value_name = "NAME")]
    output_name: Option<String>,

    /// Read whitespace-separated input values from stdin
    #[arg(long)]
    stdin: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Print rule strengths and term activations
    #[arg(long)]
    explain: bool,

    /// Configuration file (defaults to the standard search path)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a default configuration file and exit
    #[arg(long = "init-config")]
    init_config: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One line per input
    Text,
    /// JSON array of evaluations
    Json,
}

impl From<ConfigFormat> for OutputFormat {
    fn from(format: ConfigFormat) -> Self {
        match format {
            ConfigFormat::Text => OutputFormat::Text,
            ConfigFormat::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.init_config {
        print!("{}", FuzzConfig::default_config_content());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => {
            let mut config = FuzzConfig::load_from_file(path)?;
            config.apply_env_overrides();
            config
        }
        None => FuzzConfig::load()?,
    };

    init_logging(&cli, config.general.log_level);

    let keys = RuleKeys::new(
        cli.input_name.clone().unwrap_or_else(|| config.rules.input_key.clone()),
        cli.output_name.clone().unwrap_or_else(|| config.rules.output_key.clone()),
    );

    let engine = build_engine(&cli, &config, &keys)?;

    let mut values = cli.values.clone();
    if cli.stdin {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read from stdin")?;
        for token in content.split_whitespace() {
            let value: f64 = token
                .parse()
                .with_context(|| format!("Not a number on stdin: {:?}", token))?;
            values.push(value);
        }
    }
    if values.is_empty() {
        anyhow::bail!("No input values given (pass VALUE arguments or --stdin)");
    }

    let evaluations = engine
        .evaluate_batch(&values)
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(inputs = evaluations.len(), "evaluation finished");

    let format = cli.format.unwrap_or_else(|| config.general.format.into());
    let output_content = match format {
        OutputFormat::Text => format_text(&evaluations, config.general.precision, cli.explain),
        OutputFormat::Json => format_json(&evaluations, cli.explain)?,
    };

    if let Some(output_path) = cli.output {
        fs::write(&output_path, output_content)
            .with_context(|| format!("Failed to write to: {}", output_path.display()))?;
    } else {
        io::stdout()
            .write_all(output_content.as_bytes())
            .context("Failed to write to stdout")?;
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise -q / -v, then the configured level
fn init_logging(cli: &Cli, configured: LogLevel) {
    let level = if cli.quiet {
        LogLevel::Quiet
    } else if cli.verbose {
        LogLevel::Verbose
    } else {
        configured
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.filter_directive())),
        )
        .with_writer(io::stderr)
        .init();
}

fn read_document(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {} file: {}", what, path.display()))
}

fn build_engine(cli: &Cli, config: &FuzzConfig, keys: &RuleKeys) -> Result<InferenceEngine> {
    // clap enforces these unless --init-config, which returned earlier
    let (Some(input_path), Some(output_path), Some(rules_path)) =
        (&cli.input_var, &cli.output_var, &cli.rules)
    else {
        anyhow::bail!("--input-var, --output-var and --rules are required");
    };

    let input = parse_variable(&keys.input, &read_document(input_path, "input variable")?)
        .with_context(|| format!("Invalid input variable in {}", input_path.display()))?;
    let output = parse_variable(&keys.output, &read_document(output_path, "output variable")?)
        .with_context(|| format!("Invalid output variable in {}", output_path.display()))?;
    let rules = parse_rules(&read_document(rules_path, "rules")?, keys)
        .with_context(|| format!("Invalid rule base in {}", rules_path.display()))?;

    tracing::debug!(
        input_terms = input.len(),
        output_terms = output.len(),
        rules = rules.len(),
        "loaded controller"
    );

    let engine = InferenceEngine::with_config(input, output, rules, config.engine_config());
    engine.validate()?;
    Ok(engine)
}

fn format_text(evaluations: &[Evaluation], precision: usize, explain: bool) -> String {
    let mut out = String::new();
    for eval in evaluations {
        if evaluations.len() == 1 && !explain {
            out.push_str(&format!("{:.*}\n", precision, eval.output));
            continue;
        }
        out.push_str(&format!("{}\t{:.*}\n", eval.input, precision, eval.output));
        if !explain {
            continue;
        }
        for firing in &eval.firings {
            out.push_str(&format!(
                "  rule #{}: {} -> {} fires at {:.*}\n",
                firing.rule_index, firing.input_term, firing.output_term, precision, firing.strength
            ));
        }
        for activation in &eval.activations {
            match activation.candidate {
                Some(x) => out.push_str(&format!(
                    "  term {}: level {:.*}, reached at {:.*}\n",
                    activation.term, precision, activation.level, precision, x
                )),
                None => out.push_str(&format!(
                    "  term {}: level {:.*}, never reached\n",
                    activation.term, precision, activation.level
                )),
            }
        }
        match &eval.outcome {
            Outcome::Fired { term, level } => {
                out.push_str(&format!("  => {} at level {:.*}\n", term, precision, level))
            }
            Outcome::NoRuleFired => out.push_str("  => no rule fired, fallback output\n"),
        }
    }
    out
}

fn format_json(evaluations: &[Evaluation], explain: bool) -> Result<String> {
    let mut json = if explain {
        serde_json::to_string_pretty(evaluations)?
    } else {
        let compact: Vec<serde_json::Value> = evaluations
            .iter()
            .map(|e| {
                serde_json::json!({
                    "input": e.input,
                    "output": e.output,
                    "outcome": e.outcome,
                })
            })
            .collect();
        serde_json::to_string_pretty(&compact)?
    };
    json.push('\n');
    Ok(json)
}
