//! Command-line scanner for the guardrail pipeline
//!
//! `shelter scan` runs text from an argument, a file, or stdin through a
//! pipeline assembled from the built-in validators and reports the findings.
//! Exit code 0 means the text passed, 2 means it was blocked, 1 means the
//! scan itself failed.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shelter_guardrails::{
    GuardrailPipeline, InjectionConfig, InjectionValidator, LengthConfig, LengthValidator,
    PiiConfig, PiiValidator, ToxicityConfig, ToxicityValidator,
};
use shelter_types::{Action, PipelineResult};

/// Deterministic content guardrails for LLM traffic
#[derive(Parser)]
#[command(name = "shelter", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan text through the guardrail pipeline
    Scan(ScanArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Text to scan (reads stdin when neither TEXT nor --file is given)
    text: Option<String>,

    /// Read the text to scan from a file
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Redact detected PII instead of only reporting it
    #[arg(long)]
    redact: bool,

    /// Disable the PII stage
    #[arg(long)]
    no_pii: bool,

    /// Disable the prompt-injection stage
    #[arg(long)]
    no_injection: bool,

    /// Disable the toxicity stage
    #[arg(long)]
    no_toxicity: bool,

    /// Enforce a maximum character count
    #[arg(long, value_name = "N")]
    max_chars: Option<usize>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scan(args) => match run_scan(&args) {
            Ok(result) if result.blocked => ExitCode::from(2),
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run_scan(args: &ScanArgs) -> anyhow::Result<PipelineResult> {
    let text = read_input(args)?;
    let pipeline = build_pipeline(args)?;
    let result = pipeline.run(&text).context("pipeline execution failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        report(&result);
    }

    Ok(result)
}

fn read_input(args: &ScanArgs) -> anyhow::Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}

/// Assemble the pipeline from the scan flags. PII runs first so later
/// stages see redacted text.
fn build_pipeline(args: &ScanArgs) -> anyhow::Result<GuardrailPipeline> {
    let mut pipeline = GuardrailPipeline::new();

    if !args.no_pii {
        let action = if args.redact {
            Action::Redact
        } else {
            Action::Warn
        };
        pipeline = pipeline.add(
            PiiValidator::new(PiiConfig {
                redact: args.redact,
                ..Default::default()
            })?,
            action,
        );
    }
    if !args.no_injection {
        pipeline = pipeline.add(
            InjectionValidator::new(InjectionConfig::default())?,
            Action::Block,
        );
    }
    if !args.no_toxicity {
        pipeline = pipeline.add(
            ToxicityValidator::new(ToxicityConfig::default())?,
            Action::Block,
        );
    }
    if args.max_chars.is_some() {
        pipeline = pipeline.add(
            LengthValidator::new(LengthConfig {
                max_chars: args.max_chars,
                max_tokens: None,
            }),
            Action::Block,
        );
    }

    Ok(pipeline)
}

fn report(result: &PipelineResult) {
    for finding in &result.findings {
        println!(
            "  [{}] {}/{}: {}",
            severity_marker(finding.severity),
            finding.validator,
            finding.category,
            finding.description
        );
    }

    if result.blocked {
        println!("BLOCKED ({} finding(s))", result.findings.len());
    } else if result.text != result.original_text {
        println!("REDACTED:");
        println!("{}", result.text);
    } else if result.has_findings() {
        println!("PASSED with {} finding(s)", result.findings.len());
    } else {
        println!("OK");
    }
}

fn severity_marker(severity: f64) -> &'static str {
    if severity >= 0.8 {
        "HIGH"
    } else if severity >= 0.5 {
        "MED"
    } else {
        "LOW"
    }
}
