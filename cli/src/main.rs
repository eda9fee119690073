use std::fs;
use std::path::{Path, PathBuf};

use ansible_schema_core::{DEFAULT_TARGET_VERSION, OverrideTable, Version};
use ansible_schema_discovery::{
    ExtractionFailure, OutputFormat, discover_records, extract_file, format_document,
    load_overrides,
};
use ansible_schema_synth::{
    Classification, DEFAULT_DESCRIPTION, DEFAULT_TITLE, Diagnostic, DiagnosticCode,
    SynthesisConfig, SynthesisReport, Synthesizer, deferred_schema,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "ansible-schema")]
#[command(about = "Generate a JSON Schema for Ansible task lists from module documentation")]
#[command(version)]
struct Cli {
    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan a module tree and write the composite task schema.
    Generate(GenerateArgs),
    /// Show how a single module file would be classified and rendered.
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
struct SynthesisArgs {
    /// Ansible version used to gate type overrides.
    #[arg(long, default_value_t = DEFAULT_TARGET_VERSION)]
    target_version: Version,
    /// Drop modules that end up with no required property.
    #[arg(long)]
    strict: bool,
    /// Additional override table (YAML or JSON list), consulted after the built-ins.
    #[arg(long)]
    overrides: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Directory containing module sources.
    #[arg(long)]
    directory: PathBuf,
    /// Output file (default: stdout).
    #[arg(long)]
    output: Option<PathBuf>,
    /// Document title.
    #[arg(long, default_value = DEFAULT_TITLE)]
    title: String,
    /// Document description.
    #[arg(long, default_value = DEFAULT_DESCRIPTION)]
    description: String,
    #[command(flatten)]
    synthesis: SynthesisArgs,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    /// Number of parallel extraction jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    /// Print the run report as JSON to stderr.
    #[arg(long)]
    report: bool,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Module source or documentation sidecar.
    #[arg(long)]
    input: PathBuf,
    #[command(flatten)]
    synthesis: SynthesisArgs,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
}

fn main() {
    let cli = Cli::parse();

    let result = init_tracing(&cli.log_level).and_then(|()| match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Inspect(args) => run_inspect(args),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) -> Result<(), String> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|err| format!("Invalid log level '{level}': {err}"))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|err| format!("Failed to initialize logging: {err}"))
}

fn build_synthesizer(args: &SynthesisArgs, config: SynthesisConfig) -> Result<Synthesizer, String> {
    let mut overrides = OverrideTable::builtin();
    if let Some(path) = &args.overrides {
        let entries = load_overrides(path)
            .map_err(|err| format!("Failed to load overrides '{}': {err}", path.display()))?;
        tracing::info!(path = %path.display(), entries = entries.len(), "Loaded overrides");
        overrides = overrides.extended(entries);
    }
    Ok(Synthesizer::new(config).with_overrides(overrides))
}

/// Report printed by `generate --report`.
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    target_version: String,
    extraction_failures: &'a [ExtractionFailure],
    #[serde(flatten)]
    synthesis: &'a SynthesisReport,
    code_summary: Vec<CodeCount>,
}

#[derive(Debug, Serialize)]
struct CodeCount {
    code: DiagnosticCode,
    count: usize,
}

fn run_generate(args: GenerateArgs) -> Result<(), String> {
    let config = SynthesisConfig {
        target_version: args.synthesis.target_version,
        strict: args.synthesis.strict,
        title: args.title,
        description: args.description,
    };
    let synthesizer = build_synthesizer(&args.synthesis, config)?;

    let discovery = discover_records(&args.directory, args.jobs).map_err(|err| err.to_string())?;
    let outcome = synthesizer.synthesize(&discovery.records);
    let document = format_document(&outcome.schema, args.format)?;

    match &args.output {
        Some(path) => write_output(path, &document)?,
        None => print!("{document}"),
    }

    if args.report {
        let report = RunReport {
            target_version: synthesizer.config().target_version.to_string(),
            extraction_failures: &discovery.failures,
            synthesis: &outcome.report,
            code_summary: outcome
                .report
                .code_summary()
                .into_iter()
                .map(|(code, count)| CodeCount { code, count })
                .collect(),
        };
        eprintln!("{}", format_document(&report, OutputFormat::Json)?.trim_end());
    } else {
        eprintln!(
            "Generated schema with {} ordinary and {} deferred modules ({} files skipped, {} diagnostics)",
            outcome.report.ordinary_modules.len(),
            outcome.report.deferred_modules.len(),
            discovery.failures.len(),
            outcome.report.diagnostics.len()
        );
    }

    Ok(())
}

/// Output of `inspect`.
#[derive(Debug, Serialize)]
struct Inspection {
    source: String,
    classification: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
}

fn run_inspect(args: InspectArgs) -> Result<(), String> {
    let config = SynthesisConfig {
        target_version: args.synthesis.target_version,
        strict: args.synthesis.strict,
        ..SynthesisConfig::default()
    };
    let synthesizer = build_synthesizer(&args.synthesis, config)?;

    let record = extract_file(&args.input)
        .map_err(|err| format!("Failed to extract '{}': {err}", args.input.display()))?;
    let source = args.input.display().to_string();
    let classification = ansible_schema_synth::classify(&record);

    let mut inspection = Inspection {
        source: source.clone(),
        classification: classification.label(),
        module: None,
        reason: None,
        schema: None,
        diagnostics: Vec::new(),
    };

    let built = match &classification {
        Classification::Ignore(reason) => {
            inspection.module = record.title.clone();
            inspection.reason = Some(reason.to_string());
            None
        }
        Classification::Deferred(title) => {
            inspection.module = Some(title.clone());
            Some(deferred_schema(title, &record, synthesizer.inference()))
        }
        Classification::Ordinary(title) => {
            inspection.module = Some(title.clone());
            Some(
                synthesizer
                    .module_schema(title, &record)
                    .map(|(schema, inferred)| (schema.to_value(), inferred)),
            )
        }
    };

    if let Some(built) = built {
        let title = inspection.module.clone().unwrap_or_default();
        let (schema, inferred) =
            built.map_err(|err| format!("Module '{title}' would be skipped: {err}"))?;
        inspection.diagnostics = inferred
            .unsafe_choices
            .iter()
            .map(|demoted| {
                Diagnostic::new(
                    &source,
                    Some(&title),
                    DiagnosticCode::UnsafeChoiceValue,
                    format!(
                        "option '{}' has choices with whitespace ({})",
                        demoted.option,
                        demoted.values.join(", ")
                    ),
                )
            })
            .collect();
        inspection.schema = Some(schema);
    }

    print!("{}", format_document(&inspection, args.format)?);
    Ok(())
}

fn write_output(path: &Path, document: &str) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| format!("Failed to create '{}': {err}", parent.display()))?;
    }
    fs::write(path, document).map_err(|err| format!("Failed to write '{}': {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_generate_defaults() {
        let cli = Cli::try_parse_from(["ansible-schema", "generate", "--directory", "lib"]).unwrap();
        assert_eq!(cli.log_level, "warn");
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.synthesis.target_version, DEFAULT_TARGET_VERSION);
        assert_eq!(args.title, DEFAULT_TITLE);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(!args.synthesis.strict);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_cli_parses_target_version_and_format() {
        let cli = Cli::try_parse_from([
            "ansible-schema",
            "--log-level",
            "debug",
            "generate",
            "--directory",
            "lib",
            "--target-version",
            "2.7",
            "--format",
            "yaml",
            "--strict",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.synthesis.target_version, Version::new(2, 7, 0));
        assert_eq!(args.format, OutputFormat::Yaml);
        assert!(args.synthesis.strict);
    }

    #[test]
    fn test_cli_rejects_bad_version() {
        let result = Cli::try_parse_from([
            "ansible-schema",
            "generate",
            "--directory",
            "lib",
            "--target-version",
            "two",
        ]);
        assert!(result.is_err());
    }
}
