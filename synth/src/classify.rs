//! Record classification and the deferred (command-style) schema builder.
//!
//! Command modules (`shell`, `command`, ...) take one unstructured value
//! instead of named options, so they cannot live under the ordinary
//! selector. They are collected first and built into their own
//! `name`/`args`/`<title>` shape.

use std::collections::HashSet;
use std::fmt;

use ansible_schema_core::{ModuleRecord, SourcedRecord};
use serde_json::{Map, Value, json};

use crate::assemble::{AssemblyError, assemble};
use crate::infer::{InferredProperties, TypeInference};
use crate::report::{Diagnostic, DiagnosticCode, SynthesisReport};

/// Top-level keys marking plugin documentation rather than a module.
pub const NON_MODULE_MARKERS: &[&str] = &["plugin_type", "strategy", "callback"];

/// Option name marking a free-form option set.
pub const FREE_FORM_OPTION: &str = "free_form";

/// Modules whose options take a single free-form value.
pub const COMMAND_MODULES: &[&str] = &["shell", "command", "script", "raw"];

/// Why a record is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The record carries a plugin marker key.
    NonModule(String),
    MissingTitle,
    /// Free-form options on a module that is not a command module.
    UnexpectedFreeForm(String),
}

impl IgnoreReason {
    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::MissingTitle => DiagnosticCode::MissingTitle,
            Self::NonModule(_) | Self::UnexpectedFreeForm(_) => DiagnosticCode::IgnoredRecord,
        }
    }
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonModule(marker) => write!(f, "record carries plugin marker '{marker}'"),
            Self::MissingTitle => write!(f, "record has no module name"),
            Self::UnexpectedFreeForm(title) => {
                write!(f, "free-form options are not supported for module '{title}'")
            }
        }
    }
}

/// Routing decision for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Ignore(IgnoreReason),
    /// Command-style module, built by [`build_deferred`].
    Deferred(String),
    /// Property-based module placed under the ordinary selector.
    Ordinary(String),
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ignore(_) => "ignored",
            Self::Deferred(_) => "deferred",
            Self::Ordinary(_) => "ordinary",
        }
    }
}

/// Decides whether a record is ignored, deferred or processed inline.
///
/// # Examples
///
/// ```
/// use ansible_schema_core::{ModuleRecord, OptionSpec};
/// use ansible_schema_synth::{Classification, IgnoreReason, classify};
///
/// let shell = ModuleRecord::new("shell").with_option("free_form", OptionSpec::default());
/// assert_eq!(classify(&shell), Classification::Deferred("shell".to_string()));
///
/// let odd = ModuleRecord::new("debug").with_option("free_form", OptionSpec::default());
/// assert!(matches!(classify(&odd), Classification::Ignore(IgnoreReason::UnexpectedFreeForm(_))));
/// ```
pub fn classify(record: &ModuleRecord) -> Classification {
    if let Some(marker) = NON_MODULE_MARKERS
        .iter()
        .find(|marker| record.has_key(marker))
    {
        return Classification::Ignore(IgnoreReason::NonModule(marker.to_string()));
    }

    let Some(title) = record
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
    else {
        return Classification::Ignore(IgnoreReason::MissingTitle);
    };

    let is_command = COMMAND_MODULES.contains(&title);
    let free_form = record.option(FREE_FORM_OPTION).is_some();

    if free_form && !is_command {
        return Classification::Ignore(IgnoreReason::UnexpectedFreeForm(title.to_string()));
    }
    if is_command {
        return Classification::Deferred(title.to_string());
    }
    Classification::Ordinary(title.to_string())
}

/// Builds the command-style schema of one deferred module.
///
/// The `free_form` marker option is dropped; the rest becomes the `args`
/// object. The outer object requires `<title>`, plus `name` when `args`
/// ended up with a required list.
pub fn deferred_schema(
    title: &str,
    record: &ModuleRecord,
    inference: &TypeInference,
) -> Result<(Value, InferredProperties), AssemblyError> {
    let inferred = inference.infer_module(
        title,
        record
            .option_entries()
            .filter(|(name, _)| *name != FREE_FORM_OPTION),
    );
    let args = assemble(&inferred.properties, false)?;

    let mut required = vec![title.to_string()];
    if !args.required.is_empty() {
        required.push("name".to_string());
    }

    let mut properties = Map::new();
    properties.insert("name".to_string(), json!({ "type": "string" }));
    properties.insert("args".to_string(), args.to_value());
    properties.insert(title.to_string(), json!({ "type": "string" }));

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    if let Some(summary) = record.summary() {
        schema.insert("description".to_string(), json!(summary));
    }
    schema.insert("properties".to_string(), Value::Object(properties));
    schema.insert("required".to_string(), json!(required));

    Ok((Value::Object(schema), inferred))
}

/// Builds schemas for every deferred record, in input order.
///
/// Records that fail assembly or repeat an earlier title are skipped with a
/// diagnostic; the rest of the run continues.
pub fn build_deferred<'a>(
    records: impl IntoIterator<Item = &'a SourcedRecord>,
    inference: &TypeInference,
    report: &mut SynthesisReport,
) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut schemas = Vec::new();

    for sourced in records {
        let Classification::Deferred(title) = classify(&sourced.record) else {
            continue;
        };

        if seen.contains(&title) {
            report.record(duplicate_title(&sourced.source, &title));
            continue;
        }

        match deferred_schema(&title, &sourced.record, inference) {
            Ok((schema, inferred)) => {
                record_unsafe_choices(report, &sourced.source, &title, &inferred);
                tracing::debug!(module = %title, source = %sourced.source, "Built deferred schema");
                report.deferred_modules.push(title.clone());
                seen.insert(title);
                schemas.push(schema);
            }
            Err(err) => report.record(assembly_diagnostic(&sourced.source, &title, &err)),
        }
    }

    schemas
}

pub(crate) fn record_unsafe_choices(
    report: &mut SynthesisReport,
    source: &str,
    title: &str,
    inferred: &InferredProperties,
) {
    for demoted in &inferred.unsafe_choices {
        report.record(Diagnostic::new(
            source,
            Some(title),
            DiagnosticCode::UnsafeChoiceValue,
            format!(
                "option '{}' has choices with whitespace ({}), listed in description instead of enum",
                demoted.option,
                demoted.values.join(", ")
            ),
        ));
    }
}

pub(crate) fn duplicate_title(source: &str, title: &str) -> Diagnostic {
    Diagnostic::new(
        source,
        Some(title),
        DiagnosticCode::DuplicateTitle,
        format!("module '{title}' was already defined, keeping the first definition"),
    )
}

pub(crate) fn reserved_title(source: &str, title: &str) -> Diagnostic {
    Diagnostic::new(
        source,
        Some(title),
        DiagnosticCode::DuplicateTitle,
        format!("module title '{title}' collides with the reserved task key, skipping module"),
    )
}

pub(crate) fn assembly_diagnostic(source: &str, title: &str, err: &AssemblyError) -> Diagnostic {
    let code = match err {
        AssemblyError::DuplicateName(_) => DiagnosticCode::DuplicateName,
        AssemblyError::NoRequirements => DiagnosticCode::NoRequirements,
    };
    Diagnostic::new(source, Some(title), code, format!("skipping module: {err}"))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use ansible_schema_core::{OptionSpec, OverrideTable, Version};

    use super::*;

    fn inference() -> TypeInference {
        TypeInference::new(OverrideTable::default(), Version::new(2, 5, 0))
    }

    #[test]
    fn test_plugin_markers_are_ignored_before_title_check() {
        let mut record = ModuleRecord::default();
        record.extra = BTreeMap::from([("callback".to_string(), json!("json"))]);
        assert_eq!(
            classify(&record),
            Classification::Ignore(IgnoreReason::NonModule("callback".to_string()))
        );
    }

    #[test]
    fn test_missing_or_blank_title_is_ignored() {
        assert_eq!(
            classify(&ModuleRecord::default()),
            Classification::Ignore(IgnoreReason::MissingTitle)
        );
        assert_eq!(
            classify(&ModuleRecord::new("  ")),
            Classification::Ignore(IgnoreReason::MissingTitle)
        );
    }

    #[test]
    fn test_command_modules_defer_with_or_without_free_form() {
        assert_eq!(
            classify(&ModuleRecord::new("raw")),
            Classification::Deferred("raw".to_string())
        );
        assert_eq!(
            classify(&ModuleRecord::new("copy")),
            Classification::Ordinary("copy".to_string())
        );
    }

    #[test]
    fn test_deferred_schema_drops_free_form_and_requires_title() {
        let record = ModuleRecord::new("shell")
            .with_option("free_form", OptionSpec {
                required: true,
                ..OptionSpec::default()
            })
            .with_option("chdir", OptionSpec {
                description: "Change into this directory".to_string(),
                ..OptionSpec::default()
            });

        let (schema, _) = deferred_schema("shell", &record, &inference()).unwrap();
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "args": {
                        "type": "object",
                        "properties": {
                            "chdir": { "type": "string", "description": "Change into this directory" }
                        }
                    },
                    "shell": { "type": "string" }
                },
                "required": ["shell"]
            })
        );
    }

    #[test]
    fn test_deferred_schema_requires_name_when_args_have_requirements() {
        let record = ModuleRecord::new("script").with_option("cmd", OptionSpec {
            required: true,
            ..OptionSpec::default()
        });

        let (schema, _) = deferred_schema("script", &record, &inference()).unwrap();
        assert_eq!(schema["required"], json!(["script", "name"]));
        assert_eq!(schema["properties"]["args"]["required"], json!(["cmd"]));
    }

    #[test]
    fn test_build_deferred_skips_failures_and_duplicates() {
        let broken = ModuleRecord::new("command")
            .with_option("chdir", OptionSpec::default())
            .with_option("creates", OptionSpec {
                aliases: vec!["chdir".to_string()],
                ..OptionSpec::default()
            });
        let records = vec![
            SourcedRecord::new("command.py", broken),
            SourcedRecord::new("shell.py", ModuleRecord::new("shell")),
            SourcedRecord::new("shell2.py", ModuleRecord::new("shell")),
        ];

        let mut report = SynthesisReport::default();
        let schemas = build_deferred(&records, &inference(), &mut report);

        assert_eq!(schemas.len(), 1);
        assert_eq!(report.deferred_modules, vec!["shell".to_string()]);
        assert_eq!(
            report.code_summary(),
            vec![
                (DiagnosticCode::DuplicateName, 1),
                (DiagnosticCode::DuplicateTitle, 1),
            ]
        );
    }
}
