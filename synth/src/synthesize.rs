//! The synthesis pipeline: classify, build, compose.

use ansible_schema_core::{
    DEFAULT_TARGET_VERSION, DefinitionRegistry, ModuleRecord, OverrideTable, SourcedRecord, Version,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assemble::{AssemblyError, ObjectSchema, assemble};
use crate::classify::{
    Classification, assembly_diagnostic, build_deferred, classify, duplicate_title,
    record_unsafe_choices, reserved_title,
};
use crate::compose::{CompositeSchema, ModuleMap, RESERVED_TASK_KEY, compose};
use crate::heuristics::ContainerHeuristics;
use crate::infer::{InferredProperties, TypeInference};
use crate::report::{Diagnostic, SynthesisReport};

/// Default document title.
pub const DEFAULT_TITLE: &str = "Ansible Tasks";
/// Default document description.
pub const DEFAULT_DESCRIPTION: &str = "JSON Schema for lists of Ansible tasks";

/// Run-wide synthesis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Version used to gate overrides.
    pub target_version: Version,
    /// Drop ordinary modules that end up with no required property.
    pub strict: bool,
    pub title: String,
    pub description: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            target_version: DEFAULT_TARGET_VERSION,
            strict: false,
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

/// Result of a synthesis run. Never an error: failures live in the report.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutcome {
    pub schema: CompositeSchema,
    pub report: SynthesisReport,
}

/// Turns module records into a composite schema.
///
/// # Examples
///
/// ```
/// use ansible_schema_core::{ModuleRecord, OptionSpec, SourcedRecord};
/// use ansible_schema_synth::{SynthesisConfig, Synthesizer};
///
/// let records = vec![
///     SourcedRecord::new(
///         "file.py",
///         ModuleRecord::new("file").with_option("path", OptionSpec {
///             required: true,
///             ..OptionSpec::default()
///         }),
///     ),
///     SourcedRecord::new("shell.py", ModuleRecord::new("shell")),
/// ];
///
/// let outcome = Synthesizer::new(SynthesisConfig::default()).synthesize(&records);
/// assert_eq!(outcome.report.ordinary_modules, vec!["file".to_string()]);
/// assert_eq!(outcome.report.deferred_modules, vec!["shell".to_string()]);
/// assert_eq!(outcome.schema.items.any_of.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Synthesizer {
    config: SynthesisConfig,
    inference: TypeInference,
    definitions: DefinitionRegistry,
}

impl Synthesizer {
    /// Creates a synthesizer using the built-in override table.
    pub fn new(config: SynthesisConfig) -> Self {
        let inference = TypeInference::new(OverrideTable::builtin(), config.target_version);
        Self {
            config,
            inference,
            definitions: DefinitionRegistry::builtin(),
        }
    }

    pub fn with_overrides(mut self, overrides: OverrideTable) -> Self {
        self.inference = self.inference.with_overrides(overrides);
        self
    }

    pub fn with_heuristics(mut self, heuristics: ContainerHeuristics) -> Self {
        self.inference = self.inference.with_heuristics(heuristics);
        self
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn inference(&self) -> &TypeInference {
        &self.inference
    }

    /// Synthesizes the composite schema for `records`.
    ///
    /// Ordinary modules are built inline; command modules are collected and
    /// built afterwards. Output order follows input order.
    pub fn synthesize(&self, records: &[SourcedRecord]) -> SynthesisOutcome {
        let mut report = SynthesisReport::default();
        let mut ordinary = ModuleMap::default();
        let mut deferred = Vec::new();

        for sourced in records {
            match classify(&sourced.record) {
                Classification::Ignore(reason) => {
                    report.record(Diagnostic::new(
                        &sourced.source,
                        sourced.record.title.as_deref(),
                        reason.code(),
                        reason.to_string(),
                    ));
                }
                Classification::Deferred(title) => {
                    debug!(source = %sourced.source, module = %title, "Deferring command module");
                    deferred.push(sourced);
                }
                Classification::Ordinary(title) => {
                    self.add_ordinary(&title, sourced, &mut ordinary, &mut report);
                }
            }
        }

        let deferred = build_deferred(deferred, &self.inference, &mut report);
        let schema = compose(
            &ordinary,
            deferred,
            &self.definitions,
            &self.config.title,
            &self.config.description,
        );

        SynthesisOutcome { schema, report }
    }

    /// Builds the schema of one ordinary module.
    pub fn module_schema(
        &self,
        title: &str,
        record: &ModuleRecord,
    ) -> Result<(ObjectSchema, InferredProperties), AssemblyError> {
        let inferred = self.inference.infer_module(title, record.option_entries());
        let schema = assemble(&inferred.properties, self.config.strict)?;
        Ok((schema.with_description(record.summary()), inferred))
    }

    fn add_ordinary(
        &self,
        title: &str,
        sourced: &SourcedRecord,
        ordinary: &mut ModuleMap,
        report: &mut SynthesisReport,
    ) {
        if title == RESERVED_TASK_KEY {
            report.record(reserved_title(&sourced.source, title));
            return;
        }

        match self.module_schema(title, &sourced.record) {
            Ok((schema, inferred)) => {
                if ordinary.insert(title, schema) {
                    debug!(source = %sourced.source, module = title, "Built module schema");
                    record_unsafe_choices(report, &sourced.source, title, &inferred);
                    report.ordinary_modules.push(title.to_string());
                } else {
                    report.record(duplicate_title(&sourced.source, title));
                }
            }
            Err(err) => report.record(assembly_diagnostic(&sourced.source, title, &err)),
        }
    }
}
