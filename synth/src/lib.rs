//! Composite JSON Schema synthesis from Ansible module documentation.
//!
//! The engine takes already-parsed [`ModuleRecord`]s and produces one
//! schema describing every valid task:
//!
//! 1. [`TypeInference`] maps each option to a type, using
//!    [`ContainerHeuristics`] for list/dict detection and an
//!    [`OverrideTable`] for version-gated corrections.
//! 2. [`assemble`] turns a module's properties into an object schema,
//!    rejecting name/alias collisions and encoding alias groups.
//! 3. [`classify`] routes each record: ignored, deferred (command modules)
//!    or ordinary. [`build_deferred`] builds the command shapes.
//! 4. [`compose`] merges everything into a [`CompositeSchema`].
//!
//! [`Synthesizer`] runs the whole pipeline. Failures are local to one
//! module and end up in the [`SynthesisReport`]; a run always completes.
//!
//! # Example
//!
//! ```
//! use ansible_schema_core::{ModuleRecord, OptionSpec, SourcedRecord, TypeHint};
//! use ansible_schema_synth::{SynthesisConfig, Synthesizer};
//!
//! let copy = ModuleRecord::new("copy")
//!     .with_option("dest", OptionSpec {
//!         required: true,
//!         ..OptionSpec::default()
//!     })
//!     .with_option("backup", OptionSpec {
//!         type_hint: TypeHint::Boolean,
//!         ..OptionSpec::default()
//!     });
//!
//! let outcome = Synthesizer::new(SynthesisConfig::default())
//!     .synthesize(&[SourcedRecord::new("copy.py", copy)]);
//!
//! let selector = outcome.schema.ordinary_selector().unwrap();
//! assert_eq!(selector["properties"]["copy"]["required"], serde_json::json!(["dest"]));
//! assert!(outcome.report.diagnostics.is_empty());
//! ```
//!
//! [`ModuleRecord`]: ansible_schema_core::ModuleRecord
//! [`OverrideTable`]: ansible_schema_core::OverrideTable

mod assemble;
mod classify;
mod compose;
mod heuristics;
mod infer;
mod report;
mod synthesize;

pub use assemble::{AssemblyError, ObjectSchema, alias_constraints, assemble, duplicate_names};
pub use classify::{
    COMMAND_MODULES, Classification, FREE_FORM_OPTION, IgnoreReason, NON_MODULE_MARKERS,
    build_deferred, classify, deferred_schema,
};
pub use compose::{CompositeSchema, ModuleMap, RESERVED_TASK_KEY, TaskItems, compose};
pub use heuristics::{Container, ContainerHeuristics, DICTIONARY_PATTERN, LIST_PATTERN};
pub use infer::{
    InferredOption, InferredProperties, TypeDescriptor, TypeInference, UnsafeChoices, base_type,
};
pub use report::{Diagnostic, DiagnosticCode, Severity, SynthesisReport};
pub use synthesize::{
    DEFAULT_DESCRIPTION, DEFAULT_TITLE, SynthesisConfig, SynthesisOutcome, Synthesizer,
};
