//! Structured diagnostics for a synthesis run.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// What happened to a record or option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// Record has no module name.
    MissingTitle,
    /// Flattened property/alias names collide.
    DuplicateName,
    /// Strict mode and the module has no required property.
    NoRequirements,
    /// A module title was already emitted.
    DuplicateTitle,
    /// A choice containing whitespace was demoted to description text.
    UnsafeChoiceValue,
    /// Record describes a plugin or an unsupported free-form module.
    IgnoredRecord,
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "missing_title"),
            Self::DuplicateName => write!(f, "duplicate_name"),
            Self::NoRequirements => write!(f, "no_requirements"),
            Self::DuplicateTitle => write!(f, "duplicate_title"),
            Self::UnsafeChoiceValue => write!(f, "unsafe_choice_value"),
            Self::IgnoredRecord => write!(f, "ignored_record"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl DiagnosticCode {
    pub fn severity(self) -> Severity {
        match self {
            Self::IgnoredRecord => Severity::Info,
            Self::MissingTitle | Self::UnsafeChoiceValue => Severity::Warning,
            Self::DuplicateName | Self::NoRequirements | Self::DuplicateTitle => Severity::Error,
        }
    }
}

/// One diagnostic tied to a source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub detail: String,
}

impl Diagnostic {
    pub fn new(source: &str, module: Option<&str>, code: DiagnosticCode, detail: String) -> Self {
        Self {
            source: source.to_string(),
            module: module.map(String::from),
            code,
            severity: code.severity(),
            detail,
        }
    }
}

/// Outcome summary of a synthesis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisReport {
    /// Titles emitted under the ordinary selector, in input order.
    pub ordinary_modules: Vec<String>,
    /// Titles emitted as deferred command shapes, in input order.
    pub deferred_modules: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SynthesisReport {
    /// Records a diagnostic and logs it at the matching level.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        let module = diagnostic.module.as_deref().unwrap_or("-");
        match diagnostic.severity {
            Severity::Info => info!(
                source = %diagnostic.source,
                module,
                code = %diagnostic.code,
                "{}",
                diagnostic.detail
            ),
            Severity::Warning => warn!(
                source = %diagnostic.source,
                module,
                code = %diagnostic.code,
                "{}",
                diagnostic.detail
            ),
            Severity::Error => error!(
                source = %diagnostic.source,
                module,
                code = %diagnostic.code,
                "{}",
                diagnostic.detail
            ),
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn emitted(&self) -> usize {
        self.ordinary_modules.len() + self.deferred_modules.len()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    /// Diagnostics carrying `code`.
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |diagnostic| diagnostic.code == code)
    }

    /// Count per diagnostic code, ordered by code.
    pub fn code_summary(&self) -> Vec<(DiagnosticCode, usize)> {
        let mut counts: BTreeMap<DiagnosticCode, usize> = BTreeMap::new();
        for diagnostic in &self.diagnostics {
            *counts.entry(diagnostic.code).or_default() += 1;
        }
        counts.into_iter().collect()
    }
}
