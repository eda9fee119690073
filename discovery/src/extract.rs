//! Documentation extraction from module sources and YAML sidecars.

use std::path::Path;
use std::sync::LazyLock;

use ansible_schema_core::ModuleRecord;
use regex::Regex;

/// Key holding the record inside a sidecar file.
pub const DOCUMENTATION_KEY: &str = "DOCUMENTATION";

/// Typed error for documentation extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The source has no `DOCUMENTATION` literal.
    #[error("no DOCUMENTATION block found")]
    NoDocumentation,

    #[error("documentation is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The documentation parsed, but not into a mapping.
    #[error("documentation must be a mapping, found {0}")]
    NotAMapping(&'static str),

    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),
}

/// Returns the body of the top-level `DOCUMENTATION` string literal.
///
/// Both triple-quote styles are accepted, with an optional `r`/`u` prefix.
///
/// # Examples
///
/// ```
/// use ansible_schema_discovery::extract_documentation;
///
/// let source = "#!/usr/bin/python\nDOCUMENTATION = r'''\nmodule: ping\n'''\n";
/// assert_eq!(extract_documentation(source), Some("\nmodule: ping\n"));
/// assert_eq!(extract_documentation("print('hi')"), None);
/// ```
pub fn extract_documentation(source: &str) -> Option<&str> {
    // SAFETY: compile-time constant, exercised by tests.
    static DOCUMENTATION_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?ms)^DOCUMENTATION\s*=\s*[rRuU]?(?:'''(.*?)'''|"""(.*?)""")"#)
            .expect("static regex must compile")
    });

    let captures = DOCUMENTATION_RE.captures(source)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|body| body.as_str())
}

/// Parses a documentation YAML document into a [`ModuleRecord`].
pub fn parse_record(yaml: &str) -> Result<ModuleRecord, ExtractError> {
    let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    record_from_value(value)
}

/// Parses a YAML sidecar file body.
///
/// The record may sit at the top level or under a `DOCUMENTATION` key,
/// either as a nested mapping or as an embedded YAML string.
pub fn parse_sidecar(yaml: &str) -> Result<ModuleRecord, ExtractError> {
    let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    match value.get(DOCUMENTATION_KEY) {
        Some(serde_yaml::Value::String(embedded)) => parse_record(embedded),
        Some(nested) => record_from_value(nested.clone()),
        None => record_from_value(value),
    }
}

/// Reads one module file and extracts its record.
pub fn extract_file(path: &Path) -> Result<ModuleRecord, ExtractError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    match extension {
        "py" => {
            let source = std::fs::read_to_string(path)?;
            let documentation =
                extract_documentation(&source).ok_or(ExtractError::NoDocumentation)?;
            parse_record(documentation)
        }
        "yml" | "yaml" => parse_sidecar(&std::fs::read_to_string(path)?),
        _ => Err(ExtractError::UnsupportedFile(path.display().to_string())),
    }
}

fn record_from_value(value: serde_yaml::Value) -> Result<ModuleRecord, ExtractError> {
    let kind = match &value {
        serde_yaml::Value::Mapping(_) => return Ok(serde_yaml::from_value(value)?),
        serde_yaml::Value::Null => "nothing",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a list",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    };
    Err(ExtractError::NotAMapping(kind))
}
