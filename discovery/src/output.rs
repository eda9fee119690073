//! Output formatting for schema documents and reports.

use serde::Serialize;

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Formats any serializable document in the requested output format.
///
/// JSON output is pretty-printed and ends with a newline.
///
/// # Examples
///
/// ```
/// use ansible_schema_discovery::{OutputFormat, format_document};
///
/// let doc = serde_json::json!({ "type": "array" });
/// assert_eq!(format_document(&doc, OutputFormat::Yaml).unwrap(), "type: array\n");
/// ```
pub fn format_document<T: Serialize + ?Sized>(
    document: &T,
    format: OutputFormat,
) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(document)
            .map(|mut out| {
                out.push('\n');
                out
            })
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(document).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    }
}
