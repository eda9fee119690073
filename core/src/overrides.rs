//! Version-gated type overrides keyed by `(module, option)`.
//!
//! Some options were documented with the wrong type for a range of releases.
//! An [`OverrideEntry`] replaces the inferred schema of one option whenever
//! the target version falls inside its range. The table is immutable once
//! built.

use std::collections::HashMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::definitions::SharedUnion;
use crate::version::{Version, VersionReq};

/// One override: a version range and the schema that wins inside it.
///
/// Deserializes from YAML or JSON; `range` is parsed on the way in.
///
/// # Examples
///
/// ```
/// use ansible_schema_core::OverrideEntry;
///
/// let entry: OverrideEntry = serde_json::from_value(serde_json::json!({
///     "module": "file",
///     "option": "mode",
///     "range": "<2.6.0",
///     "schema": { "type": "string" }
/// }))
/// .unwrap();
/// assert_eq!(entry.range.to_string(), "<2.6.0");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub module: String,
    pub option: String,
    pub range: VersionReq,
    /// Replacement schema fragment. Must be a JSON object.
    #[serde(deserialize_with = "deserialize_schema_object")]
    pub schema: Value,
}

impl OverrideEntry {
    pub fn new(module: &str, option: &str, range: VersionReq, schema: Value) -> Self {
        Self {
            module: module.to_string(),
            option: option.to_string(),
            range,
            schema,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct GatedSchema {
    range: VersionReq,
    schema: Value,
}

/// Immutable lookup table of version-gated overrides.
///
/// Entries for the same `(module, option)` are tried in insertion order and
/// the first whose range matches wins.
///
/// # Examples
///
/// ```
/// use ansible_schema_core::{OverrideTable, Version};
///
/// let table = OverrideTable::builtin();
/// assert!(table.lookup("file", "mode", &Version::new(2, 5, 0)).is_some());
/// assert!(table.lookup("file", "mode", &Version::new(2, 6, 0)).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideTable {
    by_module: HashMap<String, HashMap<String, Vec<GatedSchema>>>,
    len: usize,
}

impl OverrideTable {
    pub fn new(entries: impl IntoIterator<Item = OverrideEntry>) -> Self {
        Self::default().extended(entries)
    }

    /// Overrides shipped with the engine.
    ///
    /// File modes were undocumented before 2.6 even though both octal
    /// integers and symbolic strings were accepted.
    pub fn builtin() -> Self {
        Self::new(builtin_entries())
    }

    /// Returns a new table with `entries` appended after the existing ones.
    ///
    /// Entries whose schema is not an object cannot stand in for a property
    /// and are left out.
    pub fn extended(self, entries: impl IntoIterator<Item = OverrideEntry>) -> Self {
        let mut table = self;
        for entry in entries.into_iter().filter(|entry| entry.schema.is_object()) {
            table
                .by_module
                .entry(entry.module)
                .or_default()
                .entry(entry.option)
                .or_default()
                .push(GatedSchema {
                    range: entry.range,
                    schema: entry.schema,
                });
            table.len += 1;
        }
        table
    }

    /// Returns the replacement schema for `module.option` at `version`.
    pub fn lookup(&self, module: &str, option: &str, version: &Version) -> Option<&Value> {
        self.by_module
            .get(module)?
            .get(option)?
            .iter()
            .find(|gated| gated.range.matches(version))
            .map(|gated| &gated.schema)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn deserialize_schema_object<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    let schema = Value::deserialize(deserializer)?;
    if schema.is_object() {
        return Ok(schema);
    }
    Err(de::Error::custom(format!(
        "override schema must be a mapping, found `{schema}`"
    )))
}

fn builtin_entries() -> Vec<OverrideEntry> {
    let before_2_6 = VersionReq::less_than(Version::new(2, 6, 0));
    let mode = json!({ "$ref": SharedUnion::Number.reference() });

    ["file", "copy", "template", "assemble"]
        .into_iter()
        .map(|module| OverrideEntry::new(module, "mode", before_2_6.clone(), mode.clone()))
        .collect()
}
