//! Shared union types referenced from module schemas.
//!
//! Ansible accepts looser textual forms than strict JSON for numbers and
//! booleans (`"yes"`, `"on"`, `1`, ...). Those unions are declared once in
//! the document's `definitions` block and referenced with `$ref`. Definition
//! names follow the `ansible_<lowercased kind>` convention so references
//! always resolve.

use serde_json::{Map, Value, json};

/// Prefix shared by every definition name.
pub const DEFINITION_PREFIX: &str = "ansible_";

/// Shared union schemas known to the engine.
///
/// # Examples
///
/// ```
/// use ansible_schema_core::SharedUnion;
///
/// assert_eq!(SharedUnion::Truth.definition_name(), "ansible_truth");
/// assert_eq!(SharedUnion::Number.reference(), "#/definitions/ansible_number");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharedUnion {
    /// Integers, or strings holding them.
    Number,
    /// Booleans in every spelling Ansible accepts.
    Truth,
}

impl SharedUnion {
    /// Every declared union, in definition order.
    pub const ALL: [SharedUnion; 2] = [SharedUnion::Number, SharedUnion::Truth];

    pub fn kind(self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::Truth => "Truth",
        }
    }

    pub fn definition_name(self) -> String {
        format!("{DEFINITION_PREFIX}{}", self.kind().to_ascii_lowercase())
    }

    /// JSON pointer used in `$ref`.
    pub fn reference(self) -> String {
        format!("#/definitions/{}", self.definition_name())
    }

    pub fn schema(self) -> Value {
        match self {
            Self::Number => json!({
                "oneOf": [
                    { "type": "integer" },
                    { "type": "string" }
                ]
            }),
            Self::Truth => json!({
                "oneOf": [
                    { "type": "boolean" },
                    { "type": "integer", "enum": [0, 1] },
                    {
                        "type": "string",
                        "enum": [
                            "yes", "no", "Yes", "No", "YES", "NO",
                            "on", "off", "On", "Off", "ON", "OFF",
                            "1", "0",
                            "true", "false", "True", "False", "TRUE", "FALSE"
                        ]
                    }
                ]
            }),
        }
    }
}

/// Registry mapping definition names to their union schemas.
///
/// Built once and handed to the composer; nothing is discovered at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionRegistry {
    entries: Vec<(String, Value)>,
}

impl DefinitionRegistry {
    /// Registry holding every [`SharedUnion`].
    pub fn builtin() -> Self {
        Self {
            entries: SharedUnion::ALL
                .iter()
                .map(|union| (union.definition_name(), union.schema()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, schema)| schema)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the `definitions` block.
    pub fn to_map(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(name, schema)| (name.clone(), schema.clone()))
            .collect()
    }
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
