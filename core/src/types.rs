//! Module documentation records and the properties derived from them.
//!
//! [`ModuleRecord`] and [`OptionSpec`] mirror the documentation block that
//! every Ansible module ships. They deserialize leniently: descriptions may
//! be a list of lines, `required` may use YAML 1.1 truth words, and unknown
//! top-level keys are kept in [`ModuleRecord::extra`] so that callers can
//! inspect marker keys. [`Property`] is the inferred, schema-ready form of
//! one option.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::definitions::SharedUnion;

/// Declared type of an option, as written in module documentation.
///
/// # Examples
///
/// ```
/// use ansible_schema_core::TypeHint;
///
/// assert_eq!(TypeHint::from(Some("int".to_string())), TypeHint::Integer);
/// assert_eq!(TypeHint::from(None), TypeHint::Unspecified);
/// assert!(matches!(TypeHint::from(Some("path".to_string())), TypeHint::Unrecognized(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum TypeHint {
    /// `int` / `integer`.
    Integer,
    /// `bool` / `boolean`.
    Boolean,
    /// `str` / `string`.
    String,
    /// `float` / `number`.
    Float,
    /// `dict` / `object`.
    Object,
    /// No `type` key at all.
    #[default]
    Unspecified,
    /// Any hint outside the known vocabulary (e.g. `path`, `raw`).
    Unrecognized(String),
}

impl From<Option<String>> for TypeHint {
    fn from(raw: Option<String>) -> Self {
        let Some(raw) = raw else {
            return Self::Unspecified;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Self::Integer,
            "bool" | "boolean" => Self::Boolean,
            "str" | "string" => Self::String,
            "float" | "number" => Self::Float,
            "dict" | "object" => Self::Object,
            "" => Self::Unspecified,
            _ => Self::Unrecognized(raw),
        }
    }
}

impl From<TypeHint> for Option<String> {
    fn from(hint: TypeHint) -> Self {
        match hint {
            TypeHint::Integer => Some("int".to_string()),
            TypeHint::Boolean => Some("bool".to_string()),
            TypeHint::String => Some("str".to_string()),
            TypeHint::Float => Some("float".to_string()),
            TypeHint::Object => Some("dict".to_string()),
            TypeHint::Unspecified => None,
            TypeHint::Unrecognized(raw) => Some(raw),
        }
    }
}

/// Documentation for one configurable option of a module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Declared type hint (`type:` key).
    #[serde(rename = "type", default)]
    pub type_hint: TypeHint,
    /// Free text, normalized to a single string.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub description: String,
    /// Default value, any shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_truthy")]
    pub required: bool,
    /// Ordered literal values the option accepts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Value>>,
    /// Alternate names for the same option.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl OptionSpec {
    /// Returns the default value when it is present and not falsy.
    ///
    /// `null`, `false`, `0`, `""`, `[]` and `{}` count as falsy.
    pub fn meaningful_default(&self) -> Option<&Value> {
        self.default.as_ref().filter(|value| is_truthy(value))
    }
}

/// Options of a module in documentation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet(Vec<(String, OptionSpec)>);

impl OptionSet {
    /// Creates an option set from ordered `(name, spec)` pairs.
    pub fn new(entries: Vec<(String, OptionSpec)>) -> Self {
        Self(entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionSpec)> {
        self.0.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.0
            .iter()
            .find(|(option, _)| option == name)
            .map(|(_, spec)| spec)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, OptionSpec)> for OptionSet {
    fn from_iter<I: IntoIterator<Item = (String, OptionSpec)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for OptionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, spec) in &self.0 {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OptionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OptionSetVisitor;

        impl<'de> Visitor<'de> for OptionSetVisitor {
            type Value = OptionSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of option names to option documentation")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<OptionSet, A::Error> {
                let mut entries = Vec::new();
                while let Some((name, spec)) = access.next_entry::<String, OptionSpec>()? {
                    entries.push((name, spec));
                }
                Ok(OptionSet(entries))
            }
        }

        deserializer.deserialize_map(OptionSetVisitor)
    }
}

/// Documentation record for one module, as produced by extraction.
///
/// # Examples
///
/// ```
/// use ansible_schema_core::ModuleRecord;
///
/// let record: ModuleRecord = serde_json::from_value(serde_json::json!({
///     "module": "file",
///     "description": ["Set attributes of files.", "Removes files."],
///     "options": { "path": { "required": "yes", "aliases": ["dest"] } }
/// }))
/// .unwrap();
///
/// assert_eq!(record.title.as_deref(), Some("file"));
/// assert_eq!(record.description, "Set attributes of files. Removes files.");
/// assert!(record.option("path").unwrap().required);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// Canonical module name (`title` or Ansible's `module` key).
    #[serde(default, alias = "module", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionSet>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    /// Every other top-level key, kept for marker detection.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ModuleRecord {
    /// Creates a record with a title and no options.
    pub fn new(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Self::default()
        }
    }

    /// Adds an option, keeping documentation order.
    pub fn with_option(mut self, name: &str, spec: OptionSpec) -> Self {
        let mut entries = self.options.take().map(|set| set.0).unwrap_or_default();
        entries.push((name.to_string(), spec));
        self.options = Some(OptionSet(entries));
        self
    }

    /// Iterates over documented options in order.
    pub fn option_entries(&self) -> impl Iterator<Item = (&str, &OptionSpec)> {
        self.options.iter().flat_map(|set| set.iter())
    }

    pub fn option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.as_ref().and_then(|set| set.get(name))
    }

    /// Returns `true` when the record carries the given top-level key.
    pub fn has_key(&self, key: &str) -> bool {
        self.extra.contains_key(key)
    }

    /// Module description, falling back to the short description.
    pub fn summary(&self) -> Option<String> {
        if !self.description.trim().is_empty() {
            return Some(self.description.clone());
        }
        self.short_description
            .as_ref()
            .filter(|text| !text.trim().is_empty())
            .cloned()
    }
}

/// A module record tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedRecord {
    /// Source identifier (usually a file path).
    pub source: String,
    pub record: ModuleRecord,
}

impl SourcedRecord {
    pub fn new(source: impl Into<String>, record: ModuleRecord) -> Self {
        Self {
            source: source.into(),
            record,
        }
    }
}

/// Primitive JSON Schema type tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
}

impl JsonType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inferred type of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyType {
    /// Bare primitive, rendered as `{"type": ...}`.
    Primitive(JsonType),
    /// Reference into the shared definitions block.
    Union(SharedUnion),
    /// Array whose items have the given type.
    Array(Box<PropertyType>),
    /// Bare `object`, produced by the dictionary heuristic.
    Object,
    /// Replacement schema fragment from a version-gated override.
    Fragment(Value),
}

impl PropertyType {
    /// Returns `true` for anything other than a bare primitive.
    pub fn is_structured(&self) -> bool {
        !matches!(self, Self::Primitive(_))
    }

    /// Schema for this type without description metadata.
    pub fn type_schema(&self) -> Value {
        match self {
            Self::Primitive(primitive) => json!({ "type": primitive.as_str() }),
            Self::Union(union) => json!({ "$ref": union.reference() }),
            Self::Array(items) => json!({ "type": "array", "items": items.type_schema() }),
            Self::Object => json!({ "type": "object" }),
            Self::Fragment(fragment) => fragment.clone(),
        }
    }
}

/// One named, typed option after inference.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    /// Description, possibly augmented with default or choice text.
    pub description: String,
    pub property_type: PropertyType,
    pub required: bool,
    pub aliases: Vec<String>,
    /// Choices that were resolved into an enum.
    pub choices: Option<Vec<Value>>,
}

impl Property {
    /// Creates an optional property with no aliases and no enum.
    pub fn new(name: &str, property_type: PropertyType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            property_type,
            required: false,
            aliases: Vec::new(),
            choices: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|alias| alias.to_string()).collect();
        self
    }

    pub fn with_choices(mut self, choices: Vec<Value>) -> Self {
        self.choices = Some(choices);
        self
    }

    /// The property's own name followed by its aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Renders the property as a JSON Schema fragment.
    ///
    /// Structured types are used as they are with the description attached;
    /// primitives are wrapped as `{type, description}` plus `enum` when the
    /// choices resolved to one.
    pub fn to_schema(&self) -> Value {
        let mut schema = match self.property_type.type_schema() {
            Value::Object(map) => map,
            other => return other,
        };
        if !self.property_type.is_structured() {
            if let Some(choices) = &self.choices {
                schema.insert("enum".to_string(), Value::Array(choices.clone()));
            }
        }
        if !schema.contains_key("description") {
            schema.insert(
                "description".to_string(),
                Value::String(self.description.clone()),
            );
        }
        Value::Object(schema)
    }
}

/// Returns the text form of a documentation value.
///
/// Strings are used verbatim; everything else uses its JSON rendering.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Python-style truthiness of a documentation value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Parses a YAML 1.1 truth word (`yes`, `off`, `True`, ...).
pub fn parse_truth_word(word: &str) -> Option<bool> {
    match word.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "on" | "true" | "1" => Some(true),
        "no" | "n" | "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawText {
        Text(String),
        Lines(Vec<Value>),
        Other(Value),
    }

    Ok(match Option::<RawText>::deserialize(deserializer)? {
        None => String::new(),
        Some(RawText::Text(text)) => text,
        Some(RawText::Lines(lines)) => lines
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(" "),
        Some(RawText::Other(value)) => display_value(&value),
    })
}

fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Flag(bool),
        Number(i64),
        Word(String),
    }

    match Option::<RawFlag>::deserialize(deserializer)? {
        None => Ok(false),
        Some(RawFlag::Flag(flag)) => Ok(flag),
        Some(RawFlag::Number(number)) => Ok(number != 0),
        Some(RawFlag::Word(word)) => parse_truth_word(&word)
            .ok_or_else(|| de::Error::custom(format!("invalid boolean value '{word}'"))),
    }
}
