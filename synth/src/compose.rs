//! Top-level composition of module schemas into one document.

use ansible_schema_core::{DefinitionRegistry, JSON_SCHEMA_DRAFT};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::assemble::ObjectSchema;

/// Task key holding the task's display name. No module may use it as a title.
pub const RESERVED_TASK_KEY: &str = "name";

/// Ordinary module schemas keyed by title, in insertion order.
///
/// The first schema inserted for a title wins; later inserts are refused.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleMap {
    entries: Vec<(String, ObjectSchema)>,
}

impl ModuleMap {
    /// Inserts a schema, returning `false` when the title is already taken
    /// or is [`RESERVED_TASK_KEY`].
    pub fn insert(&mut self, title: &str, schema: ObjectSchema) -> bool {
        if title == RESERVED_TASK_KEY || self.contains(title) {
            return false;
        }
        self.entries.push((title.to_string(), schema));
        true
    }

    pub fn contains(&self, title: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == title)
    }

    pub fn get(&self, title: &str) -> Option<&ObjectSchema> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == title)
            .map(|(_, schema)| schema)
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(title, _)| title.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ObjectSchema)> {
        self.entries
            .iter()
            .map(|(title, schema)| (title.as_str(), schema))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The `items` schema of a task list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskItems {
    #[serde(rename = "anyOf")]
    pub any_of: Vec<Value>,
}

/// The final composite schema document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeSchema {
    #[serde(rename = "$schema")]
    pub dialect: String,
    #[serde(rename = "type")]
    pub schema_type: String,
    pub items: TaskItems,
    pub definitions: Map<String, Value>,
    pub description: String,
    pub title: String,
}

impl CompositeSchema {
    /// The ordinary selector, always the last `anyOf` branch.
    pub fn ordinary_selector(&self) -> Option<&Value> {
        self.items.any_of.last()
    }

    /// Deferred command shapes, every `anyOf` branch but the last.
    pub fn deferred(&self) -> &[Value] {
        let len = self.items.any_of.len();
        &self.items.any_of[..len.saturating_sub(1)]
    }
}

/// Composes ordinary and deferred schemas into one document.
///
/// The root is an array of tasks; each task matches one deferred shape or
/// the ordinary selector, which requires `name` plus exactly one module key.
///
/// # Examples
///
/// ```
/// use ansible_schema_core::DefinitionRegistry;
/// use ansible_schema_synth::{ModuleMap, ObjectSchema, compose};
///
/// let mut ordinary = ModuleMap::default();
/// assert!(ordinary.insert("ping", ObjectSchema::default()));
/// assert!(!ordinary.insert("ping", ObjectSchema::default()));
///
/// let schema = compose(&ordinary, Vec::new(), &DefinitionRegistry::builtin(), "Tasks", "All tasks");
/// assert_eq!(schema.items.any_of.len(), 1);
/// assert!(schema.definitions.contains_key("ansible_truth"));
/// ```
pub fn compose(
    ordinary: &ModuleMap,
    deferred: Vec<Value>,
    definitions: &DefinitionRegistry,
    title: &str,
    description: &str,
) -> CompositeSchema {
    let mut any_of = deferred;
    any_of.push(ordinary_selector(ordinary));

    CompositeSchema {
        dialect: JSON_SCHEMA_DRAFT.to_string(),
        schema_type: "array".to_string(),
        items: TaskItems { any_of },
        definitions: definitions.to_map(),
        description: description.to_string(),
        title: title.to_string(),
    }
}

fn ordinary_selector(ordinary: &ModuleMap) -> Value {
    let mut properties = Map::new();
    properties.insert(RESERVED_TASK_KEY.to_string(), json!({ "type": "string" }));
    for (title, schema) in ordinary.iter() {
        properties.insert(title.to_string(), schema.to_value());
    }

    let mut selector = Map::new();
    selector.insert("type".to_string(), json!("object"));
    selector.insert("properties".to_string(), Value::Object(properties));
    selector.insert("required".to_string(), json!([RESERVED_TASK_KEY]));
    if !ordinary.is_empty() {
        let branches: Vec<Value> = ordinary
            .titles()
            .map(|title| json!({ "required": [title] }))
            .collect();
        selector.insert("oneOf".to_string(), Value::Array(branches));
    }
    Value::Object(selector)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(description: &str) -> ObjectSchema {
        ObjectSchema::default().with_description(Some(description.to_string()))
    }

    #[test]
    fn test_deferred_schemas_precede_selector() {
        let mut ordinary = ModuleMap::default();
        ordinary.insert("file", module("Files"));
        let deferred = vec![json!({ "title": "shell" }), json!({ "title": "raw" })];

        let schema = compose(
            &ordinary,
            deferred,
            &DefinitionRegistry::builtin(),
            "T",
            "D",
        );

        assert_eq!(schema.items.any_of.len(), 3);
        assert_eq!(schema.deferred().len(), 2);
        assert_eq!(schema.deferred()[0], json!({ "title": "shell" }));
        assert_eq!(
            schema.ordinary_selector().unwrap()["oneOf"],
            json!([{ "required": ["file"] }])
        );
    }

    #[test]
    fn test_selector_keeps_module_insertion_order() {
        let mut ordinary = ModuleMap::default();
        ordinary.insert("zypper", module("z"));
        ordinary.insert("apt", module("a"));
        ordinary.insert("file", module("f"));

        let schema = compose(&ordinary, Vec::new(), &DefinitionRegistry::builtin(), "T", "D");
        let selector = schema.ordinary_selector().unwrap();
        let keys: Vec<&String> = selector["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["name", "zypper", "apt", "file"]);
        assert_eq!(selector["required"], json!(["name"]));
        assert_eq!(
            selector["properties"]["apt"],
            json!({ "type": "object", "description": "a", "properties": {} })
        );
    }

    #[test]
    fn test_first_insert_wins_for_duplicate_titles() {
        let mut ordinary = ModuleMap::default();
        assert!(ordinary.insert("copy", module("first")));
        assert!(!ordinary.insert("copy", module("second")));
        assert_eq!(ordinary.len(), 1);
        assert_eq!(
            ordinary.get("copy").unwrap().description.as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_reserved_task_key_is_never_a_module_title() {
        let mut ordinary = ModuleMap::default();
        assert!(!ordinary.insert("name", module("shadows the task name")));
        assert!(ordinary.is_empty());

        let schema = compose(&ordinary, Vec::new(), &DefinitionRegistry::builtin(), "T", "D");
        let selector = schema.ordinary_selector().unwrap();
        assert_eq!(selector["properties"]["name"], json!({ "type": "string" }));
    }

    #[test]
    fn test_empty_selector_omits_one_of() {
        let schema = compose(
            &ModuleMap::default(),
            Vec::new(),
            &DefinitionRegistry::builtin(),
            "T",
            "D",
        );
        let selector = schema.ordinary_selector().unwrap();
        assert!(selector.get("oneOf").is_none());
        assert!(schema.deferred().is_empty());
    }

    #[test]
    fn test_document_serializes_with_schema_keywords() {
        let schema = compose(
            &ModuleMap::default(),
            Vec::new(),
            &DefinitionRegistry::builtin(),
            "Ansible Tasks",
            "Tasks",
        );
        let value = serde_json::to_value(&schema).unwrap();

        assert_eq!(value["$schema"], JSON_SCHEMA_DRAFT);
        assert_eq!(value["type"], "array");
        assert!(value["items"]["anyOf"].is_array());
        assert_eq!(value["title"], "Ansible Tasks");
        assert_eq!(
            value["definitions"]["ansible_number"],
            json!({ "oneOf": [{ "type": "integer" }, { "type": "string" }] })
        );
    }
}
