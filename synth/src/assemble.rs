//! Property assembly into an object schema.
//!
//! Every property is expanded into one entry per name (its own name, then
//! its aliases). Names must be unique across the whole flattened set: an
//! option colliding with another option's alias is rejected, never merged.
//! Alias groups become `allOf` clauses; without alias groups a flat
//! `required` list is emitted instead.

use std::collections::HashSet;

use ansible_schema_core::Property;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Reasons a module's properties cannot be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// Flattened property/alias names repeat.
    #[error("duplicate property names: {}", .0.join(", "))]
    DuplicateName(Vec<String>),
    /// Strict mode and no property is required.
    #[error("module has no required properties")]
    NoRequirements,
}

/// An object-typed schema fragment for one module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub description: Option<String>,
    /// Property schemas keyed by name and alias, in documentation order.
    pub properties: Map<String, Value>,
    pub required: Vec<String>,
    /// Alias mutual-exclusion clauses.
    pub all_of: Vec<Value>,
}

impl ObjectSchema {
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Renders the fragment; empty `required`/`allOf` are omitted.
    pub fn to_value(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        if let Some(description) = &self.description {
            schema.insert("description".to_string(), json!(description));
        }
        schema.insert(
            "properties".to_string(),
            Value::Object(self.properties.clone()),
        );
        if !self.required.is_empty() {
            schema.insert("required".to_string(), json!(self.required));
        }
        if !self.all_of.is_empty() {
            schema.insert("allOf".to_string(), Value::Array(self.all_of.clone()));
        }
        Value::Object(schema)
    }
}

/// Assembles properties into an object schema.
///
/// Fails with [`AssemblyError::DuplicateName`] whenever two flattened names
/// collide, and with [`AssemblyError::NoRequirements`] when `strict` is set,
/// no alias group exists and no property is required.
///
/// # Examples
///
/// ```
/// use ansible_schema_core::{JsonType, Property, PropertyType};
/// use ansible_schema_synth::{AssemblyError, assemble};
///
/// let path = Property::new("path", PropertyType::Primitive(JsonType::String), "Path").required();
/// let schema = assemble(&[path], true).unwrap();
/// assert_eq!(schema.required, vec!["path".to_string()]);
/// assert!(schema.all_of.is_empty());
///
/// let src = Property::new("src", PropertyType::Primitive(JsonType::String), "Source");
/// let dest = Property::new("dest", PropertyType::Primitive(JsonType::String), "Target")
///     .with_aliases(&["src"]);
/// assert_eq!(
///     assemble(&[src, dest], false),
///     Err(AssemblyError::DuplicateName(vec!["src".to_string()]))
/// );
/// ```
pub fn assemble(properties: &[Property], strict: bool) -> Result<ObjectSchema, AssemblyError> {
    let duplicates = duplicate_names(properties);
    if !duplicates.is_empty() {
        return Err(AssemblyError::DuplicateName(duplicates));
    }

    let mut schema_properties = Map::new();
    for property in properties {
        let rendered = property.to_schema();
        for name in property.names() {
            schema_properties.insert(name.to_string(), rendered.clone());
        }
    }

    let mut all_of = Vec::new();
    for property in properties.iter().filter(|p| !p.aliases.is_empty()) {
        all_of.extend(alias_constraints(property));
    }

    let has_alias_groups = !all_of.is_empty();
    let required: Vec<String> = if has_alias_groups {
        Vec::new()
    } else {
        properties
            .iter()
            .filter(|property| property.required)
            .map(|property| property.name.clone())
            .collect()
    };

    if strict && !has_alias_groups && required.is_empty() {
        return Err(AssemblyError::NoRequirements);
    }

    Ok(ObjectSchema {
        description: None,
        properties: schema_properties,
        required,
        all_of,
    })
}

/// Mutual-exclusion clauses for one aliased property.
///
/// The group may never be present all at once; a required property must
/// additionally be given under exactly one of its names.
pub fn alias_constraints(property: &Property) -> Vec<Value> {
    let group: Vec<&str> = property.names().collect();
    let mut clauses = vec![json!({ "not": { "required": group } })];
    if property.required {
        let choices: Vec<Value> = group
            .iter()
            .map(|name| json!({ "required": [name] }))
            .collect();
        clauses.push(json!({ "oneOf": choices }));
    }
    clauses
}

/// Names that appear more than once after alias expansion, in first-repeat
/// order.
pub fn duplicate_names(properties: &[Property]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for name in properties.iter().flat_map(|property| property.names()) {
        if !seen.insert(name) && !duplicates.iter().any(|dup: &String| dup == name) {
            duplicates.push(name.to_string());
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use ansible_schema_core::{JsonType, PropertyType, SharedUnion};

    use super::*;

    fn string_property(name: &str) -> Property {
        Property::new(name, PropertyType::Primitive(JsonType::String), name)
    }

    #[test]
    fn test_required_without_aliases_emits_flat_list() {
        let properties = vec![
            string_property("path").required(),
            string_property("owner"),
        ];

        let schema = assemble(&properties, false).unwrap();
        assert_eq!(
            schema.to_value(),
            json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "path" },
                    "owner": { "type": "string", "description": "owner" }
                },
                "required": ["path"]
            })
        );
    }

    #[test]
    fn test_aliases_share_schema_and_build_exclusion_group() {
        let properties = vec![
            string_property("path").required().with_aliases(&["dest", "name"]),
            string_property("owner").required(),
        ];

        let schema = assemble(&properties, true).unwrap();
        assert_eq!(schema.properties.len(), 4);
        assert_eq!(schema.properties["dest"], schema.properties["path"]);
        assert!(schema.required.is_empty());
        assert_eq!(
            schema.all_of,
            vec![
                json!({ "not": { "required": ["path", "dest", "name"] } }),
                json!({ "oneOf": [
                    { "required": ["path"] },
                    { "required": ["dest"] },
                    { "required": ["name"] }
                ] }),
            ]
        );
    }

    #[test]
    fn test_optional_alias_group_has_no_one_of() {
        let properties = vec![string_property("src").with_aliases(&["source"])];
        let schema = assemble(&properties, false).unwrap();
        assert_eq!(
            schema.all_of,
            vec![json!({ "not": { "required": ["src", "source"] } })]
        );
    }

    #[test]
    fn test_duplicate_across_name_and_alias_is_rejected() {
        let properties = vec![
            string_property("dest"),
            string_property("path").with_aliases(&["dest"]),
            string_property("name").with_aliases(&["dest"]),
        ];
        assert_eq!(
            assemble(&properties, false),
            Err(AssemblyError::DuplicateName(vec!["dest".to_string()]))
        );
    }

    #[test]
    fn test_strict_without_requirements_fails() {
        let properties = vec![string_property("owner")];
        assert_eq!(
            assemble(&properties, true),
            Err(AssemblyError::NoRequirements)
        );

        let schema = assemble(&properties, false).unwrap();
        assert!(schema.required.is_empty());
        assert!(schema.to_value().get("required").is_none());
    }

    #[test]
    fn test_structured_types_keep_their_shape() {
        let properties = vec![Property::new(
            "force",
            PropertyType::Union(SharedUnion::Truth),
            "Force",
        )];
        let schema = assemble(&properties, false).unwrap();
        assert_eq!(
            schema.properties["force"],
            json!({ "$ref": "#/definitions/ansible_truth", "description": "Force" })
        );
    }

    #[test]
    fn test_empty_property_list_assembles_in_lenient_mode() {
        let schema = assemble(&[], false).unwrap();
        assert_eq!(schema.to_value(), json!({ "type": "object", "properties": {} }));
    }
}
