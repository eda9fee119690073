//! Type inference for individual options.
//!
//! Rules, in order:
//!
//! 1. Map the type hint to a base type. Integer and boolean hints resolve to
//!    shared unions because Ansible accepts looser spellings than JSON.
//! 2. A description starting with "List" turns the base type into an array
//!    of it; one starting with "[A/The] dictionary" replaces it with `object`.
//! 3. Choices on a plain string become an `enum`, unless a choice contains
//!    whitespace, in which case they are listed in the description.
//! 4. A matching version-gated override replaces all of the above.
//! 5. A non-falsy default is prefixed to the description.

use ansible_schema_core::{
    JsonType, OptionSpec, OverrideTable, Property, PropertyType, SharedUnion, TypeHint, Version,
    display_value,
};
use serde_json::Value;
use tracing::debug;

use crate::heuristics::{Container, ContainerHeuristics};

/// Resolved type and description for one option.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub property_type: PropertyType,
    pub description: String,
    /// Choices resolved into an enum.
    pub choices: Option<Vec<Value>>,
}

/// Output of [`TypeInference::infer`].
#[derive(Debug, Clone, PartialEq)]
pub struct InferredOption {
    pub required: bool,
    pub descriptor: TypeDescriptor,
    /// Choice values that could not become enum members.
    pub unsafe_choices: Vec<String>,
}

impl InferredOption {
    /// Turns the inference result into a named property.
    pub fn into_property(self, name: &str, aliases: &[String]) -> Property {
        Property {
            name: name.to_string(),
            description: self.descriptor.description,
            property_type: self.descriptor.property_type,
            required: self.required,
            aliases: aliases.to_vec(),
            choices: self.descriptor.choices,
        }
    }
}

/// Choice values of one option that were demoted to description text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsafeChoices {
    pub option: String,
    pub values: Vec<String>,
}

/// Properties inferred for a whole module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferredProperties {
    pub properties: Vec<Property>,
    pub unsafe_choices: Vec<UnsafeChoices>,
}

/// Infers property types for a fixed target version.
///
/// # Examples
///
/// ```
/// use ansible_schema_core::{OptionSpec, OverrideTable, TypeHint, Version};
/// use ansible_schema_synth::TypeInference;
///
/// let inference = TypeInference::new(OverrideTable::default(), Version::new(2, 5, 0));
/// let option = OptionSpec {
///     type_hint: TypeHint::Boolean,
///     description: "Create parent directories".to_string(),
///     ..OptionSpec::default()
/// };
///
/// let inferred = inference.infer(&option, "file", "recurse");
/// assert_eq!(
///     inferred.descriptor.property_type.type_schema(),
///     serde_json::json!({ "$ref": "#/definitions/ansible_truth" })
/// );
/// ```
#[derive(Debug, Clone)]
pub struct TypeInference {
    overrides: OverrideTable,
    heuristics: ContainerHeuristics,
    target_version: Version,
}

impl TypeInference {
    pub fn new(overrides: OverrideTable, target_version: Version) -> Self {
        Self {
            overrides,
            heuristics: ContainerHeuristics::default(),
            target_version,
        }
    }

    pub fn with_overrides(mut self, overrides: OverrideTable) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_heuristics(mut self, heuristics: ContainerHeuristics) -> Self {
        self.heuristics = heuristics;
        self
    }

    pub fn target_version(&self) -> Version {
        self.target_version
    }

    /// Infers the type descriptor of `module.name`.
    pub fn infer(&self, option: &OptionSpec, module: &str, name: &str) -> InferredOption {
        let mut description = option.description.clone();
        let mut choices = None;
        let mut unsafe_choices = Vec::new();

        let property_type = match self.overrides.lookup(module, name, &self.target_version) {
            Some(fragment) => {
                debug!(
                    module,
                    option = name,
                    version = %self.target_version,
                    "Applying version-gated override"
                );
                PropertyType::Fragment(fragment.clone())
            }
            None => {
                let resolved = match self.heuristics.detect(&option.description) {
                    Some(Container::List) => {
                        PropertyType::Array(Box::new(base_type(&option.type_hint)))
                    }
                    Some(Container::Dictionary) => PropertyType::Object,
                    None => base_type(&option.type_hint),
                };

                let values = option.choices.as_deref().filter(|values| !values.is_empty());
                if let (Some(values), PropertyType::Primitive(JsonType::String)) =
                    (values, &resolved)
                {
                    let rendered: Vec<String> = values.iter().map(display_value).collect();
                    unsafe_choices = rendered
                        .iter()
                        .filter(|choice| choice.chars().any(char::is_whitespace))
                        .cloned()
                        .collect();

                    if unsafe_choices.is_empty() {
                        choices = Some(rendered.into_iter().map(Value::String).collect());
                    } else {
                        debug!(
                            module,
                            option = name,
                            values = ?unsafe_choices,
                            "Choice values contain whitespace, listing them in the description"
                        );
                        description = append_choices(&description, &rendered);
                    }
                }

                resolved
            }
        };

        if let Some(default) = option.meaningful_default() {
            description = prefix_default(&description, default);
        }

        InferredOption {
            required: option.required,
            descriptor: TypeDescriptor {
                property_type,
                description,
                choices,
            },
            unsafe_choices,
        }
    }

    /// Infers every option of a module, keeping documentation order.
    pub fn infer_module<'a>(
        &self,
        module: &str,
        options: impl IntoIterator<Item = (&'a str, &'a OptionSpec)>,
    ) -> InferredProperties {
        let mut inferred = InferredProperties::default();
        for (name, option) in options {
            let result = self.infer(option, module, name);
            if !result.unsafe_choices.is_empty() {
                inferred.unsafe_choices.push(UnsafeChoices {
                    option: name.to_string(),
                    values: result.unsafe_choices.clone(),
                });
            }
            inferred
                .properties
                .push(result.into_property(name, &option.aliases));
        }
        inferred
    }
}

/// Base type for a type hint, before any heuristics.
pub fn base_type(hint: &TypeHint) -> PropertyType {
    match hint {
        TypeHint::Integer => PropertyType::Union(SharedUnion::Number),
        TypeHint::Boolean => PropertyType::Union(SharedUnion::Truth),
        TypeHint::Float => PropertyType::Primitive(JsonType::Number),
        TypeHint::Object => PropertyType::Primitive(JsonType::Object),
        TypeHint::String | TypeHint::Unspecified | TypeHint::Unrecognized(_) => {
            PropertyType::Primitive(JsonType::String)
        }
    }
}

fn append_choices(description: &str, choices: &[String]) -> String {
    let listing = choices
        .iter()
        .map(|choice| format!("- {choice}"))
        .collect::<Vec<_>>()
        .join("\n");
    if description.is_empty() {
        format!("Possible choices:\n{listing}")
    } else {
        format!("{description}\n\nPossible choices:\n{listing}")
    }
}

fn prefix_default(description: &str, default: &Value) -> String {
    let header = format!("Default: {}", display_value(default));
    if description.is_empty() {
        header
    } else {
        format!("{header}\n\n{description}")
    }
}

#[cfg(test)]
mod tests {
    use ansible_schema_core::{OverrideEntry, VersionReq};
    use serde_json::json;

    use super::*;

    fn inference() -> TypeInference {
        TypeInference::new(OverrideTable::default(), Version::new(2, 5, 0))
    }

    fn option(type_hint: TypeHint, description: &str) -> OptionSpec {
        OptionSpec {
            type_hint,
            description: description.to_string(),
            ..OptionSpec::default()
        }
    }

    #[test]
    fn test_base_types_follow_lookup_table() {
        assert_eq!(
            base_type(&TypeHint::Integer),
            PropertyType::Union(SharedUnion::Number)
        );
        assert_eq!(
            base_type(&TypeHint::Float),
            PropertyType::Primitive(JsonType::Number)
        );
        assert_eq!(
            base_type(&TypeHint::Unrecognized("path".to_string())),
            PropertyType::Primitive(JsonType::String)
        );
        assert_eq!(
            base_type(&TypeHint::Unspecified),
            PropertyType::Primitive(JsonType::String)
        );
    }

    #[test]
    fn test_list_description_wraps_base_type() {
        let inferred = inference().infer(&option(TypeHint::String, "List of strings"), "m", "o");
        assert_eq!(
            inferred.descriptor.property_type.type_schema(),
            json!({ "type": "array", "items": { "type": "string" } })
        );

        let inferred = inference().infer(&option(TypeHint::Integer, "List of ports"), "m", "o");
        assert_eq!(
            inferred.descriptor.property_type.type_schema(),
            json!({ "type": "array", "items": { "$ref": "#/definitions/ansible_number" } })
        );
    }

    #[test]
    fn test_dictionary_description_discards_base_type() {
        let inferred = inference().infer(
            &option(TypeHint::Integer, "A dictionary of values"),
            "m",
            "o",
        );
        assert_eq!(
            inferred.descriptor.property_type.type_schema(),
            json!({ "type": "object" })
        );
    }

    #[test]
    fn test_safe_choices_become_enum() {
        let mut spec = option(TypeHint::Unspecified, "State");
        spec.choices = Some(vec![json!("a"), json!("b")]);

        let inferred = inference().infer(&spec, "m", "state");
        assert_eq!(inferred.descriptor.choices, Some(vec![json!("a"), json!("b")]));
        assert_eq!(inferred.descriptor.description, "State");
        assert!(inferred.unsafe_choices.is_empty());
    }

    #[test]
    fn test_whitespace_choices_move_to_description() {
        let mut spec = option(TypeHint::String, "Mode");
        spec.choices = Some(vec![json!("a b"), json!("c")]);

        let inferred = inference().infer(&spec, "m", "mode");
        assert_eq!(inferred.descriptor.choices, None);
        assert_eq!(
            inferred.descriptor.description,
            "Mode\n\nPossible choices:\n- a b\n- c"
        );
        assert_eq!(inferred.unsafe_choices, vec!["a b".to_string()]);
    }

    #[test]
    fn test_choices_ignored_for_non_string_types() {
        let mut spec = option(TypeHint::Boolean, "Flag");
        spec.choices = Some(vec![json!("yes"), json!("no")]);
        let inferred = inference().infer(&spec, "m", "flag");
        assert_eq!(inferred.descriptor.choices, None);

        let mut spec = option(TypeHint::String, "List of states");
        spec.choices = Some(vec![json!("a")]);
        let inferred = inference().infer(&spec, "m", "states");
        assert_eq!(inferred.descriptor.choices, None);
    }

    #[test]
    fn test_numeric_choices_are_stringified() {
        let mut spec = option(TypeHint::Unspecified, "Level");
        spec.choices = Some(vec![json!(1), json!(2)]);
        let inferred = inference().infer(&spec, "m", "level");
        assert_eq!(inferred.descriptor.choices, Some(vec![json!("1"), json!("2")]));
    }

    #[test]
    fn test_override_respects_target_version() {
        let overrides = OverrideTable::new([OverrideEntry::new(
            "file",
            "mode",
            VersionReq::less_than(Version::new(2, 6, 0)),
            json!({ "type": "integer" }),
        )]);
        let mut spec = option(TypeHint::String, "Permissions");
        spec.choices = Some(vec![json!("0644")]);

        let old = TypeInference::new(overrides.clone(), Version::new(2, 5, 0));
        let inferred = old.infer(&spec, "file", "mode");
        assert_eq!(
            inferred.descriptor.property_type,
            PropertyType::Fragment(json!({ "type": "integer" }))
        );
        assert_eq!(inferred.descriptor.choices, None);

        let new = TypeInference::new(overrides, Version::new(2, 6, 0));
        let inferred = new.infer(&spec, "file", "mode");
        assert_eq!(
            inferred.descriptor.property_type,
            PropertyType::Primitive(JsonType::String)
        );
    }

    #[test]
    fn test_default_is_prefixed_after_choice_listing() {
        let mut spec = option(TypeHint::String, "Mode");
        spec.default = Some(json!("x y"));
        spec.choices = Some(vec![json!("x y"), json!("z")]);

        let inferred = inference().infer(&spec, "m", "mode");
        assert_eq!(
            inferred.descriptor.description,
            "Default: x y\n\nMode\n\nPossible choices:\n- x y\n- z"
        );
    }

    #[test]
    fn test_falsy_default_is_not_mentioned() {
        let mut spec = option(TypeHint::Boolean, "Force");
        spec.default = Some(json!(false));
        let inferred = inference().infer(&spec, "m", "force");
        assert_eq!(inferred.descriptor.description, "Force");
    }

    #[test]
    fn test_infer_module_collects_unsafe_choices_and_aliases() {
        let mut spec = option(TypeHint::String, "Mode");
        spec.choices = Some(vec![json!("read only")]);
        spec.aliases = vec!["access".to_string()];
        spec.required = true;

        let inferred = inference().infer_module("m", [("mode", &spec)]);
        assert_eq!(inferred.properties.len(), 1);
        assert_eq!(inferred.properties[0].aliases, vec!["access".to_string()]);
        assert!(inferred.properties[0].required);
        assert_eq!(
            inferred.unsafe_choices,
            vec![UnsafeChoices {
                option: "mode".to_string(),
                values: vec!["read only".to_string()],
            }]
        );
    }
}
