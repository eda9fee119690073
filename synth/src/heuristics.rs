//! Container detection from option descriptions.
//!
//! Module documentation rarely declares list or dict types, but the prose
//! usually gives it away ("List of users...", "A dictionary of headers...").
//! Two independent patterns are checked in order and the first match wins.

use std::sync::LazyLock;

use regex::Regex;

/// Default pattern for list-valued options.
pub const LIST_PATTERN: &str = r"^\s*[Ll]ist\b";
/// Default pattern for dictionary-valued options.
pub const DICTIONARY_PATTERN: &str = r"^\s*(?:(?:[Aa]n?|[Tt]he)\s+)?[Dd]ictionary\b";

static LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(LIST_PATTERN).expect("static regex must compile"));
static DICTIONARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DICTIONARY_PATTERN).expect("static regex must compile"));

/// Container shape detected from a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    List,
    Dictionary,
}

/// The pair of description patterns used for container detection.
///
/// # Examples
///
/// ```
/// use ansible_schema_synth::{Container, ContainerHeuristics};
///
/// let heuristics = ContainerHeuristics::default();
/// assert_eq!(heuristics.detect("List of strings"), Some(Container::List));
/// assert_eq!(heuristics.detect("A dictionary of values"), Some(Container::Dictionary));
/// assert_eq!(heuristics.detect("Listen address"), None);
/// ```
#[derive(Debug, Clone)]
pub struct ContainerHeuristics {
    list: Regex,
    dictionary: Regex,
}

impl ContainerHeuristics {
    pub fn new(list: Regex, dictionary: Regex) -> Self {
        Self { list, dictionary }
    }

    /// Compiles custom patterns.
    pub fn from_patterns(list: &str, dictionary: &str) -> Result<Self, regex::Error> {
        Ok(Self::new(Regex::new(list)?, Regex::new(dictionary)?))
    }

    pub fn is_list(&self, description: &str) -> bool {
        self.list.is_match(description)
    }

    pub fn is_dictionary(&self, description: &str) -> bool {
        self.dictionary.is_match(description)
    }

    /// Returns the container shape, checking lists before dictionaries.
    pub fn detect(&self, description: &str) -> Option<Container> {
        if self.is_list(description) {
            Some(Container::List)
        } else if self.is_dictionary(description) {
            Some(Container::Dictionary)
        } else {
            None
        }
    }
}

impl Default for ContainerHeuristics {
    fn default() -> Self {
        Self::new(LIST_RE.clone(), DICTIONARY_RE.clone())
    }
}
