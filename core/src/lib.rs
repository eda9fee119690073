//! Core types for synthesizing JSON Schemas from Ansible module documentation.
//!
//! This crate defines the data model shared by the engine, discovery and CLI
//! crates:
//!
//! - [`ModuleRecord`] / [`OptionSpec`]: the documentation block of one
//!   module, deserialized leniently from YAML or JSON.
//! - [`Property`] / [`PropertyType`]: one option after type inference,
//!   renderable as a JSON Schema fragment.
//! - [`SharedUnion`] / [`DefinitionRegistry`]: the reusable `ansible_*`
//!   union types referenced through `$ref`.
//! - [`Version`] / [`VersionReq`]: semantic versions and range predicates.
//! - [`OverrideTable`]: version-gated replacement schemas keyed by
//!   `(module, option)`.
//!
//! # Example
//!
//! ```
//! use ansible_schema_core::*;
//!
//! let record = ModuleRecord::new("stat").with_option(
//!     "path",
//!     OptionSpec {
//!         required: true,
//!         aliases: vec!["dest".to_string()],
//!         ..OptionSpec::default()
//!     },
//! );
//! assert_eq!(record.option_entries().count(), 1);
//!
//! let overrides = OverrideTable::builtin();
//! assert!(overrides.lookup("file", "mode", &Version::new(2, 5, 0)).is_some());
//! assert_eq!(DefinitionRegistry::builtin().len(), SharedUnion::ALL.len());
//! ```

mod definitions;
mod overrides;
mod types;
mod version;

pub use definitions::{DEFINITION_PREFIX, DefinitionRegistry, SharedUnion};
pub use overrides::{OverrideEntry, OverrideTable};
pub use types::*;
pub use version::{Version, VersionError, VersionReq};

/// JSON Schema dialect stamped on generated documents.
pub const JSON_SCHEMA_DRAFT: &str = "http://json-schema.org/draft-04/schema#";

/// Target Ansible version used when none is given.
pub const DEFAULT_TARGET_VERSION: Version = Version::new(2, 5, 0);
