//! Locating Ansible module sources and extracting their documentation.
//!
//! This crate feeds the synthesis engine: it walks a module tree, pulls the
//! `DOCUMENTATION` YAML out of each module (or its sidecar file) and parses
//! it into [`ModuleRecord`]s. Files that yield no record are reported, not
//! fatal.
//!
//! # Main entry points
//!
//! - [`discover_records`]: walk a directory and extract every record in
//!   parallel.
//! - [`extract_documentation`] / [`parse_record`]: work on a single source
//!   string.
//! - [`load_overrides`]: read a user override table.
//! - [`format_document`]: render the final document as JSON or YAML.
//!
//! # Example
//!
//! ```
//! use ansible_schema_discovery::{extract_documentation, parse_record};
//!
//! let source = "\
//! DOCUMENTATION = '''
//! module: ping
//! options:
//!   data:
//!     default: pong
//! '''
//! ";
//!
//! let record = parse_record(extract_documentation(source).unwrap()).unwrap();
//! assert_eq!(record.title.as_deref(), Some("ping"));
//! assert!(record.option("data").is_some());
//! ```
//!
//! [`ModuleRecord`]: ansible_schema_core::ModuleRecord

pub mod discover;
pub mod extract;
pub mod output;

pub use discover::{
    DiscoverError, DiscoveryOutcome, ExtractionFailure, collect_module_paths, discover_records,
    load_overrides,
};
pub use extract::{
    DOCUMENTATION_KEY, ExtractError, extract_documentation, extract_file, parse_record,
    parse_sidecar,
};
pub use output::{OutputFormat, format_document};
