//! Filesystem discovery over temporary module trees.

use std::fs;
use std::path::Path;

use ansible_schema_core::{OverrideTable, Version};
use ansible_schema_discovery::{
    DiscoverError, collect_module_paths, discover_records, load_overrides,
};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn module_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(
        root,
        "files/file.py",
        "DOCUMENTATION = '''\nmodule: file\noptions:\n  path:\n    required: true\n'''\n",
    );
    write(
        root,
        "commands/shell.py",
        "DOCUMENTATION = r\"\"\"\nmodule: shell\noptions:\n  free_form:\n    required: true\n\"\"\"\n",
    );
    write(root, "windows/win_ping.yml", "DOCUMENTATION:\n  module: win_ping\n");
    write(root, "files/__init__.py", "");
    write(root, "module_utils/helpers.py", "def helper():\n    pass\n");
    write(root, "broken.py", "DOCUMENTATION = '''\nmodule: [oops\n'''\n");
    write(root, "notes.txt", "not a module");
    write(root, ".git/hooks/pre-commit.py", "DOCUMENTATION = '''\nmodule: hidden\n'''\n");

    dir
}

#[test]
fn test_collect_module_paths_is_recursive_sorted_and_filtered() {
    let tree = module_tree();
    let paths = collect_module_paths(tree.path()).unwrap();

    let relative: Vec<String> = paths
        .iter()
        .map(|path| {
            path.strip_prefix(tree.path())
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();

    assert_eq!(
        relative,
        vec![
            "broken.py",
            "commands/shell.py",
            "files/file.py",
            "module_utils/helpers.py",
            "windows/win_ping.yml",
        ]
    );
}

#[test]
fn test_discover_records_splits_records_and_failures() {
    let tree = module_tree();
    let outcome = discover_records(tree.path(), Some(2)).unwrap();

    let titles: Vec<Option<&str>> = outcome
        .records
        .iter()
        .map(|sourced| sourced.record.title.as_deref())
        .collect();
    assert_eq!(titles, vec![Some("shell"), Some("file"), Some("win_ping")]);
    assert!(outcome.records[0].source.ends_with("shell.py"));

    assert_eq!(outcome.failures.len(), 2);
    assert!(outcome.failures[0].path.ends_with("broken.py"));
    assert!(outcome.failures[0].reason.contains("YAML"));
    assert!(outcome.failures[1].path.ends_with("helpers.py"));
    assert_eq!(outcome.failures[1].reason, "no DOCUMENTATION block found");
}

#[test]
fn test_discover_records_is_stable_across_job_counts() {
    let tree = module_tree();
    let serial = discover_records(tree.path(), Some(1)).unwrap();
    let parallel = discover_records(tree.path(), None).unwrap();

    let sources = |outcome: &ansible_schema_discovery::DiscoveryOutcome| {
        outcome
            .records
            .iter()
            .map(|sourced| sourced.source.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(sources(&serial), sources(&parallel));
    assert_eq!(serial.failures, parallel.failures);
}

#[test]
fn test_discover_records_rejects_missing_directory() {
    let tree = TempDir::new().unwrap();
    let missing = tree.path().join("absent");
    assert!(matches!(
        discover_records(&missing, None),
        Err(DiscoverError::InvalidInput(_))
    ));
}

#[test]
fn test_load_overrides_from_yaml_and_json() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "overrides.yml",
        "- module: user\n  option: uid\n  range: '<2.4'\n  schema:\n    type: integer\n",
    );
    write(
        dir.path(),
        "overrides.json",
        r#"[{"module": "user", "option": "group", "range": ">=2.0", "schema": {"type": "string"}}]"#,
    );

    let mut entries = load_overrides(&dir.path().join("overrides.yml")).unwrap();
    entries.extend(load_overrides(&dir.path().join("overrides.json")).unwrap());
    let table = OverrideTable::new(entries);

    assert!(table.lookup("user", "uid", &Version::new(2, 3, 0)).is_some());
    assert!(table.lookup("user", "uid", &Version::new(2, 4, 0)).is_none());
    assert!(table.lookup("user", "group", &Version::new(2, 5, 0)).is_some());
}

#[test]
fn test_load_overrides_reports_bad_input() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "bad.json", "{ not json");
    write(
        dir.path(),
        "scalar.yml",
        "- module: file\n  option: mode\n  range: '<9.0'\n  schema: string\n",
    );

    assert!(matches!(
        load_overrides(&dir.path().join("bad.json")),
        Err(DiscoverError::Json(_))
    ));

    let err = load_overrides(&dir.path().join("scalar.yml")).unwrap_err();
    assert!(matches!(err, DiscoverError::Yaml(_)));
    assert!(
        err.to_string().contains("override schema must be a mapping"),
        "{err}"
    );
    assert!(matches!(
        load_overrides(&dir.path().join("missing.yml")),
        Err(DiscoverError::InvalidInput(_))
    ));
}
