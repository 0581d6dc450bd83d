//! Integration tests for curatr
//!
//! These tests verify end-to-end functionality: loading a specification
//! from its TOML definition, indexing a real temporary tree, querying the
//! result, and planning a reorganization of an unstructured source tree.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use curatr::rules::{OrganizePlanner, RenameRule, TagRule};
use curatr::walk::IndexOptions;
use curatr::{Layout, Specification};

const DEFINITION: &str = r#"
name = "recordings"
path_patterns = [
    "sub-{subject}[/ses-{session}]/sub-{subject}[_ses-{session}]_task-{task}_{suffix}{extension}",
    "sub-{subject}/{suffix}{extension}",
]

[[tags]]
name = "subject"
pattern = 'sub-(\w+)'

[[tags]]
name = "session"
pattern = 'ses-(\w+)'

[[tags]]
name = "task"
pattern = 'task-(\w+)'

[[tags]]
name = "suffix"
pattern = '_(\w+)\.'

[[tags]]
name = "extension"
pattern = '(\.[\w.]+)$'
"#;

/// Helper to load the shared specification from a definition file on disk
fn load_specification(dir: &TempDir) -> Specification {
    let path = dir.path().join("recordings.toml");
    fs::write(&path, DEFINITION).unwrap();
    Specification::from_file(&path).unwrap()
}

/// Helper to create files (with parents) under a root
fn populate(root: &Path, rel_paths: &[&str]) {
    for rel in rel_paths {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"content").unwrap();
    }
}

/// Helper building an indexed layout over a standard fixture tree
fn indexed_layout(dir: &TempDir) -> Layout {
    populate(
        dir.path(),
        &[
            "sub-01/ses-01/sub-01_ses-01_task-rest_eeg.vhdr",
            "sub-01/ses-02/sub-01_ses-02_task-rest_eeg.vhdr",
            "sub-01/ses-02/sub-01_ses-02_task-nback_eeg.vhdr",
            "sub-02/ses-01/sub-02_ses-01_task-rest_eeg.vhdr",
            "sub-01/ses-01/notes.md",
            "code/analysis.py",
        ],
    );
    let mut layout = Layout::new(dir.path().to_str().unwrap(), load_specification(dir)).unwrap();
    layout
        .index_tree(&IndexOptions::new().skip([r"\.toml$"]))
        .unwrap();
    layout
}

#[test]
fn test_index_accepts_only_canonical_paths() {
    let dir = TempDir::new().unwrap();
    let layout = indexed_layout(&dir);

    // Four recordings; notes.md and the code directory never validate.
    assert_eq!(layout.len(), 4);
    assert!(!layout.query_paths(&[]).iter().any(|p| p.contains("notes")));
}

#[test]
fn test_round_trip_holds_for_every_member() {
    let dir = TempDir::new().unwrap();
    let layout = indexed_layout(&dir);

    for file in layout.files() {
        let rel = file.rel_path().unwrap();
        assert!(layout.specification().validate_path(&rel), "{rel}");
    }
}

#[test]
fn test_multi_attribute_queries() {
    let dir = TempDir::new().unwrap();
    let layout = indexed_layout(&dir);

    assert_eq!(layout.query(&[("subject", "01")]).len(), 3);
    assert_eq!(
        layout.query_rel_paths(&[("subject", "01"), ("session", "02"), ("task", "rest")]),
        vec!["sub-01/ses-02/sub-01_ses-02_task-rest_eeg.vhdr"]
    );
    // AND across names, empty on a contradiction within one name.
    assert!(
        layout
            .query(&[("task", "rest"), ("task", "nback")])
            .is_empty()
    );
}

#[test]
fn test_facet_values() {
    let dir = TempDir::new().unwrap();
    let layout = indexed_layout(&dir);

    assert_eq!(layout.tag_values("subject", &[]), vec!["01", "02"]);
    assert_eq!(
        layout.tag_values("session", &[("subject", "01")]),
        vec!["01", "02"]
    );
    assert_eq!(
        layout.tag_values("task", &[("session", "01")]),
        vec!["rest"]
    );
}

#[test]
fn test_sidecar_metadata_enriches_queries() {
    let dir = TempDir::new().unwrap();
    let mut layout = indexed_layout(&dir);

    let path = layout.query_paths(&[("subject", "01"), ("session", "01")])[0].clone();
    let sidecar = serde_json::json!({"amplifier": "actiCHamp", "channels": {"count": 64}});
    layout.annotate_metadata(&path, &sidecar).unwrap();

    assert_eq!(
        layout.query_paths(&[("amplifier", "actiCHamp")]),
        vec![path.clone()]
    );
    // The nested object never became a tag.
    assert!(layout.get(&path).unwrap().tag("channels").is_none());
}

#[test]
fn test_reindex_with_reset_follows_the_tree() {
    let dir = TempDir::new().unwrap();
    let mut layout = indexed_layout(&dir);
    let before = layout.len();

    let extra = dir
        .path()
        .join("sub-03/ses-01/sub-03_ses-01_task-rest_eeg.vhdr");
    fs::create_dir_all(extra.parent().unwrap()).unwrap();
    fs::write(&extra, b"content").unwrap();

    layout
        .index_tree(&IndexOptions::new().reset(true).skip([r"\.toml$"]))
        .unwrap();
    assert_eq!(layout.len(), before + 1);
    assert_eq!(layout.tag_values("subject", &[]), vec!["01", "02", "03"]);
}

#[test]
fn test_build_path_strictness_end_to_end() {
    let dir = TempDir::new().unwrap();
    let spec = load_specification(&dir);

    let mut tags = HashMap::new();
    tags.insert("subject".to_string(), "05".to_string());
    tags.insert("task".to_string(), "rest".to_string());
    tags.insert("suffix".to_string(), "eeg".to_string());
    tags.insert("extension".to_string(), "vhdr".to_string());
    tags.insert("acquisition".to_string(), "highres".to_string());

    // Permissive mode ignores the surplus tag and normalizes the extension.
    assert_eq!(
        spec.build_path(&tags, false).as_deref(),
        Some("sub-05/sub-05_task-rest_eeg.vhdr")
    );
    // Strict mode refuses: no template references "acquisition".
    assert!(spec.build_path(&tags, true).is_none());
}

#[test]
fn test_organize_plan_from_raw_tree() {
    let dir = TempDir::new().unwrap();
    let spec = load_specification(&dir);

    let planner = OrganizePlanner::new(&spec, r"P\d+.*\.eeg$")
        .unwrap()
        .tag_rules(vec![
            TagRule::from_pattern("subject", r"P(\d+)").unwrap().prepend("0"),
            TagRule::from_pattern("task", r"(rest|nback)").unwrap(),
            TagRule::fixed("suffix", "eeg"),
            TagRule::fixed("extension", ".eeg"),
        ])
        .rename_rules(vec![RenameRule::new(r"\.vmrk$", "events").unwrap()]);

    let moves = planner.plan([
        "/incoming/P7_rest_raw.eeg",
        "/incoming/P7_rest_raw.vmrk",
        "/incoming/readme.txt",
    ]);
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].destination, "sub-07/sub-07_task-rest_eeg.eeg");

    // The marker file rides along as a fellow with a re-tagged suffix.
    let fellow = planner
        .plan_fellow("/incoming/P7_rest_raw.vmrk", &moves[0].tags)
        .unwrap();
    assert_eq!(fellow.destination, "sub-07/sub-07_task-rest_events.vmrk");

    // Planned destinations are canonical under the specification.
    assert!(spec.validate_path(&moves[0].destination));
    assert!(spec.validate_path(&fellow.destination));
}

#[test]
fn test_planned_destinations_index_cleanly() {
    let source = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let spec = load_specification(&source);

    populate(source.path(), &["P9_nback_raw.eeg"]);

    let planner = OrganizePlanner::new(&spec, r"P\d+.*\.eeg$")
        .unwrap()
        .tag_rules(vec![
            TagRule::from_pattern("subject", r"P(\d+)").unwrap().prepend("0"),
            TagRule::from_pattern("task", r"(rest|nback)").unwrap(),
            TagRule::fixed("suffix", "eeg"),
            TagRule::fixed("extension", ".eeg"),
        ]);

    let candidate = source.path().join("P9_nback_raw.eeg");
    let moves = planner.plan([candidate.to_str().unwrap()]);
    assert_eq!(moves.len(), 1);

    // Materialize the plan the way a copy step would, then re-index.
    let target = dest.path().join(&moves[0].destination);
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    fs::write(&target, b"content").unwrap();

    let mut layout = Layout::new(dest.path().to_str().unwrap(), spec).unwrap();
    let added = layout.index_tree(&IndexOptions::new()).unwrap();
    assert_eq!(added, 1);
    assert_eq!(
        layout.query(&[("subject", "09"), ("task", "nback")]).len(),
        1
    );
}
