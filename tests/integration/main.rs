//! Integration tests for Trellis
//!
//! These tests drive discovery, the model cache, projection and the
//! conditional writer together against a real site directory.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde_json::Value;
use tempfile::TempDir;
use trellis_indexer::SiteConfig;
use trellis_site::{GenerationPipeline, StaticFileRegistry};

const TWO_APPS: &str = r#"{
    "id": "landscape",
    "name": "Landscape",
    "elements": [
        {"id": "web", "name": "Web Shop", "type": "ApplicationComponent"},
        {"id": "erp", "name": "ERP", "type": "ApplicationComponent",
         "documentation": "Books orders"}
    ],
    "relationships": [
        {"id": "serves", "type": "ServingRelationship", "source": "erp", "target": "web"}
    ],
    "diagrams": [
        {"id": "overview", "name": "Overview", "elements": ["web", "erp"], "relationships": ["serves"]}
    ],
    "folders": [
        {"id": "views", "name": "Views", "items": ["overview"]}
    ],
    "root_folders": ["views"]
}"#;

fn set_mtime(path: &Path, when: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(when)
        .unwrap();
}

/// Site with one model source last modified an hour ago.
fn site() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("arch").join("landscape.model.json");
    std::fs::create_dir_all(source.parent().unwrap()).unwrap();
    std::fs::write(&source, TWO_APPS).unwrap();
    set_mtime(&source, SystemTime::now() - Duration::from_secs(3600));
    (dir, source)
}

fn pipeline(root: &Path) -> (GenerationPipeline, Arc<StaticFileRegistry>) {
    let registry = Arc::new(StaticFileRegistry::new());
    let config = SiteConfig::load(root).unwrap();
    let pipeline = GenerationPipeline::from_config(config, registry.clone()).unwrap();
    (pipeline, registry)
}

fn count_entities(index: &Value, kind: &str) -> usize {
    index["entities"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["type"] == kind)
        .count()
}

/// Generate, re-run without changes, then touch the source.
#[test]
fn test_end_to_end_generation() {
    let (dir, source) = site();
    let (pipeline, registry) = pipeline(dir.path());

    let first = pipeline.run(&pipeline.discover().unwrap());
    assert!(first.is_success(), "{:?}", first.failures);
    assert_eq!(first.writes(), 2);

    let index_path = dir.path().join("arch/index.json");
    let index: Value = serde_json::from_str(&std::fs::read_to_string(&index_path).unwrap()).unwrap();
    assert_eq!(count_entities(&index, "Model"), 1);
    assert_eq!(count_entities(&index, "Element"), 2);
    assert_eq!(count_entities(&index, "Relationship"), 1);
    assert_eq!(count_entities(&index, "Diagram"), 1);
    assert_eq!(index["folders"][0]["diagrams"][0], "overview");
    assert!(dir.path().join("arch/svg/overview.svg").exists());
    assert_eq!(
        registry.files(),
        vec![
            PathBuf::from("arch/index.json"),
            PathBuf::from("arch/svg/overview.svg")
        ]
    );

    let unchanged = pipeline.run(&pipeline.discover().unwrap());
    assert_eq!(unchanged.writes(), 0);
    assert_eq!(pipeline.cache().load_count(), 1);

    set_mtime(&source, SystemTime::now() + Duration::from_secs(3600));
    let touched = pipeline.run(&pipeline.discover().unwrap());
    assert_eq!(touched.writes(), 2);
    assert_eq!(touched.created, 0);
    assert_eq!(pipeline.cache().load_count(), 2);
    assert_eq!(registry.len(), 2);
}

/// A fresh process with an empty cache still leaves current artifacts alone.
#[test]
fn test_second_process_writes_nothing() {
    let (dir, _source) = site();
    let (first, _) = pipeline(dir.path());
    first.run(&first.discover().unwrap());

    let (second, registry) = pipeline(dir.path());
    let report = second.run(&second.discover().unwrap());

    assert_eq!(report.writes(), 0);
    assert_eq!(report.skipped, 2);
    assert!(registry.is_empty());
}

/// Editing the model content regenerates the index with the new data.
#[test]
fn test_edited_model_is_reprojected() {
    let (dir, source) = site();
    let (pipeline, _) = pipeline(dir.path());
    pipeline.run(&pipeline.discover().unwrap());

    let edited = TWO_APPS.replace("Web Shop", "Storefront");
    std::fs::write(&source, edited).unwrap();
    set_mtime(&source, SystemTime::now() + Duration::from_secs(3600));
    pipeline.run(&pipeline.discover().unwrap());

    let index = std::fs::read_to_string(dir.path().join("arch/index.json")).unwrap();
    assert!(index.contains("Storefront"));
    assert!(!index.contains("Web Shop"));
}

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_trellis"))
        .arg("version")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Trellis v"));
}

#[test]
fn test_cli_generate_and_matrix() {
    let (dir, _source) = site();
    let root = dir.path().to_str().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_trellis"))
        .args(["--root", root, "generate", "--json"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["written"].as_array().unwrap().len(), 2);

    std::fs::write(
        dir.path().join("arch/landscape.model.json"),
        TWO_APPS.replace(
            r#""relationships": [
        {"id": "serves""#,
            r#""relationships": [
        {"id": "p1", "type": "CompositionRelationship", "source": "today", "target": "web"},
        {"id": "p2", "type": "CompositionRelationship", "source": "today", "target": "erp"},
        {"id": "serves""#,
        )
        .replace(
            r#""elements": [
        {"id": "web""#,
            r#""elements": [
        {"id": "today", "name": "Today", "type": "Plateau"},
        {"id": "web""#,
        ),
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_trellis"))
        .args(["--root", root, "matrix", "--plateau", "Today"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let matrix: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(matrix["callers"][0]["name"], "ERP");
    assert_eq!(matrix["callees"][0]["name"], "Web Shop");
    assert_eq!(matrix["cells"][0]["derived"], false);
}
