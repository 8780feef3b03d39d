//! Batch parsing from disk.

use std::fs;
use std::sync::Arc;

use abl::parser::{parse_file, ParseEnvironment};
use abl::project::{collect_source_paths, parse_directory, IncludeCache, LoadError, PropathResolver};
use tempfile::TempDir;

use crate::helpers::source_fixtures::{CLASS_FILE, PROCEDURE_FILE};

fn source_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src/sales")).unwrap();
    fs::create_dir_all(dir.path().join("inc")).unwrap();
    fs::write(dir.path().join("inc/common.i"), "DEFINE VARIABLE gcUser AS CHARACTER NO-UNDO.\n").unwrap();
    fs::write(dir.path().join("src/orders.p"), format!("{{common.i}}\n{PROCEDURE_FILE}")).unwrap();
    fs::write(dir.path().join("src/sales/Order.cls"), CLASS_FILE).unwrap();
    fs::write(dir.path().join("src/broken.w"), "{common.i}\nPROCEDURE open:\n").unwrap();
    fs::write(dir.path().join("src/readme.md"), "not abl").unwrap();
    dir
}

#[test]
fn test_parse_directory_with_shared_includes() {
    let dir = source_tree();
    let cache = Arc::new(IncludeCache::new());
    let env = ParseEnvironment::new(Arc::new(PropathResolver::new([dir.path().join("inc")])))
        .with_includes(cache.clone());

    let batch = parse_directory(dir.path().join("src"), &env).unwrap();
    assert!(batch.failures.is_empty());

    let names: Vec<String> = batch
        .results
        .iter()
        .map(|r| r.path.as_ref().unwrap().file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["broken.w", "orders.p", "Order.cls"]);

    assert_eq!(batch.error_count(), 1);
    assert_eq!(cache.len(), 1);
    for result in batch.results.iter().filter(|r| r.includes.len() > 1) {
        assert_eq!(result.items_of("define").next().unwrap().name, "gcUser");
    }
}

#[test]
fn test_collect_source_paths_filters_extensions() {
    let dir = source_tree();
    let paths = collect_source_paths(dir.path()).unwrap();
    assert_eq!(paths.len(), 4);
    assert!(paths.iter().all(|p| p.extension().is_some_and(|e| e != "md")));
}

#[test]
fn test_parse_file_missing_is_io_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("gone.p");
    let err = parse_file(&missing, &ParseEnvironment::default()).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert_eq!(err.path(), Some(missing.as_path()));
    assert!(err.to_string().contains("gone.p"));
}
