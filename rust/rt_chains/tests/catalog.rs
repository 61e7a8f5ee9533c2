use std::error::Error;

use rt_chains::*;
use tempfile::TempDir;

mod common;

/// The shipped catalog loads in document order.
#[test]
fn test_catalog_load_fixture() {
    common::setup_test();
    let catalog = Benchmarks::load(&common::fixture("workloads/benchmarks.json")).unwrap();

    assert_eq!(catalog.len(), 4);
    let names: Vec<&str> = catalog.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["matmul", "fft", "crc32", "sort"]);
    assert_eq!(catalog.get(BenchmarkIdx(3)).unwrap().execution_time_us, 780);
}

/// A single-entry document yields one benchmark.
#[test]
fn test_catalog_load_single() {
    common::setup_test();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("catalog.json");
    std::fs::write(&path, r#"[{"Name":"matmul","Execution_time_us":1500}]"#).unwrap();

    let catalog = Benchmarks::load(&path).unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(
        catalog.as_slice(),
        &[Benchmark {
            name: "matmul".to_string(),
            execution_time_us: 1500,
        }]
    );
}

/// An empty array is a valid, empty catalog.
#[test]
fn test_catalog_load_empty() {
    common::setup_test();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("empty.json");
    std::fs::write(&path, "[]").unwrap();

    let catalog = Benchmarks::load(&path).unwrap();
    assert!(catalog.is_empty());
    assert!(catalog.work("matmul", 1).is_none());
}

/// A missing file is a read error naming the path.
#[test]
fn test_catalog_missing_path() {
    common::setup_test();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("does-not-exist.json");

    let err = Benchmarks::load(&path).unwrap_err();
    match &err {
        CatalogError::Read { path: p, source } => {
            assert_eq!(p, &path);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected read error, got {other}"),
    }
    assert!(err.to_string().contains(&path.display().to_string()));
    assert!(err.source().is_some());
}

/// A truncated document is a decode error, not a partial catalog.
#[test]
fn test_catalog_truncated_document() {
    common::setup_test();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("truncated.json");
    std::fs::write(
        &path,
        r#"[{"Name":"matmul","Execution_time_us":1500},{"Name":"ff"#,
    )
    .unwrap();

    let err = Benchmarks::load(&path).unwrap_err();
    match &err {
        CatalogError::Decode { path: p, source } => {
            assert_eq!(p, &path);
            assert!(source.is_eof());
        }
        other => panic!("expected decode error, got {other}"),
    }
    assert!(err.to_string().contains("truncated.json"));
}

/// Objects missing a field do not match the schema.
#[test]
fn test_catalog_schema_mismatch() {
    common::setup_test();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bad.json");
    std::fs::write(&path, r#"[{"Name":"matmul"}]"#).unwrap();

    assert!(matches!(
        Benchmarks::load(&path),
        Err(CatalogError::Decode { .. })
    ));
}

/// Work assignments resolve against the catalog they came from.
#[test]
fn test_catalog_work_assignment() {
    common::setup_test();
    let catalog = Benchmarks::load(&common::fixture("workloads/benchmarks.json")).unwrap();

    let work = catalog.work("crc32", 100).unwrap();
    assert_eq!(work.benchmark, BenchmarkIdx(2));
    assert_eq!(work.iterations, 100);
    assert_eq!(catalog.resolve(&work).unwrap().name, "crc32");
    assert_eq!(catalog.work_cost_us(&work), Some(3_500));

    let idle = catalog.work("fft", 0).unwrap();
    assert_eq!(catalog.work_cost_us(&idle), Some(0));
}
