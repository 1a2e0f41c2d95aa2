//! Repository stats, snapshot, edit and search tests

mod common;

use common::{podrecon_in, setup_project, setup_project_with_config, write_file, SECRET_SHA256};
use predicates::prelude::*;
use std::fs;

// ============================================================================
// repo stats
// ============================================================================

#[test]
fn test_stats_json() {
    let tmp = setup_project();

    let output = podrecon_in(&tmp)
        .args(["repo", "stats", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total"], 5);
    assert_eq!(stats["pod_ready"], 3);
    assert_eq!(stats["mpi"], 2);
    assert_eq!(stats["duplicates"], 1);
}

#[test]
fn test_stats_table() {
    let tmp = setup_project();

    podrecon_in(&tmp)
        .args(["repo", "stats", "--format", "table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total titles"))
        .stdout(predicate::str::contains("Duplicate ISBNs"));
}

#[test]
fn test_stats_with_explicit_repo() {
    let tmp = tempfile::TempDir::new().unwrap();
    write_file(&tmp, "other.json", r#"[{"ISBN": "9780140175936"}]"#);
    write_file(&tmp, "podrecon.yaml", "");

    podrecon_in(&tmp)
        .args(["repo", "stats", "--repo", "other.json", "--format", "csv"])
        .assert()
        .success()
        .stdout("total,pod_ready,mpi,duplicates\n1,1,0,0\n");
}

#[test]
fn test_malformed_repository_fails() {
    let tmp = setup_project();
    write_file(&tmp, "repository.json", "{not json");

    podrecon_in(&tmp)
        .args(["repo", "stats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse"));
}

// ============================================================================
// repo export
// ============================================================================

#[test]
fn test_export_csv_snapshot() {
    let tmp = setup_project();

    let output = podrecon_in(&tmp)
        .args(["repo", "export", "--as", "csv"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let csv = String::from_utf8(output.stdout).unwrap();
    let rows: Vec<&str> = csv.split("\r\n").filter(|r| !r.is_empty()).collect();
    assert_eq!(
        rows[0],
        "ISBN,Master Order ID,Title,Status,Paper Desc,Trim Height,Trim Width,Bind Style,Extent,Cover Spec Code 1,Cover Spine,Packing"
    );
    assert_eq!(rows.len(), 6);
    // Ordered by numeric ISBN, unidentified last
    assert!(rows[1].starts_with("9780000000002,"));
    assert!(rows[5].starts_with(",LL0001,Loose Leaf,MPI"));
}

#[test]
fn test_export_json_snapshot_to_directory() {
    let tmp = setup_project();
    fs::create_dir(tmp.path().join("snapshots")).unwrap();

    podrecon_in(&tmp)
        .args(["repo", "export", "--out", "snapshots"])
        .assert()
        .success();

    let entry = fs::read_dir(tmp.path().join("snapshots"))
        .unwrap()
        .next()
        .unwrap()
        .unwrap();
    let name = entry.file_name().to_string_lossy().into_owned();
    assert!(name.starts_with("repository_data_"));
    assert!(name.ends_with(".json"));

    let records: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(entry.path()).unwrap()).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 5);
    assert_eq!(records[0]["ISBN"], "9780000000002");
    assert_eq!(records[0]["Paper Desc"], "Bulky 70");
}

#[test]
fn test_snapshot_can_be_reloaded() {
    let tmp = setup_project();

    podrecon_in(&tmp)
        .args(["repo", "export", "--as", "csv", "--out", "snapshot.csv"])
        .assert()
        .success();

    let output = podrecon_in(&tmp)
        .args(["repo", "stats", "--repo", "snapshot.csv", "--format", "json"])
        .output()
        .unwrap();
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total"], 5);
    assert_eq!(stats["duplicates"], 1);
}

// ============================================================================
// repo edit
// ============================================================================

fn editor_config() -> String {
    format!("editor:\n  password_sha256: {}\n", SECRET_SHA256)
}

#[test]
fn test_edit_requires_configuration() {
    let tmp = setup_project();

    podrecon_in(&tmp)
        .args(["repo", "edit", "--remove", "SA1657", "--out", "new.json", "--password-stdin"])
        .write_stdin("secret\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not configured"));
}

#[test]
fn test_edit_wrong_password() {
    let tmp = setup_project_with_config(&editor_config());

    podrecon_in(&tmp)
        .args(["repo", "edit", "--remove", "SA1657", "--out", "new.json", "--password-stdin"])
        .write_stdin("guess\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not authorized"));

    assert!(!tmp.path().join("new.json").exists());
}

#[test]
fn test_edit_add_and_remove() {
    let tmp = setup_project_with_config(&editor_config());
    write_file(
        &tmp,
        "additions.json",
        r#"[
          {"ISBN": "9782222222222", "Title": "Added Title", "Status": "MPI"},
          {"ISBN": "9780000000002", "Title": "Second Title, Revised", "Status": "POD Ready"}
        ]"#,
    );

    podrecon_in(&tmp)
        .args([
            "repo",
            "edit",
            "--add",
            "additions.json",
            "--remove",
            "sa1657",
            "missing-id",
            "--out",
            "new.json",
            "--password-stdin",
        ])
        .write_stdin("secret\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("1 added, 1 replaced, 2 removed (4 titles now)"))
        .stderr(predicate::str::contains("'missing-id' not found"));

    let records: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tmp.path().join("new.json")).unwrap()).unwrap();
    let titles: Vec<&str> = records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Title"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        ["Second Title, Revised", "Third Title", "Added Title", "Loose Leaf"]
    );
}

// ============================================================================
// search
// ============================================================================

#[test]
fn test_search_by_isbn() {
    let tmp = setup_project();

    podrecon_in(&tmp)
        .args(["search", "978-0-14-017593-6", "--format", "table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found by ISBN"))
        .stdout(predicate::str::contains("Cleopatra's Sister"));
}

#[test]
fn test_search_by_master_order_id_json() {
    let tmp = setup_project();

    let output = podrecon_in(&tmp)
        .args(["search", "ll0001", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let hit: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(hit["method"], "alternate_id");
    assert_eq!(hit["record"]["title"], "Loose Leaf");
    assert_eq!(hit["record"]["status"], "MPI");
}

#[test]
fn test_search_no_match() {
    let tmp = setup_project();

    podrecon_in(&tmp)
        .args(["search", "nothing-here"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No match for 'nothing-here'"));
}
