//! Shared test helpers for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo;
use assert_cmd::Command;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

/// SHA-256 of "secret"
pub const SECRET_SHA256: &str = "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b";

/// Helper to get a podrecon command
pub fn podrecon() -> Command {
    Command::new(cargo::cargo_bin!("podrecon"))
}

/// Five records: one duplicated ISBN, two MPI titles, one without an ISBN
pub const REPOSITORY_JSON: &str = r#"[
  {"ISBN": "9780140175936", "Title": "Cleopatra's Sister", "Master Order ID": "SA1657", "Status": "POD Ready", "Paper Desc": "Munken 80"},
  {"ISBN": 9780000000002, "Title": "Second Title", "Status": "MPI", "Paper Desc": "Bulky 70"},
  {"isbn": "978-1-11-111111-1", "title": "Third Title", "Paper Description": "Bulky 70"},
  {"ISBN": "9780140175936", "Title": "Cleopatra's Sister", "Master Order ID": "SA1657", "Status": "POD Ready", "Paper Desc": "Munken 80"},
  {"Title": "Loose Leaf", "Master Order ID": "LL0001", "Status": "MPI"}
]"#;

/// Matches lines 001, 002 and 004; line 003 is unknown; the last row folds into 001
pub const ORDER_CSV: &str = "ISBN,Qty,Master\n\
9780140175936,2,\n\
9780000000002,1,\n\
9789999999999,4,\n\
,3,LL0001\n\
978-0-14-017593-6,1,\n";

/// [`ORDER_CSV`] as an `.xlsx` workbook, ISBNs stored as numbers
pub fn write_order_workbook(tmp: &TempDir, name: &str) -> PathBuf {
    let path = tmp.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in ["ISBN", "Qty", "Master"].into_iter().enumerate() {
        sheet.write_string(0, col as u16, header).unwrap();
    }
    sheet.write_number(1, 0, 9780140175936.0).unwrap();
    sheet.write_number(1, 1, 2).unwrap();
    sheet.write_number(2, 0, 9780000000002.0).unwrap();
    sheet.write_number(2, 1, 1).unwrap();
    sheet.write_number(3, 0, 9789999999999.0).unwrap();
    sheet.write_number(3, 1, 4).unwrap();
    sheet.write_number(4, 1, 3).unwrap();
    sheet.write_string(4, 2, "LL0001").unwrap();
    sheet.write_string(5, 0, "978-0-14-017593-6").unwrap();
    sheet.write_number(5, 1, 1).unwrap();
    workbook.save(&path).unwrap();
    path
}

/// A temp project with `repository.json` and a `podrecon.yaml` pointing at it
pub fn setup_project() -> TempDir {
    setup_project_with_config("")
}

/// Same as [`setup_project`] with extra YAML appended to the config
pub fn setup_project_with_config(extra_yaml: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("repository.json"), REPOSITORY_JSON).unwrap();
    fs::write(
        tmp.path().join("podrecon.yaml"),
        format!("repository: repository.json\n{}", extra_yaml),
    )
    .unwrap();
    tmp
}

/// Write a file into the project and return its path
pub fn write_file(tmp: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = tmp.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// podrecon running inside the project directory
pub fn podrecon_in(tmp: &TempDir) -> Command {
    let mut cmd = podrecon();
    cmd.current_dir(tmp.path());
    cmd
}
