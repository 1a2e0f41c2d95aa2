//! Shared utilities for CLI commands

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::ingest::{load_repository_file, UploadParsers};
use crate::core::repository::Repository;
use crate::core::workbook::WorkbookRowParser;

/// Load configuration honouring `--config`
pub fn load_config(global: &GlobalOpts) -> Result<Config> {
    Ok(Config::load(global.config.as_deref())?)
}

/// Resolve the repository path from `--repo` or the config file
pub fn repository_path(explicit: Option<&Path>, config: &Config) -> Result<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| config.repository.clone())
        .ok_or_else(|| {
            miette::miette!(
                help = "pass --repo <FILE> or set `repository:` in podrecon.yaml",
                "no repository data file given"
            )
        })
}

/// Load and index the repository
pub fn load_repository(explicit: Option<&Path>, config: &Config) -> Result<Repository> {
    let path = repository_path(explicit, config)?;
    let rows = load_repository_file(&path)?;
    let repository = Repository::from_raw_rows(&rows, config.limits.max_description_length);

    if repository.is_empty() {
        eprintln!(
            "{} repository {} contains no titles",
            style("!").yellow(),
            style(path.display()).cyan()
        );
    }
    Ok(repository)
}

/// CSV plus `.xlsx`/`.xls` workbooks
pub fn upload_parsers() -> UploadParsers {
    UploadParsers::new().with_spreadsheet(Box::new(WorkbookRowParser))
}

/// Write bytes to a file, or to stdout when no path is given
pub fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).into_diagnostic()?;
            }
            fs::write(path, bytes).into_diagnostic()?;
            eprintln!("{} Wrote {}", style("✓").green(), style(path.display()).cyan());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes).into_diagnostic()?;
            stdout.flush().into_diagnostic()?;
        }
    }
    Ok(())
}

/// Resolve `--out`: a directory gets the generated file name appended
pub fn output_target(out: Option<&Path>, default_name: &str) -> Option<PathBuf> {
    out.map(|path| {
        if path.is_dir() {
            path.join(default_name)
        } else {
            path.to_path_buf()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_repository_path_precedence() {
        let mut config = Config::default();
        assert!(repository_path(None, &config).is_err());

        config.repository = Some(PathBuf::from("from-config.json"));
        assert_eq!(
            repository_path(None, &config).unwrap(),
            PathBuf::from("from-config.json")
        );
        assert_eq!(
            repository_path(Some(Path::new("explicit.json")), &config).unwrap(),
            PathBuf::from("explicit.json")
        );
    }

    #[test]
    fn test_output_target() {
        let dir = tempdir().unwrap();
        assert_eq!(
            output_target(Some(dir.path()), "pod_order.csv"),
            Some(dir.path().join("pod_order.csv"))
        );
        let file = dir.path().join("named.csv");
        assert_eq!(output_target(Some(&file), "x.csv"), Some(file));
        assert_eq!(output_target(None, "x.csv"), None);
    }
}
