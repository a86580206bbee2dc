//! Data validation utilities.
//!
//! A data directory holds the building catalog (`buildings.ron`) and
//! optionally an economy config (`economy.ron`). Every problem is collected
//! rather than stopping at the first, so one run shows everything to fix.

use std::path::{Path, PathBuf};

use serde::Serialize;
use starhold_core::catalog::Catalog;
use starhold_core::config::EconomyConfig;
use starhold_core::error::GameError;

use crate::error::{Result, ToolError};

/// File name of the building catalog.
pub const CATALOG_FILE: &str = "buildings.ron";
/// File name of the economy config.
pub const ECONOMY_FILE: &str = "economy.ron";

/// What a data file describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// Building catalog.
    Catalog,
    /// Economy config.
    Economy,
}

impl DataKind {
    /// Kind of a data file, judged by its name.
    #[must_use]
    pub fn of(path: &Path) -> Option<Self> {
        match path.file_name()?.to_str()? {
            CATALOG_FILE => Some(Self::Catalog),
            ECONOMY_FILE => Some(Self::Economy),
            _ => None,
        }
    }
}

/// Validation outcome of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// File checked.
    pub path: PathBuf,
    /// What the file describes.
    pub kind: DataKind,
    /// Problems found (empty if valid).
    pub errors: Vec<String>,
}

impl FileReport {
    /// Check if the file passed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validation outcome of a data directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// One entry per recognized file, in name order.
    pub files: Vec<FileReport>,
    /// Problems not tied to a single file.
    pub errors: Vec<String>,
    /// `.ron` files that were not recognized.
    pub skipped: Vec<PathBuf>,
}

impl ValidationReport {
    /// Check if every file passed and nothing required is missing.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.files.iter().all(FileReport::is_ok)
    }

    /// Total number of problems.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len() + self.files.iter().map(|f| f.errors.len()).sum::<usize>()
    }
}

/// Validate all RON data files in a directory.
///
/// # Errors
///
/// Returns an error if `path` is not a readable directory. Problems inside
/// the files are reported in the [`ValidationReport`], not as errors.
pub fn validate_data_directory(path: &Path) -> Result<ValidationReport> {
    if !path.is_dir() {
        return Err(ToolError::NotADirectory(path.to_path_buf()));
    }

    let entries = std::fs::read_dir(path).map_err(|e| GameError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| GameError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let file = entry.path();
        if file.extension().is_some_and(|ext| ext == "ron") {
            files.push(file);
        }
    }
    files.sort();

    let mut report = ValidationReport::default();
    for file in files {
        match DataKind::of(&file) {
            Some(DataKind::Catalog) => report.files.push(validate_catalog_file(&file)),
            Some(DataKind::Economy) => report.files.push(validate_economy_file(&file)),
            None => {
                tracing::warn!(file = %file.display(), "Skipping unrecognized data file");
                report.skipped.push(file);
            }
        }
    }

    if !report.files.iter().any(|f| f.kind == DataKind::Catalog) {
        report.errors.push(format!("{CATALOG_FILE} is missing"));
    }

    tracing::info!(
        dir = %path.display(),
        files = report.files.len(),
        errors = report.error_count(),
        "Validated data directory"
    );
    Ok(report)
}

/// Validate a building catalog file, including completeness.
#[must_use]
pub fn validate_catalog_file(path: &Path) -> FileReport {
    let errors = match Catalog::load(path).and_then(|c| c.validate_completeness()) {
        Ok(()) => Vec::new(),
        Err(e) => error_messages(e),
    };
    FileReport {
        path: path.to_path_buf(),
        kind: DataKind::Catalog,
        errors,
    }
}

/// Validate an economy config file.
#[must_use]
pub fn validate_economy_file(path: &Path) -> FileReport {
    let errors = match EconomyConfig::load(path) {
        Ok(_) => Vec::new(),
        Err(e) => error_messages(e),
    };
    FileReport {
        path: path.to_path_buf(),
        kind: DataKind::Economy,
        errors,
    }
}

fn error_messages(error: GameError) -> Vec<String> {
    match error {
        GameError::InvalidData { errors, .. } => errors,
        other => vec![other.to_string()],
    }
}
