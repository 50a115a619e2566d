//! Per-file processing pipeline
//!
//! One file moves through extract → classify → merge → persist. Files are
//! independent: the pipeline owns no shared mutable state, so a batch
//! driver may run files on parallel workers without coordination. The only
//! shared resource is the read-only stdlib oracle.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::classify::{ClassifiedModules, classify_all};
use crate::error::Error;
use crate::header::merge_metadata;
use crate::imports::extract_imports;
use crate::stdlib::StdlibOracle;

/// How processing a single file ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// File bytes changed and were written back.
    Written,
    /// Merge produced identical bytes; nothing written.
    Unchanged,
    /// Dry run: the file would change, but the write was skipped.
    Reported,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Written => "written",
            Outcome::Unchanged => "unchanged",
            Outcome::Reported => "reported",
        }
    }
}

/// Per-file result handed back to the driver.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub modules: ClassifiedModules,
    pub outcome: Outcome,
}

/// Knobs the driver passes down per invocation.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// requires-python specifier used when synthesizing a new block.
    pub requires_python: String,
    /// Analyze and merge, but never write.
    pub dry_run: bool,
}

/// Run the full pipeline on one file.
///
/// An `Err` means the file was skipped with nothing written; the caller
/// reports it and moves on to the next file.
pub fn process_file(
    path: &Path,
    options: &ProcessOptions,
    oracle: &dyn StdlibOracle,
) -> Result<FileReport, Error> {
    let source = fs::read_to_string(path)?;
    let records = extract_imports(&source)?;
    let modules = classify_all(&records, path.parent(), oracle);
    let merged = merge_metadata(&source, &modules.third_party, &options.requires_python);

    let outcome = if merged == source {
        Outcome::Unchanged
    } else if options.dry_run {
        Outcome::Reported
    } else {
        fs::write(path, merged)?;
        Outcome::Written
    };

    Ok(FileReport {
        path: path.to_path_buf(),
        modules,
        outcome,
    })
}
