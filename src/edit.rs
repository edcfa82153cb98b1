use crate::config::EditSpec;
use crate::gn::GnError;
use crate::script::{rewrite_script_with_report, RewriteReport};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const BOM: &str = "\u{feff}";

#[derive(Error, Debug)]
pub enum EditError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rewrite {path}: {source}")]
    Rewrite {
        path: PathBuf,
        #[source]
        source: GnError,
    },

    #[error("{path} changed on disk after it was read")]
    ModifiedSinceRead { path: PathBuf },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditError {
    /// The underlying lex or parse failure, if that is what went wrong.
    pub fn gn_error(&self) -> Option<&GnError> {
        match self {
            EditError::Rewrite { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result of rewriting a file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "RewriteOutcome should be checked for changes"]
pub enum RewriteOutcome {
    /// The file was written with new content
    Rewritten {
        file: PathBuf,
        bytes_before: usize,
        bytes_after: usize,
        report: RewriteReport,
    },
    /// The rewrite produced identical text; nothing was written
    Unchanged { file: PathBuf, report: RewriteReport },
}

impl RewriteOutcome {
    pub fn file(&self) -> &Path {
        match self {
            RewriteOutcome::Rewritten { file, .. } | RewriteOutcome::Unchanged { file, .. } => file,
        }
    }

    pub fn report(&self) -> &RewriteReport {
        match self {
            RewriteOutcome::Rewritten { report, .. } | RewriteOutcome::Unchanged { report, .. } => {
                report
            }
        }
    }
}

/// A computed rewrite of one file that has not been written yet.
#[derive(Debug, Clone)]
#[must_use = "RewritePlan does nothing until apply() is called"]
pub struct RewritePlan {
    pub file: PathBuf,
    pub original: String,
    pub rewritten: String,
    pub report: RewriteReport,
}

impl RewritePlan {
    pub fn is_noop(&self) -> bool {
        self.original == self.rewritten
    }

    /// Write the rewritten text back atomically.
    ///
    /// The file is re-read first and must still match the text the plan was
    /// computed from.
    pub fn apply(self) -> Result<RewriteOutcome, EditError> {
        if self.is_noop() {
            return Ok(RewriteOutcome::Unchanged {
                file: self.file,
                report: self.report,
            });
        }

        let current = read_script(&self.file)?;
        if current != self.original {
            return Err(EditError::ModifiedSinceRead { path: self.file });
        }

        atomic_write(&self.file, self.rewritten.as_bytes())?;

        // Bump mtime so build tools notice the change
        let now = filetime::FileTime::now();
        filetime::set_file_mtime(&self.file, now)?;

        debug!(
            file = %self.file.display(),
            before = self.original.len(),
            after = self.rewritten.len(),
            "rewrote build script"
        );

        Ok(RewriteOutcome::Rewritten {
            file: self.file,
            bytes_before: self.original.len(),
            bytes_after: self.rewritten.len(),
            report: self.report,
        })
    }
}

/// Compute the rewrite of `path` without touching the file.
pub fn plan_file(path: impl AsRef<Path>, spec: &EditSpec) -> Result<RewritePlan, EditError> {
    let path = path.as_ref();
    let original = read_script(path)?;

    // A UTF-8 byte order mark is not GN source; keep it out of the lexer and
    // put it back in front of the output.
    let (bom, body) = match original.strip_prefix(BOM) {
        Some(body) => (BOM, body),
        None => ("", original.as_str()),
    };
    let (body, report) =
        rewrite_script_with_report(body, spec).map_err(|source| EditError::Rewrite {
            path: path.to_path_buf(),
            source,
        })?;
    let rewritten = format!("{bom}{body}");

    Ok(RewritePlan {
        file: path.to_path_buf(),
        original,
        rewritten,
        report,
    })
}

/// Rewrite the build script at `path` in place.
pub fn rewrite_file(path: impl AsRef<Path>, spec: &EditSpec) -> Result<RewriteOutcome, EditError> {
    plan_file(path, spec)?.apply()
}

fn read_script(path: &Path) -> Result<String, EditError> {
    fs::read_to_string(path).map_err(|source| EditError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the file is left as it was.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    // Same directory keeps the rename on one filesystem
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
