//! Discovery of extra source files to add to a target.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions treated as C/C++ sources or headers.
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "h", "hh", "hpp"];

#[derive(Error, Debug)]
pub enum SourcesError {
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("{path} is not under {base}")]
    OutsideBase { path: PathBuf, base: PathBuf },
}

/// Collect source files under `dir`, as `/`-separated paths relative to `base`.
///
/// `base` is normally the directory holding the `BUILD.gn` being edited.
/// Results are sorted so repeated runs produce the same edit.
pub fn discover_sources(dir: &Path, base: &Path) -> Result<Vec<String>, SourcesError> {
    let mut found = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|source| SourcesError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() || !is_source(entry.path()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(base)
            .map_err(|_| SourcesError::OutsideBase {
                path: entry.path().to_path_buf(),
                base: base.to_path_buf(),
            })?;
        found.push(to_gn_path(relative));
    }

    found.sort();
    tracing::debug!(dir = %dir.display(), count = found.len(), "discovered sources");
    Ok(found)
}

fn is_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

fn to_gn_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
