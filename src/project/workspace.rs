//! Batch parsing of a source tree.
//!
//! ```ignore
//! let env = ParseEnvironment::new(Arc::new(PropathResolver::new(["src"])));
//! let batch = parse_directory("src", &env)?;
//! for result in &batch.results { ... }
//! ```

use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use walkdir::WalkDir;

use crate::base::constants::is_abl_extension;
use crate::parser::{parse_file, ParseEnvironment, ParseResult};

/// Failure reading sources from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl LoadError {
    /// The file or directory the error is about, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Walk(err) => err.path(),
        }
    }
}

/// Results of parsing every source file under a directory.
#[derive(Debug, Default)]
pub struct BatchParse {
    /// Sorted by path
    pub results: Vec<ParseResult>,
    pub failures: Vec<LoadError>,
}

impl BatchParse {
    pub fn error_count(&self) -> usize {
        self.results.iter().map(|r| r.errors.len()).sum()
    }
}

/// ABL source files under `dir`, sorted.
pub fn collect_source_paths(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, LoadError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
        let entry = entry?;
        let is_source = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(is_abl_extension);
        if entry.file_type().is_file() && is_source {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Parse every source file under `dir` in parallel with one shared
/// environment. A file that cannot be read is reported in `failures`; the
/// others are still parsed.
pub fn parse_directory(dir: impl AsRef<Path>, env: &ParseEnvironment) -> Result<BatchParse, LoadError> {
    let dir = dir.as_ref();
    let paths = collect_source_paths(dir)?;
    tracing::debug!(dir = %dir.display(), files = paths.len(), "parsing directory");

    let outcomes: Vec<Result<ParseResult, LoadError>> = paths.par_iter().map(|path| parse_file(path, env)).collect();

    let mut batch = BatchParse::default();
    for outcome in outcomes {
        match outcome {
            Ok(result) => batch.results.push(result),
            Err(err) => {
                tracing::debug!(%err, "source skipped");
                batch.failures.push(err);
            }
        }
    }
    Ok(batch)
}
