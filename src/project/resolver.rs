//! Include file resolution.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Maps the file name written in `{file.i}` to a file on disk.
pub trait IncludeResolver: Send + Sync {
    /// `including` is the file containing the directive, when known.
    fn resolve_include(&self, partial: &str, including: Option<&Path>) -> Option<PathBuf>;

    /// Read a resolved file. Invalid UTF-8 is replaced rather than rejected,
    /// ABL sources are often in a legacy code page.
    fn load(&self, path: &Path) -> io::Result<String> {
        let bytes = fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Resolves nothing; includes are left unexpanded.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl IncludeResolver for NullResolver {
    fn resolve_include(&self, _partial: &str, _including: Option<&Path>) -> Option<PathBuf> {
        None
    }
}

/// Searches an ordered list of directories (the PROPATH), then the
/// directory of the including file.
#[derive(Debug, Default, Clone)]
pub struct PropathResolver {
    propath: Vec<PathBuf>,
}

impl PropathResolver {
    pub fn new<I, P>(propath: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            propath: propath.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.propath.push(dir.into());
        self
    }

    pub fn propath(&self) -> &[PathBuf] {
        &self.propath
    }
}

impl IncludeResolver for PropathResolver {
    fn resolve_include(&self, partial: &str, including: Option<&Path>) -> Option<PathBuf> {
        let partial = partial.trim().replace('\\', "/");
        if partial.is_empty() {
            return None;
        }
        let relative = Path::new(&partial);
        if relative.is_absolute() {
            return relative.is_file().then(|| relative.to_path_buf());
        }

        let sibling_dir = including.and_then(Path::parent);
        self.propath
            .iter()
            .map(PathBuf::as_path)
            .chain(sibling_dir)
            .map(|dir| dir.join(relative))
            .find(|candidate| candidate.is_file())
    }
}
