//! Cache of lexed include files, shared across parses.
//!
//! Included files are usually much more stable than the file being edited,
//! so their token sequences are kept by resolved path. A path is evicted when
//! it is parsed as a root file, since that means its text may have changed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::parser::Token;

#[derive(Debug, Default)]
pub struct IncludeCache {
    entries: RwLock<FxHashMap<PathBuf, Arc<[Token]>>>,
}

impl IncludeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<[Token]>> {
        self.entries.read().get(path).cloned()
    }

    /// Store the tokens of `path`, returning the shared copy. If another
    /// parse cached the same path first, its tokens are kept and returned.
    pub fn insert(&self, path: PathBuf, tokens: Vec<Token>) -> Arc<[Token]> {
        let mut entries = self.entries.write();
        Arc::clone(entries.entry(path).or_insert_with(|| tokens.into()))
    }

    pub fn invalidate(&self, path: &Path) {
        if self.entries.write().remove(path).is_some() {
            trace!(path = %path.display(), "include cache entry invalidated");
        }
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
