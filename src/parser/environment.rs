//! Shared state a parse reads: directory, include cache, resolver, options.

use std::sync::Arc;

use super::options::ParserOptions;
use crate::project::{IncludeCache, IncludeResolver, NullResolver, SchemaDirectory};

/// Everything a parse needs besides the text. Cheap to clone; the
/// directory and the include cache are shared between clones.
#[derive(Clone)]
pub struct ParseEnvironment {
    pub directory: Arc<SchemaDirectory>,
    pub includes: Arc<IncludeCache>,
    pub resolver: Arc<dyn IncludeResolver>,
    pub options: ParserOptions,
}

impl ParseEnvironment {
    pub fn new(resolver: Arc<dyn IncludeResolver>) -> Self {
        Self {
            directory: Arc::new(SchemaDirectory::with_default_keywords()),
            includes: Arc::new(IncludeCache::new()),
            resolver,
            options: ParserOptions::default(),
        }
    }

    pub fn with_directory(mut self, directory: Arc<SchemaDirectory>) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_includes(mut self, includes: Arc<IncludeCache>) -> Self {
        self.includes = includes;
        self
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }
}

/// No include resolution, default keywords, default options.
impl Default for ParseEnvironment {
    fn default() -> Self {
        Self::new(Arc::new(NullResolver))
    }
}

impl std::fmt::Debug for ParseEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseEnvironment")
            .field("includes", &self.includes.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
