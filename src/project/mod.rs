//! Everything the parser consumes from outside a source file: the schema
//! directory, include resolution and caching, and batch loading from disk.

mod directory;
mod include_cache;
mod resolver;
mod schema;
mod workspace;

pub use directory::{DirectoryIndex, SchemaDirectory, SymbolKind};
pub use include_cache::IncludeCache;
pub use resolver::{IncludeResolver, NullResolver, PropathResolver};
pub use schema::{Database, Field, Index, PrimitiveType, Schema, SchemaError, Sequence, Table, TableKind, Trigger};
pub use workspace::{collect_source_paths, parse_directory, BatchParse, LoadError};
