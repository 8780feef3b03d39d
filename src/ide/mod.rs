//! IDE features: what an editor shows from a parse.
//!
//! Everything here consumes a [`ParseResult`](crate::parser::ParseResult)
//! and never re-parses. The [`ParseScheduler`] decides when to parse and
//! hands the outputs of this module to its listeners.
//!
//! ## Usage
//!
//! ```
//! use abl::ide::{outline, parsed_completion_items};
//! use abl::parser::{parse, ParseEnvironment};
//!
//! let result = parse("PROCEDURE main:\nEND PROCEDURE.\n", None, &ParseEnvironment::default());
//! assert_eq!(outline(&result)[0].name, "main");
//! assert_eq!(parsed_completion_items(&result)[0].label.as_ref(), "main");
//! ```

mod completion;
pub mod debug;
mod document_links;
mod outline;
mod scheduler;

pub use completion::{
    completions, field_completion_items, parsed_completion_items, schema_completion_items, CompletionCollector,
    CompletionItem, CompletionKind,
};
pub use document_links::{document_links, DocumentLink};
pub use outline::{outline, OutlineItem, OutlineKind};
pub use scheduler::{
    fingerprint, ParseListener, ParseScheduler, ParsedSource, RequestOutcome, SchedulerConfig, SourceId,
    SourceProvider,
};
