//! Document links: include directives and RUN targets that resolve to a
//! file on the PROPATH.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::parser::{ItemKind, ParseResult, ParsedItem, Token};
use crate::project::IncludeResolver;

/// A clickable span in the root file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub target: PathBuf,
    /// Tooltip text for the link.
    pub tooltip: Cow<'static, str>,
}

impl DocumentLink {
    fn spanning(token: &Token, target: PathBuf, tooltip: Cow<'static, str>) -> Self {
        let span = token.span();
        Self {
            start_line: span.start.line,
            start_col: span.start.column,
            end_line: span.end.line,
            end_col: span.end.column,
            target,
            tooltip,
        }
    }
}

fn run_link(
    item: &ParsedItem,
    target: &str,
    resolver: &dyn IncludeResolver,
    including: Option<&Path>,
) -> Option<DocumentLink> {
    let path = resolver.resolve_include(target, including)?;
    Some(DocumentLink::spanning(&item.token, path, Cow::Borrowed("Open procedure")))
}

/// Links for the root file of `result`. Items that came from included files
/// are skipped: their spans belong to another document.
pub fn document_links(result: &ParseResult, resolver: &dyn IncludeResolver) -> Vec<DocumentLink> {
    let including = result.path.as_deref();
    result
        .items
        .iter()
        .filter(|item| item.owner() == 0)
        .filter_map(|item| match &item.kind {
            ItemKind::IncludeFile(include) => include
                .path
                .clone()
                .map(|path| DocumentLink::spanning(&item.token, path, Cow::Borrowed("Open include file"))),
            ItemKind::Run(run) if !run.dynamic && run.in_handle.is_none() && run.target.contains('.') => {
                run_link(item, &run.target, resolver, including)
            }
            _ => None,
        })
        .collect()
}
