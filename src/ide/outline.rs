//! Outline (code explorer) items.
//!
//! The outline mirrors the scope forest of a parse: routines, triggers and
//! `&ANALYZE-SUSPEND` sections nest what they contain, and the declarations
//! worth navigating to (temp-tables, buffers, RUN targets, includes) are
//! leaves under the scope they were found in.

use smol_str::SmolStr;

use crate::parser::keywords::DefineType;
use crate::parser::{ItemId, ItemKind, ParseResult, ParsedItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutlineKind {
    Section,
    Procedure,
    /// Forward declaration with no body in the file
    Prototype,
    Function,
    Method,
    Trigger,
    TempTable,
    Buffer,
    Dataset,
    Run,
    Include,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineItem {
    pub name: SmolStr,
    pub kind: OutlineKind,
    pub item: ItemId,
    /// Root-file line of the declaration
    pub line: u32,
    pub end_line: Option<u32>,
    /// Declared in an included file
    pub from_include: bool,
    pub children: Vec<OutlineItem>,
}

impl OutlineItem {
    /// This item and all its descendants, depth first.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &OutlineItem> + '_> {
        Box::new(std::iter::once(self).chain(self.children.iter().flat_map(OutlineItem::walk)))
    }
}

fn outline_kind(item: &ParsedItem) -> Option<OutlineKind> {
    let kind = match &item.kind {
        ItemKind::PreprocBlock(_) => OutlineKind::Section,
        ItemKind::Procedure(_) => OutlineKind::Procedure,
        ItemKind::Prototype(p) if p.implementation.is_none() => OutlineKind::Prototype,
        ItemKind::Implementation(_) => OutlineKind::Function,
        ItemKind::Method(_) => OutlineKind::Method,
        ItemKind::OnStatement(_) => OutlineKind::Trigger,
        ItemKind::Buffer(_) => OutlineKind::Buffer,
        ItemKind::Run(run) if !run.dynamic => OutlineKind::Run,
        ItemKind::IncludeFile(_) => OutlineKind::Include,
        ItemKind::Define(define) => match define.define_type {
            DefineType::TempTable | DefineType::WorkTable => OutlineKind::TempTable,
            DefineType::Dataset => OutlineKind::Dataset,
            _ => return None,
        },
        _ => return None,
    };
    Some(kind)
}

fn display_name(item: &ParsedItem) -> SmolStr {
    match &item.kind {
        ItemKind::OnStatement(on) if !on.widgets.is_empty() => SmolStr::from(format!("{} OF {}", on.events, on.widgets)),
        ItemKind::OnStatement(on) => on.events.clone(),
        _ => item.name.clone(),
    }
}

fn build(result: &ParseResult, id: ItemId) -> Vec<OutlineItem> {
    result
        .children(id)
        .filter_map(|child| {
            let kind = outline_kind(child)?;
            let children = if child.is_scope() { build(result, child.id) } else { Vec::new() };
            Some(OutlineItem {
                name: display_name(child),
                kind,
                item: child.id,
                line: child.root_line,
                end_line: child.end_line,
                from_include: child.owner() != 0,
                children,
            })
        })
        .collect()
}

/// Outline forest of a parse, in source order.
pub fn outline(result: &ParseResult) -> Vec<OutlineItem> {
    match result.root() {
        Some(root) => build(result, root.id),
        None => Vec::new(),
    }
}
