//! Parsed items
//!
//! Items live in one arena (`Vec<ParsedItem>`) in emission order and are
//! addressed by [`ItemId`]. Each item records the scope item it was found in;
//! scope items (file, preprocessor blocks, procedures, function bodies,
//! methods, triggers) list their children, which gives the outline forest.

use std::path::PathBuf;

use smol_str::SmolStr;

use super::keywords::DefineType;
use super::token::Token;
use crate::project::PrimitiveType;

/// Index of an item in [`ParseResult::items`](super::ParseResult::items).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u32);

impl ItemId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedItem {
    pub id: ItemId,
    pub name: SmolStr,
    /// The token that defines the item
    pub token: Token,
    /// Line of `token` in the root file (the include directive line for
    /// items found in included files)
    pub root_line: u32,
    /// Scope item this item was found in; `None` only for the file item
    pub scope: Option<ItemId>,
    pub children: Vec<ItemId>,
    /// Root-file line where the item's block ends, for scope items and labels
    pub end_line: Option<u32>,
    pub kind: ItemKind,
}

impl ParsedItem {
    /// Owner index of the file that contains the item.
    pub fn owner(&self) -> u32 {
        self.token.owner
    }

    /// True for variants that own the items found in their block.
    pub fn is_scope(&self) -> bool {
        self.kind.is_scope()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    File(FileItem),
    PreprocBlock(PreprocBlockItem),
    Procedure(ProcedureItem),
    Prototype(PrototypeItem),
    Implementation(ImplementationItem),
    Method(MethodItem),
    Label(LabelItem),
    Run(RunItem),
    OnStatement(OnItem),
    FunctionCall(FunctionCallItem),
    TableUse(TableUseItem),
    Buffer(BufferItem),
    Define(DefineItem),
    PreprocVariable(PreprocVariableItem),
    PreprocVariableUse(PreprocVariableUseItem),
    IncludeFile(IncludeFileItem),
    Event,
    Word,
    Snippet,
}

impl ItemKind {
    pub fn is_scope(&self) -> bool {
        matches!(
            self,
            Self::File(_)
                | Self::PreprocBlock(_)
                | Self::Procedure(_)
                | Self::Implementation(_)
                | Self::Method(_)
                | Self::OnStatement(_)
        )
    }

    /// Short lowercase name of the variant, for dumps and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::PreprocBlock(_) => "preproc-block",
            Self::Procedure(_) => "procedure",
            Self::Prototype(_) => "prototype",
            Self::Implementation(_) => "implementation",
            Self::Method(_) => "method",
            Self::Label(_) => "label",
            Self::Run(_) => "run",
            Self::OnStatement(_) => "on",
            Self::FunctionCall(_) => "function-call",
            Self::TableUse(_) => "table-use",
            Self::Buffer(_) => "buffer",
            Self::Define(_) => "define",
            Self::PreprocVariable(_) => "preproc-variable",
            Self::PreprocVariableUse(_) => "preproc-variable-use",
            Self::IncludeFile(_) => "include",
            Self::Event => "event",
            Self::Word => "word",
            Self::Snippet => "snippet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    pub path: Option<PathBuf>,
}

/// `&ANALYZE-SUSPEND` ... `&ANALYZE-RESUME` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocBlockItem {
    /// First word after the directive (`_UIB-CODE-BLOCK`, `_DEFINITIONS`...)
    pub block_type: SmolStr,
    /// Rest of the directive line
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcedureItem {
    pub external: Option<SmolStr>,
    pub private: bool,
    pub in_super: bool,
}

/// Function declared with FORWARD, IN handle, or without a body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrototypeItem {
    pub return_type: SmolStr,
    pub parameters: String,
    pub forward: bool,
    pub in_handle: Option<SmolStr>,
    pub implementation: Option<ItemId>,
}

/// Function with a body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImplementationItem {
    pub return_type: SmolStr,
    pub parameters: String,
    pub private: bool,
    pub prototype: Option<ItemId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MethodKind {
    Method,
    Constructor,
    Destructor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodItem {
    pub method_kind: MethodKind,
    pub return_type: SmolStr,
    pub modifiers: Vec<SmolStr>,
    pub parameters: String,
    /// Interface or abstract declaration without a body
    pub declaration_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelItem {
    /// First word of the block the label names
    pub block_keyword: Option<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunItem {
    pub target: SmolStr,
    /// `RUN VALUE(expression)`
    pub dynamic: bool,
    pub persistent: bool,
    pub in_handle: Option<SmolStr>,
    pub has_parameters: bool,
}

/// `ON event OF widget ...` trigger.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OnItem {
    pub events: SmolStr,
    /// Widgets after OF; empty for ANYWHERE triggers
    pub widgets: SmolStr,
    pub has_block: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionCallItem {
    /// A FUNCTION statement for the name was seen earlier in the file
    pub defined_in_file: bool,
    /// `DYNAMIC-FUNCTION("name" ...)`
    pub dynamic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableUseItem {
    pub temp_table: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BufferItem {
    pub for_table: SmolStr,
    pub temp_table: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineItem {
    pub define_type: DefineType,
    /// Type after AS, as written
    pub as_type: SmolStr,
    pub primitive: Option<PrimitiveType>,
    /// Field or variable after LIKE
    pub like: Option<SmolStr>,
    /// NEW, SHARED, INPUT, NO-UNDO...
    pub modifiers: Vec<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocVariableItem {
    pub value: String,
    pub global: bool,
    /// `&UNDEFINE`
    pub undefine: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocVariableUseItem {
    pub defined: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeFileItem {
    pub path: Option<PathBuf>,
    /// Owner index given to the included tokens; `None` when the include
    /// could not be resolved or read
    pub owner: Option<u32>,
}
