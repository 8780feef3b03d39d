//! Scope stack
//!
//! ```text
//!   File                       pushed first, popped at teardown only
//!   └── Routine (Procedure)    PROCEDURE p:          ... END PROCEDURE.
//!       └── PreprocIf          &IF ... &THEN         ... &ENDIF
//!           └── Block          DO:                   ... END.
//! ```
//!
//! Each `&IF` frame tracks its own branch state, so nested conditionals
//! resolve `&ELSE` against their own `&IF`. A frame may be removed from the
//! middle of the stack: an `&ENDIF` closes its `&IF` even when a block
//! opened inside the branch is still open.
//!
//! Line info stores shared snapshots of the stack; the snapshot is rebuilt
//! only after the stack changed.

use std::sync::Arc;

use smol_str::SmolStr;

use super::items::ItemId;
use super::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoutineKind {
    Procedure,
    Function,
    /// METHOD, CONSTRUCTOR or DESTRUCTOR
    Method,
    /// `ON ... DO:` trigger block
    Trigger,
}

/// One open scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    File {
        item: ItemId,
    },
    Routine {
        item: ItemId,
        kind: RoutineKind,
        /// The END qualifier that closes it (`PROCEDURE`, `METHOD`...)
        keyword: SmolStr,
        opener: Token,
    },
    PreprocIf {
        opener: Token,
        /// Some branch of this `&IF` was already taken
        branch_taken: bool,
        /// The current branch is taken
        active: bool,
    },
    PreprocSuspend {
        item: ItemId,
        opener: Token,
    },
    Block {
        opener: Token,
        keyword: SmolStr,
        label: Option<ItemId>,
    },
}

impl Scope {
    /// The item owning what is parsed inside this scope.
    pub fn item(&self) -> Option<ItemId> {
        match self {
            Self::File { item } | Self::Routine { item, .. } | Self::PreprocSuspend { item, .. } => Some(*item),
            Self::PreprocIf { .. } | Self::Block { .. } => None,
        }
    }

    pub fn opener(&self) -> Option<&Token> {
        match self {
            Self::File { .. } => None,
            Self::Routine { opener, .. }
            | Self::PreprocIf { opener, .. }
            | Self::PreprocSuspend { opener, .. }
            | Self::Block { opener, .. } => Some(opener),
        }
    }

    pub fn kind(&self) -> ScopeKind {
        match self {
            Self::File { .. } => ScopeKind::File,
            Self::Routine { kind, .. } => match kind {
                RoutineKind::Procedure => ScopeKind::Procedure,
                RoutineKind::Function => ScopeKind::Function,
                RoutineKind::Method => ScopeKind::Method,
                RoutineKind::Trigger => ScopeKind::Trigger,
            },
            Self::PreprocIf { .. } => ScopeKind::PreprocIf,
            Self::PreprocSuspend { .. } => ScopeKind::PreprocSuspend,
            Self::Block { .. } => ScopeKind::Block,
        }
    }

    /// Closed by `END`.
    pub fn is_block_like(&self) -> bool {
        matches!(self, Self::Routine { .. } | Self::Block { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScopeKind {
    File,
    Procedure,
    Function,
    Method,
    Trigger,
    PreprocIf,
    PreprocSuspend,
    Block,
}

/// Token-free copy of a scope, stored in line info.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScopeFrame {
    pub kind: ScopeKind,
    pub item: Option<ItemId>,
    /// Root-file line of the opening token
    pub line: u32,
    /// False for an `&IF` frame whose current branch is not taken
    pub active: bool,
}

#[derive(Debug, Clone)]
struct Entry {
    scope: Scope,
    root_line: u32,
}

/// The stack of open scopes for one parse.
#[derive(Debug, Default)]
pub struct ScopeStack {
    entries: Vec<Entry>,
    snapshot: Option<Arc<[ScopeFrame]>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, scope: Scope, root_line: u32) {
        self.snapshot = None;
        self.entries.push(Entry { scope, root_line });
    }

    pub fn pop(&mut self) -> Option<(Scope, u32)> {
        self.snapshot = None;
        self.entries.pop().map(|e| (e.scope, e.root_line))
    }

    /// Remove the frame at `index` (0 is the bottom).
    pub fn remove(&mut self, index: usize) -> (Scope, u32) {
        self.snapshot = None;
        let entry = self.entries.remove(index);
        (entry.scope, entry.root_line)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Scope> {
        self.snapshot = None;
        self.entries.get_mut(index).map(|e| &mut e.scope)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Frames from bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Scope> + ExactSizeIterator {
        self.entries.iter().map(|e| &e.scope)
    }

    /// Index of the topmost frame matching `pred`.
    pub fn position_from_top(&self, pred: impl Fn(&Scope) -> bool) -> Option<usize> {
        self.entries.iter().rposition(|e| pred(&e.scope))
    }

    /// True when any `&IF` frame is on a branch that is not taken.
    pub fn in_false_branch(&self) -> bool {
        self.iter().any(|s| matches!(s, Scope::PreprocIf { active: false, .. }))
    }

    /// True when every `&IF` frame below `index` is active.
    pub fn active_below(&self, index: usize) -> bool {
        self.entries[..index.min(self.entries.len())]
            .iter()
            .all(|e| !matches!(e.scope, Scope::PreprocIf { active: false, .. }))
    }

    /// Item owning what is parsed at the top of the stack.
    pub fn current_item(&self) -> Option<ItemId> {
        self.iter().rev().find_map(Scope::item)
    }

    /// Routine (not trigger) frames currently open.
    pub fn open_routines(&self) -> usize {
        self.iter()
            .filter(|s| {
                matches!(
                    s,
                    Scope::Routine { kind, .. } if *kind != RoutineKind::Trigger
                )
            })
            .count()
    }

    /// Shared snapshot of the current stack.
    pub fn snapshot(&mut self) -> Arc<[ScopeFrame]> {
        if let Some(snapshot) = &self.snapshot {
            return Arc::clone(snapshot);
        }
        let frames: Arc<[ScopeFrame]> = self
            .entries
            .iter()
            .map(|e| ScopeFrame {
                kind: e.scope.kind(),
                item: e.scope.item(),
                line: e.root_line,
                active: !matches!(e.scope, Scope::PreprocIf { active: false, .. }),
            })
            .collect();
        self.snapshot = Some(Arc::clone(&frames));
        frames
    }
}
