//! Structural error kinds
//!
//! Error codes follow a naming convention: E{category}{number}
//! - E01xx: Block structure (END without block, missing END, nested routines)
//! - E02xx: Preprocessor structure (`&IF`/`&ENDIF`, `&ANALYZE-SUSPEND`/`&ANALYZE-RESUME`)

use std::fmt;

/// Kinds of structural errors reported by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParserErrorKind {
    // =========================================================================
    // E01xx: Block structure
    // =========================================================================
    /// `END` with no open block
    UnexpectedBlockEnd,
    /// `END kind` closing a block of another kind
    MismatchedBlockEnd,
    /// Block still open at end of file
    MissingBlockEnd,
    /// PROCEDURE, FUNCTION or METHOD opened inside another one
    NestedRoutine,

    // =========================================================================
    // E02xx: Preprocessor structure
    // =========================================================================
    /// `&ELSE`, `&ELSEIF` or `&ENDIF` without `&IF`
    UnexpectedPreprocDirective,
    /// `&IF` still open at end of file
    MissingPreprocEndIf,
    /// `&ANALYZE-RESUME` without `&ANALYZE-SUSPEND`
    UnexpectedSuspendEnd,
    /// `&ANALYZE-SUSPEND` still open at end of file
    MissingSuspendEnd,
}

impl ParserErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnexpectedBlockEnd => "E0101",
            Self::MismatchedBlockEnd => "E0102",
            Self::MissingBlockEnd => "E0103",
            Self::NestedRoutine => "E0104",
            Self::UnexpectedPreprocDirective => "E0201",
            Self::MissingPreprocEndIf => "E0202",
            Self::UnexpectedSuspendEnd => "E0203",
            Self::MissingSuspendEnd => "E0204",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::UnexpectedBlockEnd => "END found with no block to close",
            Self::MismatchedBlockEnd => "END does not match the kind of the block it closes",
            Self::MissingBlockEnd => "block is never closed with END",
            Self::NestedRoutine => "routine defined inside another routine",
            Self::UnexpectedPreprocDirective => "preprocessor directive without a matching &IF",
            Self::MissingPreprocEndIf => "&IF is never closed with &ENDIF",
            Self::UnexpectedSuspendEnd => "&ANALYZE-RESUME without &ANALYZE-SUSPEND",
            Self::MissingSuspendEnd => "&ANALYZE-SUSPEND is never closed with &ANALYZE-RESUME",
        }
    }

    /// Errors about preprocessor directives rather than ABL blocks
    pub fn is_preprocessor(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedPreprocDirective
                | Self::MissingPreprocEndIf
                | Self::UnexpectedSuspendEnd
                | Self::MissingSuspendEnd
        )
    }
}

impl fmt::Display for ParserErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
