//! ABL keywords: statement classification and the default keyword list.
//!
//! ABL accepts abbreviations for many keywords (`DEF`, `DEFI` ... `DEFINE`);
//! [`abbreviates`] checks a word against a full keyword and its minimum
//! length.

/// True when `word` is `keyword` or one of its accepted abbreviations.
pub fn abbreviates(word: &str, keyword: &str, min_len: usize) -> bool {
    word.len() >= min_len && word.len() <= keyword.len() && keyword[..word.len()].eq_ignore_ascii_case(word)
}

/// What a statement is, decided by its first word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatementKind {
    Procedure,
    Function,
    Method,
    Constructor,
    Destructor,
    On,
    Run,
    Define,
    /// `VAR type name`
    Var,
    End,
    /// DO, FOR, REPEAT, CASE, CATCH, FINALLY, CLASS, INTERFACE, ENUM
    Block,
    /// GET/SET property accessor body
    Accessor,
    #[default]
    Other,
}

impl StatementKind {
    pub fn classify(word: &str) -> Self {
        let upper = word.to_ascii_uppercase();
        match upper.as_str() {
            "FUNCTION" => Self::Function,
            "METHOD" => Self::Method,
            "CONSTRUCTOR" => Self::Constructor,
            "DESTRUCTOR" => Self::Destructor,
            "ON" => Self::On,
            "RUN" => Self::Run,
            "VAR" => Self::Var,
            "END" => Self::End,
            "GET" | "SET" => Self::Accessor,
            w if BLOCK_KEYWORDS.contains(&w) => Self::Block,
            w if abbreviates(w, "PROCEDURE", 5) => Self::Procedure,
            w if abbreviates(w, "DEFINE", 3) => Self::Define,
            _ => Self::Other,
        }
    }

    /// Statements that open a routine body when they end with `:`.
    pub fn is_routine(self) -> bool {
        matches!(
            self,
            Self::Procedure | Self::Function | Self::Method | Self::Constructor | Self::Destructor
        )
    }

    /// Header statements: a word followed by `(` there is a parameter list,
    /// not a function call.
    pub fn is_header(self) -> bool {
        self.is_routine() || matches!(self, Self::Define | Self::Var | Self::Accessor)
    }
}

/// First words that open a generic block.
pub const BLOCK_KEYWORDS: &[&str] = &[
    "DO", "FOR", "REPEAT", "CASE", "CATCH", "FINALLY", "CLASS", "INTERFACE", "ENUM",
];

/// Words that start a new statement at the next word.
pub const STATEMENT_RESTART_WORDS: &[&str] = &["THEN", "ELSE", "OTHERWISE"];

/// Inside `ON event OF widget ...`, these words start the trigger action.
pub const ON_ACTION_WORDS: &[&str] = &[
    "RUN", "DO", "APPLY", "ASSIGN", "MESSAGE", "RETURN", "PUBLISH", "DISPLAY",
];

/// Type word of a `DEFINE` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DefineType {
    Variable,
    Parameter,
    Buffer,
    TempTable,
    WorkTable,
    Stream,
    Frame,
    Query,
    Dataset,
    DataSource,
    Event,
    Property,
    Button,
    Browse,
    Image,
    Menu,
    SubMenu,
    Rectangle,
}

impl DefineType {
    pub fn parse(word: &str) -> Option<Self> {
        let upper = word.to_ascii_uppercase();
        let ty = match upper.as_str() {
            "BUFFER" => Self::Buffer,
            "TEMP-TABLE" => Self::TempTable,
            "WORK-TABLE" | "WORKFILE" => Self::WorkTable,
            "STREAM" => Self::Stream,
            "FRAME" => Self::Frame,
            "QUERY" => Self::Query,
            "DATASET" => Self::Dataset,
            "DATA-SOURCE" => Self::DataSource,
            "EVENT" => Self::Event,
            "PROPERTY" => Self::Property,
            "BUTTON" => Self::Button,
            "BROWSE" => Self::Browse,
            "IMAGE" => Self::Image,
            "MENU" => Self::Menu,
            "SUB-MENU" => Self::SubMenu,
            "RECTANGLE" => Self::Rectangle,
            w if abbreviates(w, "VARIABLE", 3) => Self::Variable,
            w if abbreviates(w, "PARAMETER", 5) => Self::Parameter,
            _ => return None,
        };
        Some(ty)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Variable => "VARIABLE",
            Self::Parameter => "PARAMETER",
            Self::Buffer => "BUFFER",
            Self::TempTable => "TEMP-TABLE",
            Self::WorkTable => "WORK-TABLE",
            Self::Stream => "STREAM",
            Self::Frame => "FRAME",
            Self::Query => "QUERY",
            Self::Dataset => "DATASET",
            Self::DataSource => "DATA-SOURCE",
            Self::Event => "EVENT",
            Self::Property => "PROPERTY",
            Self::Button => "BUTTON",
            Self::Browse => "BROWSE",
            Self::Image => "IMAGE",
            Self::Menu => "MENU",
            Self::SubMenu => "SUB-MENU",
            Self::Rectangle => "RECTANGLE",
        }
    }
}

/// Words allowed between `DEFINE` and the type word.
pub const DEFINE_MODIFIERS: &[&str] = &[
    "NEW", "GLOBAL", "SHARED", "PRIVATE", "PROTECTED", "PUBLIC", "PACKAGE-PRIVATE", "PACKAGE-PROTECTED",
    "STATIC", "ABSTRACT", "OVERRIDE", "SERIALIZABLE", "NON-SERIALIZABLE", "INPUT", "OUTPUT", "INPUT-OUTPUT",
    "RETURN",
];

/// Access and behaviour modifiers in METHOD, CONSTRUCTOR and DESTRUCTOR headers.
pub const METHOD_MODIFIERS: &[&str] = &[
    "PUBLIC", "PRIVATE", "PROTECTED", "PACKAGE-PRIVATE", "PACKAGE-PROTECTED", "STATIC", "ABSTRACT", "OVERRIDE",
    "FINAL",
];

/// Built-in keywords known to the directory when no keyword file is given.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "ABSOLUTE", "ACCUMULATE", "ADD-INTERVAL", "AND", "ANYWHERE", "APPLY", "AS", "ASC", "ASSIGN",
    "AVAILABLE", "BEGINS", "BREAK", "BUFFER", "BUFFER-COPY", "BY", "CAN-FIND", "CASE", "CATCH",
    "CHARACTER", "CHR", "CLASS", "CLOSE", "COMPILE", "CONNECT", "CONSTRUCTOR", "COUNT-OF", "CREATE",
    "CURRENT-CHANGED", "DATE", "DATETIME", "DECIMAL", "DEFINE", "DEFINED", "DELETE", "DESTRUCTOR",
    "DISPLAY", "DO", "DYNAMIC-FUNCTION", "EACH", "ELSE", "EMPTY", "END", "ENTRY", "ENUM", "EQ", "ERROR",
    "EXCLUSIVE-LOCK", "EXTENT", "FALSE", "FIELD", "FIELDS", "FINALLY", "FIND", "FIRST", "FOR", "FORMAT",
    "FORWARD", "FRAME", "FUNCTION", "GE", "GET", "GLOBAL", "GT", "HANDLE", "IF", "IMPLEMENTS", "IN",
    "INDEX", "INHERITS", "INITIAL", "INPUT", "INPUT-OUTPUT", "INT64", "INTEGER", "INTERFACE", "IS",
    "LAST", "LE", "LEAVE", "LENGTH", "LIKE", "LOGICAL", "LONGCHAR", "LOOKUP", "LT", "MATCHES", "MAXIMUM",
    "MEMPTR", "MESSAGE", "METHOD", "MINIMUM", "MODULO", "NE", "NEW", "NEXT", "NO-ERROR", "NO-LOCK",
    "NO-UNDO", "NOT", "NOW", "NUM-ENTRIES", "OF", "ON", "OR", "OTHERWISE", "OUTPUT", "OVERRIDE",
    "PARAMETER", "PERSISTENT", "PRIVATE", "PROCEDURE", "PROPERTY", "PROTECTED", "PUBLIC", "PUBLISH",
    "QUERY", "QUIT", "RECID", "RELEASE", "REPEAT", "REPLACE", "RETURN", "RETURNS", "ROWID", "RUN",
    "SCOPED-DEFINE", "SEARCH", "SELF", "SET", "SHARE-LOCK", "SHARED", "SKIP", "STATIC", "STOP",
    "STREAM", "STRING", "SUBSCRIBE", "SUBSTITUTE", "SUBSTRING", "SUPER", "TABLE", "TEMP-TABLE", "THEN",
    "THIS-OBJECT", "THIS-PROCEDURE", "TO", "TODAY", "TRANSACTION", "TRIGGER", "TRIM", "TRUE", "UNDO",
    "UNKNOWN", "UPDATE", "USE-INDEX", "USING", "VALID-HANDLE", "VALUE", "VAR", "VARIABLE", "VIEW", "VOID",
    "WHEN", "WHERE", "WHILE", "WITH", "YES", "NO",
];
