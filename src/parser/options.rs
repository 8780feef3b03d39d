//! Parser configuration.

use crate::base::constants::{DEFAULT_MAX_EXPANSION_DEPTH, DEFAULT_MAX_INCLUDE_DEPTH};

/// Values of the preprocessor built-ins (`{&OPSYS}`, `PROVERSION`...).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PreprocessorEnv {
    pub opsys: String,
    pub window_system: String,
    pub proversion: String,
    pub batch_mode: bool,
}

impl Default for PreprocessorEnv {
    fn default() -> Self {
        Self {
            opsys: "WIN32".to_string(),
            window_system: "MS-WINDOWS".to_string(),
            proversion: "12.2".to_string(),
            batch_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParserOptions {
    /// Emit a `Word` item for every distinct word the directory doesn't know
    pub match_known_words: bool,
    pub max_include_depth: usize,
    /// Consecutive substitutions at one position before giving up
    pub max_expansion_depth: usize,
    /// Keep the fully expanded token stream in the result
    pub keep_expanded_text: bool,
    pub preprocessor: PreprocessorEnv,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            match_known_words: false,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            max_expansion_depth: DEFAULT_MAX_EXPANSION_DEPTH,
            keep_expanded_text: false,
            preprocessor: PreprocessorEnv::default(),
        }
    }
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_match_known_words(mut self, enabled: bool) -> Self {
        self.match_known_words = enabled;
        self
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn with_max_expansion_depth(mut self, depth: usize) -> Self {
        self.max_expansion_depth = depth;
        self
    }

    pub fn with_keep_expanded_text(mut self, enabled: bool) -> Self {
        self.keep_expanded_text = enabled;
        self
    }

    pub fn with_preprocessor(mut self, preprocessor: PreprocessorEnv) -> Self {
        self.preprocessor = preprocessor;
        self
    }
}
