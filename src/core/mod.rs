//! Shared helpers with no parser dependencies.

pub mod text_utils;

pub use text_utils::{is_word_character, word_prefix_before_cursor};
