//! Domain constants.

use std::time::Duration;

/// Extensions of ABL source files (procedures, windows, includes, classes).
pub const ABL_EXTENSIONS: &[&str] = &["p", "w", "i", "cls", "t"];

/// Extension used by schema dump files.
pub const SCHEMA_DUMP_EXTENSION: &str = "dbdump";

/// Delay between the last debounced request and the parse it triggers.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// Include nesting deeper than this is not expanded.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// A preprocessor value expanding to another reference more than this many
/// times in a row is left unexpanded.
pub const DEFAULT_MAX_EXPANSION_DEPTH: usize = 64;

/// Returns true if `ext` (without the dot) is an ABL source extension.
pub fn is_abl_extension(ext: &str) -> bool {
    ABL_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext))
}
