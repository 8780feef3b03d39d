//! Text manipulation utilities for working with ABL source code.

/// Check if a character is considered part of an ABL word (identifier).
///
/// Uses Unicode Standard Annex #31 continue characters, plus the extra
/// characters ABL allows inside names (`-`, `#`, `$`, `%`, `&`).
#[inline]
pub fn is_word_character(c: char) -> bool {
    unicode_ident::is_xid_continue(c) || matches!(c, '-' | '#' | '$' | '%' | '&')
}

/// The part of the word that ends right before `position` (what the user
/// has typed so far). Dots are kept so `customer.na` completes fields.
///
/// # Example
/// ```
/// use abl::core::text_utils::word_prefix_before_cursor;
///
/// assert_eq!(word_prefix_before_cursor("FIND customer.na", 16), "customer.na");
/// assert_eq!(word_prefix_before_cursor("RUN ", 4), "");
/// ```
pub fn word_prefix_before_cursor(line: &str, position: usize) -> String {
    let chars: Vec<char> = line.chars().collect();
    let end = position.min(chars.len());
    let mut start = end;
    while start > 0 && is_qualified_name_character(chars[start - 1]) {
        start -= 1;
    }
    chars[start..end].iter().collect::<String>().trim_start_matches('.').to_string()
}

/// Check if a character is part of a qualified name (identifier or `.`).
#[inline]
fn is_qualified_name_character(c: char) -> bool {
    is_word_character(c) || c == '.'
}
