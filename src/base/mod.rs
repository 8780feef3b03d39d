//! Foundation types for the ABL toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`Position`], [`Span`] - Line/column positions (0-indexed)
//! - [`TextRange`], [`TextSize`] - Byte offsets, re-exported from `text-size`
//! - Domain constants (file extensions, scheduler defaults)
//!
//! This module has NO dependencies on other crate modules.

pub mod constants;
mod position;

pub use position::{Position, Span};
pub use text_size::{TextRange, TextSize};

// Re-export text-size types for convenience
pub use text_size;
