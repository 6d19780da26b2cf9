//! Small markdown renderer for note content.
//!
//! Turns a constrained markup subset (headings, bullets, quotes, ordered
//! items, and bold/italic/strikethrough/underline delimiters) into plain text
//! plus a list of styled spans that a display surface can apply.

mod element;
mod inline;
mod parser;
mod strip;

pub use element::{RenderMode, Style, StyledSpan, StyledText};
pub use inline::apply_inline;
pub use parser::{classify_line, render, BlockKind, ListState};
pub use strip::strip;
