//! Line classification and rendering entry point.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::element::{RenderMode, Style, StyledText};
use crate::inline::apply_inline;

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,3})\s+(.*)$").unwrap());
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\s+(.*)$").unwrap());
static QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^>\s+(.*)$").unwrap());
static ORDERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+)\.\s+(.*)$").unwrap());

/// What a single line of source is, with its structural prefix removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind<'a> {
    /// `#`, `##` or `###` followed by whitespace
    Heading { level: u8, content: &'a str },

    /// `* item`
    Bullet(&'a str),

    /// `> quoted`
    Quote(&'a str),

    /// `12. item`. The source number is kept but never rendered.
    OrderedItem { number: u32, content: &'a str },

    /// Anything else, verbatim
    Plain(&'a str),
}

/// Classify one line. Rules are tried in order and the first match wins:
/// heading, bullet, quote, ordered item, then plain.
pub fn classify_line(line: &str) -> BlockKind<'_> {
    if let Some(caps) = HEADING.captures(line) {
        let level = caps[1].len() as u8;
        let content = caps.get(2).map_or("", |m| m.as_str());
        return BlockKind::Heading { level, content };
    }

    if let Some(caps) = BULLET.captures(line) {
        return BlockKind::Bullet(caps.get(1).map_or("", |m| m.as_str()));
    }

    if let Some(caps) = QUOTE.captures(line) {
        return BlockKind::Quote(caps.get(1).map_or("", |m| m.as_str()));
    }

    if let Some(caps) = ORDERED.captures(line) {
        // digits only, so the parse can fail on overflow alone
        let number = caps[1].parse().unwrap_or(u32::MAX);
        let content = caps.get(2).map_or("", |m| m.as_str());
        return BlockKind::OrderedItem { number, content };
    }

    BlockKind::Plain(line)
}

/// Ordered list numbering across consecutive lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListState {
    #[default]
    Outside,

    /// Inside a run of ordered items; holds the number of the current item
    Inside(u32),
}

impl ListState {
    /// State after seeing `kind`. Ordered items continue or start a run,
    /// every other line ends it.
    pub fn advance(self, kind: &BlockKind<'_>) -> Self {
        match (self, kind) {
            (ListState::Inside(n), BlockKind::OrderedItem { .. }) => {
                ListState::Inside(n.saturating_add(1))
            }
            (ListState::Outside, BlockKind::OrderedItem { .. }) => ListState::Inside(1),
            _ => ListState::Outside,
        }
    }

    pub fn counter(&self) -> Option<u32> {
        match self {
            ListState::Inside(n) => Some(*n),
            ListState::Outside => None,
        }
    }
}

/// Render note source into styled text.
///
/// Lines are classified one by one and emitted with their block styling,
/// joined by the source newlines. Inline delimiters are then stripped from
/// the assembled text and replaced by spans.
pub fn render(source: &str, mode: RenderMode) -> StyledText {
    let mut out = StyledText::new();
    if source.is_empty() {
        return out;
    }

    let mut list = ListState::Outside;

    for (i, line) in source.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }

        let kind = classify_line(line);
        list = list.advance(&kind);

        match kind {
            BlockKind::Heading { level, content } => {
                let style = match mode {
                    RenderMode::Full => Style::Heading { level },
                    RenderMode::Preview => Style::Bold,
                };
                out.push_styled(content, style);
            }
            BlockKind::Bullet(content) => out.push_styled(content, Style::Bullet),
            BlockKind::Quote(content) => out.push_styled(content, Style::Quote),
            BlockKind::OrderedItem { content, .. } => {
                let n = list.counter().unwrap_or(1);
                out.push_styled(&format!("{n}. {content}"), Style::LeadingMargin);
            }
            BlockKind::Plain(content) => out.push_str(content),
        }
    }

    apply_inline(&mut out);

    trace!(
        "rendered {} source bytes into {} bytes with {} spans ({:?})",
        source.len(),
        out.len(),
        out.spans().len(),
        mode
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_heading_levels() {
        assert_eq!(
            classify_line("## Sub"),
            BlockKind::Heading {
                level: 2,
                content: "Sub"
            }
        );
        assert_eq!(
            classify_line("### Deep"),
            BlockKind::Heading {
                level: 3,
                content: "Deep"
            }
        );
    }

    #[test]
    fn test_four_hashes_is_plain() {
        assert_eq!(classify_line("#### nope"), BlockKind::Plain("#### nope"));
    }

    #[test]
    fn test_heading_needs_whitespace() {
        assert_eq!(classify_line("#tag"), BlockKind::Plain("#tag"));
    }

    #[test]
    fn test_classify_bullet_quote_ordered() {
        assert_eq!(classify_line("* item"), BlockKind::Bullet("item"));
        assert_eq!(classify_line("> said"), BlockKind::Quote("said"));
        assert_eq!(
            classify_line("42. answer"),
            BlockKind::OrderedItem {
                number: 42,
                content: "answer"
            }
        );
    }

    #[test]
    fn test_emphasis_is_not_bullet() {
        assert_eq!(classify_line("*word*"), BlockKind::Plain("*word*"));
        assert_eq!(classify_line("**bold**"), BlockKind::Plain("**bold**"));
    }

    #[test]
    fn test_whitespace_line_is_plain() {
        assert_eq!(classify_line("   "), BlockKind::Plain("   "));
    }

    #[test]
    fn test_huge_source_number_still_ordered() {
        assert!(matches!(
            classify_line("99999999999. big"),
            BlockKind::OrderedItem {
                number: u32::MAX,
                ..
            }
        ));
    }

    #[test]
    fn test_list_state_transitions() {
        let item = BlockKind::OrderedItem {
            number: 7,
            content: "x",
        };
        let plain = BlockKind::Plain("x");

        let s = ListState::Outside.advance(&item);
        assert_eq!(s, ListState::Inside(1));
        let s = s.advance(&item);
        assert_eq!(s.counter(), Some(2));
        let s = s.advance(&plain);
        assert_eq!(s, ListState::Outside);
        assert_eq!(s.advance(&item), ListState::Inside(1));
    }
}
