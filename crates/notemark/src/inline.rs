//! Inline delimiter handling for strikethrough, underline, bold and italic.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::element::{Style, StyledText};

pub(crate) static STRIKETHROUGH: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~(.+?)~~").unwrap());
pub(crate) static UNDERLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"__(.+?)__").unwrap());
pub(crate) static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

/// A delimited run: the whole match and the text between the delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DelimitedMatch {
    pub outer: Range<usize>,
    pub inner: Range<usize>,
}

/// Replace inline delimiter pairs in `out` with spans.
///
/// Passes run strikethrough, underline, bold, italic. Bold has to be fully
/// stripped before italic looks at the text, otherwise `**x**` would read as
/// two italic markers. Within a pass matches are handled rightmost first, and
/// each one loses its closing delimiter before its opening one.
pub fn apply_inline(out: &mut StyledText) {
    apply_pattern(out, &STRIKETHROUGH, Style::Strikethrough);
    apply_pattern(out, &UNDERLINE, Style::Underline);
    apply_pattern(out, &BOLD, Style::Bold);

    let italics = find_italics(out.text());
    apply_matches(out, italics, Style::Italic);
}

fn apply_pattern(out: &mut StyledText, pattern: &Regex, style: Style) {
    let matches = regex_matches(pattern, out.text());
    apply_matches(out, matches, style);
}

fn apply_matches(out: &mut StyledText, matches: Vec<DelimitedMatch>, style: Style) {
    if matches.is_empty() {
        return;
    }

    trace!("applying {} {:?} spans", matches.len(), style);

    for m in matches.into_iter().rev() {
        let inner_len = m.inner.len();
        out.delete(m.inner.end..m.outer.end);
        out.delete(m.outer.start..m.inner.start);
        out.add_span(m.outer.start, m.outer.start + inner_len, style);
    }
}

/// Non-overlapping leftmost matches of a single-capture delimiter pattern.
pub(crate) fn regex_matches(pattern: &Regex, text: &str) -> Vec<DelimitedMatch> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let outer = caps.get(0)?.range();
            let inner = caps.get(1)?.range();
            Some(DelimitedMatch { outer, inner })
        })
        .collect()
}

/// Find `*italic*` runs.
///
/// Neither delimiter may touch another `*`, so a leftover `**` is never
/// split into italic markers. The content is at least one byte, stays on one
/// line and ends at the first eligible closing `*`.
pub(crate) fn find_italics(text: &str) -> Vec<DelimitedMatch> {
    let bytes = text.as_bytes();
    let is_lone_star = |i: usize| {
        bytes[i] == b'*'
            && (i == 0 || bytes[i - 1] != b'*')
            && !matches!(bytes.get(i + 1), Some(b'*'))
    };

    let mut result = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if !is_lone_star(i) {
            i += 1;
            continue;
        }

        let mut close = None;
        let mut j = i + 1;
        while j < bytes.len() && bytes[j] != b'\n' {
            if j > i + 1 && is_lone_star(j) {
                close = Some(j);
                break;
            }
            j += 1;
        }

        match close {
            Some(j) => {
                result.push(DelimitedMatch {
                    outer: i..j + 1,
                    inner: i + 1..j,
                });
                i = j + 1;
            }
            None => i += 1,
        }
    }

    result
}
