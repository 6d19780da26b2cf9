//! Markup removal for plain-text contexts (search, sharing, assistant input).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::inline::{find_italics, BOLD, STRIKETHROUGH, UNDERLINE};

static HEADING_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,3}\s+(.*)$").unwrap());
static BULLET_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\*\s+(.*)$").unwrap());
static QUOTE_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^>\s+(.*)$").unwrap());
static ORDERED_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[0-9]+\.\s+(.*)$").unwrap());
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Remove all markup from `source`.
///
/// Each block line becomes its content followed by a newline, inline
/// delimiters are dropped, runs of three or more newlines collapse to two and
/// the result is trimmed. Works on the raw source; nothing is rendered.
pub fn strip(source: &str) -> String {
    let mut text = source.to_string();

    for block in [&HEADING_LINES, &BULLET_LINES, &QUOTE_LINES, &ORDERED_LINES] {
        text = block.replace_all(&text, "${1}\n").into_owned();
    }

    for inline in [&STRIKETHROUGH, &UNDERLINE, &BOLD] {
        text = inline.replace_all(&text, "${1}").into_owned();
    }
    text = strip_italics(&text);

    BLANK_RUNS.replace_all(&text, "\n\n").trim().to_string()
}

fn strip_italics(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;

    for m in find_italics(text) {
        result.push_str(&text[last..m.outer.start]);
        result.push_str(&text[m.inner.clone()]);
        last = m.outer.end;
    }
    result.push_str(&text[last..]);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_inline_and_collapse() {
        assert_eq!(
            strip("**bold** ~~gone~~ text\n\n\n\nmore"),
            "bold gone text\n\nmore"
        );
    }

    #[test]
    fn test_strip_blocks() {
        assert_eq!(strip("# Title\nbody"), "Title\n\nbody");
        assert_eq!(strip("* one\n* two"), "one\n\ntwo");
        assert_eq!(strip("> quoted"), "quoted");
        assert_eq!(strip("3. third"), "third");
    }

    #[test]
    fn test_strip_italic_and_underline() {
        assert_eq!(strip("an *aside* and __this__"), "an aside and this");
    }

    #[test]
    fn test_strip_plain_is_identity() {
        let plain = "just some words\nsecond line";
        assert_eq!(strip(plain), plain);
    }

    #[test]
    fn test_strip_trims_and_collapses_plain() {
        assert_eq!(strip("  a\n\n\n\n\nb  "), "a\n\nb");
    }

    #[test]
    fn test_strip_empty() {
        assert_eq!(strip(""), "");
    }
}
