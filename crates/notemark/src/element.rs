//! Styled output - the text and spans handed to a display surface.

use std::ops::Range;

/// How much styling a render applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Detail view and live editor preview: headings are scaled and bold.
    #[default]
    Full,

    /// Compact list contexts: headings are bold only, never resized.
    Preview,
}

/// Visual treatment attached to a range of output text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Heading with level (1-3): relative size scaling plus bold weight
    Heading { level: u8 },

    Bold,
    Italic,
    Strikethrough,
    Underline,

    /// Bullet glyph drawn in a fixed leading margin
    Bullet,

    /// Leading margin only (ordered list items carry their own number)
    LeadingMargin,

    /// Quoted block with a left bar indent
    Quote,
}

impl Style {
    /// Text size relative to the body font.
    pub fn relative_size(&self) -> f32 {
        match self {
            Style::Heading { level: 1 } => 1.5,
            Style::Heading { level: 2 } => 1.3,
            Style::Heading { level: 3 } => 1.15,
            _ => 1.0,
        }
    }

    /// Whether the style renders with a bold weight.
    pub fn is_bold(&self) -> bool {
        matches!(self, Style::Heading { .. } | Style::Bold)
    }

    /// Whether the style applies to a whole line rather than a run of text.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Style::Heading { .. } | Style::Bullet | Style::LeadingMargin | Style::Quote
        )
    }
}

/// A half-open byte range into the final output text plus its style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledSpan {
    pub start: usize,
    pub end: usize,
    pub style: Style,
}

impl StyledSpan {
    pub fn new(start: usize, end: usize, style: Style) -> Self {
        debug_assert!(start <= end);
        Self { start, end, style }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Text plus the spans styling it.
///
/// Built by appending during line classification, then edited in place by
/// deleting delimiter bytes. Deletions keep every span pointing at the same
/// surviving characters, so offsets always refer to the current text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledText {
    text: String,
    spans: Vec<StyledSpan>,
}

impl StyledText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain text with no spans attached.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &[StyledSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Text covered by a span.
    pub fn resolve(&self, span: &StyledSpan) -> &str {
        &self.text[span.range()]
    }

    /// Spans carrying the given style, in attachment order.
    pub fn spans_with(&self, style: Style) -> impl Iterator<Item = &StyledSpan> + '_ {
        self.spans.iter().filter(move |s| s.style == style)
    }

    pub fn into_parts(self) -> (String, Vec<StyledSpan>) {
        (self.text, self.spans)
    }

    /// Keep at most `max_chars` characters, clipping spans to the new end.
    /// Returns whether anything was cut.
    pub fn truncate_chars(&mut self, max_chars: usize) -> bool {
        let Some((cut, _)) = self.text.char_indices().nth(max_chars) else {
            return false;
        };

        self.text.truncate(cut);
        for span in &mut self.spans {
            span.start = span.start.min(cut);
            span.end = span.end.min(cut);
        }
        self.spans.retain(|s| !s.is_empty());
        true
    }

    pub(crate) fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
    }

    pub(crate) fn push(&mut self, c: char) {
        self.text.push(c);
    }

    /// Append `s` and style exactly the appended bytes.
    pub(crate) fn push_styled(&mut self, s: &str, style: Style) {
        let start = self.text.len();
        self.text.push_str(s);
        self.add_span(start, self.text.len(), style);
    }

    /// Attach a span. Empty ranges style nothing and are dropped.
    pub(crate) fn add_span(&mut self, start: usize, end: usize, style: Style) {
        if start == end {
            return;
        }
        self.spans.push(StyledSpan::new(start, end, style));
    }

    /// Delete a byte range, shifting spans so they keep covering the same
    /// surviving characters. Spans left empty are removed.
    pub(crate) fn delete(&mut self, range: Range<usize>) {
        let Range { start, end } = range;
        debug_assert!(start <= end && end <= self.text.len());
        if start == end {
            return;
        }

        self.text.replace_range(start..end, "");

        let removed = end - start;
        let shift = |pos: usize| {
            if pos <= start {
                pos
            } else if pos >= end {
                pos - removed
            } else {
                start
            }
        };

        for span in &mut self.spans {
            span.start = shift(span.start);
            span.end = shift(span.end);
        }
        self.spans.retain(|s| !s.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_shifts_following_spans() {
        let mut out = StyledText::plain("ab**cd**ef");
        out.add_span(0, 10, Style::Quote);
        out.add_span(8, 10, Style::Italic);

        out.delete(6..8);
        out.delete(2..4);

        assert_eq!(out.text(), "abcdef");
        assert_eq!(out.spans()[0].range(), 0..6);
        assert_eq!(out.resolve(&out.spans()[1]), "ef");
    }

    #[test]
    fn test_delete_drops_emptied_spans() {
        let mut out = StyledText::plain("a~~b");
        out.add_span(1, 3, Style::Underline);

        out.delete(1..3);

        assert_eq!(out.text(), "ab");
        assert!(out.spans().is_empty());
    }

    #[test]
    fn test_truncate_clips_spans() {
        let mut out = StyledText::plain("ééé abc");
        out.add_span(0, 4, Style::Bold);
        out.add_span(7, 10, Style::Italic);

        assert!(out.truncate_chars(2));
        assert_eq!(out.text(), "éé");
        assert_eq!(out.spans(), &[StyledSpan::new(0, 4, Style::Bold)]);

        assert!(!out.truncate_chars(10));
    }

    #[test]
    fn test_empty_span_not_attached() {
        let mut out = StyledText::new();
        out.push_styled("", Style::Bullet);
        assert!(out.spans().is_empty());
    }

    #[test]
    fn test_heading_sizes_shrink_with_level() {
        let h1 = Style::Heading { level: 1 }.relative_size();
        let h2 = Style::Heading { level: 2 }.relative_size();
        let h3 = Style::Heading { level: 3 }.relative_size();
        assert!(h1 > h2 && h2 > h3 && h3 > Style::Bold.relative_size());
    }
}
