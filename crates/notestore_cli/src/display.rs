//! Terminal rendering of styled note text.

use notemark::{Style, StyledText};

const RESET: &str = "\x1b[0m";

fn sgr_codes(style: Style, codes: &mut Vec<u8>) {
    match style {
        Style::Heading { level } => {
            codes.push(1);
            if level == 1 {
                codes.push(4);
            }
        }
        Style::Bold => codes.push(1),
        Style::Italic => codes.push(3),
        Style::Underline => codes.push(4),
        Style::Strikethrough => codes.push(9),
        Style::Quote => codes.push(2),
        Style::Bullet | Style::LeadingMargin => {}
    }
}

fn margin(style: Style) -> Option<&'static str> {
    match style {
        Style::Bullet => Some("  • "),
        Style::LeadingMargin => Some("   "),
        Style::Quote => Some(" │ "),
        _ => None,
    }
}

/// Render `text` for a terminal. Block styles become margins, everything
/// else becomes SGR attributes when `color` is set.
pub fn to_ansi(text: &StyledText, color: bool) -> String {
    let src = text.text();
    let mut out = String::with_capacity(src.len());
    let mut line_start = 0;

    for (i, line) in src.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let line_end = line_start + line.len();

        let spans: Vec<_> = text
            .spans()
            .iter()
            .filter(|s| s.start < line_end && s.end > line_start)
            .collect();

        if let Some(prefix) = spans
            .iter()
            .filter(|s| s.start == line_start && s.style.is_block())
            .find_map(|s| margin(s.style))
        {
            out.push_str(prefix);
        }

        if !color || spans.is_empty() {
            out.push_str(line);
            line_start = line_end + 1;
            continue;
        }

        let mut cuts = vec![line_start, line_end];
        for span in &spans {
            cuts.push(span.start.clamp(line_start, line_end));
            cuts.push(span.end.clamp(line_start, line_end));
        }
        cuts.sort_unstable();
        cuts.dedup();

        for pair in cuts.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let mut codes = Vec::new();
            for span in spans.iter().filter(|s| s.start <= a && s.end >= b) {
                sgr_codes(span.style, &mut codes);
            }
            codes.sort_unstable();
            codes.dedup();

            let segment = &src[a..b];
            if codes.is_empty() {
                out.push_str(segment);
            } else {
                let codes: Vec<String> = codes.iter().map(u8::to_string).collect();
                out.push_str(&format!("\x1b[{}m{segment}{RESET}", codes.join(";")));
            }
        }

        line_start = line_end + 1;
    }

    out
}
