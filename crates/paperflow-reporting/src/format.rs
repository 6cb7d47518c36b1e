//! Free-text formatting for analysis fields: bullet normalization and
//! `**emphasis**` markup, rendered to escaped HTML.

use once_cell::sync::Lazy;
use regex::Regex;

/// The bullet glyph used by the analysis backend.
pub const BULLET: char = '•';

/// One display line of a formatted field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextLine {
    /// A list item, glyph stripped.
    Bullet(String),
    Paragraph(String),
}

impl TextLine {
    pub fn text(&self) -> &str {
        match self {
            TextLine::Bullet(s) | TextLine::Paragraph(s) => s,
        }
    }

    pub fn is_bullet(&self) -> bool {
        matches!(self, TextLine::Bullet(_))
    }
}

/// Split a field into display lines.
///
/// Every `•` starts a new line, even when the backend wrote several bullets
/// on one line. Text before an inline glyph on the same line is itself a
/// bullet unless it ends with a colon (then it is a heading). Lines are
/// trimmed and blank lines dropped.
pub fn split_lines(text: &str) -> Vec<TextLine> {
    let mut lines = Vec::new();
    for source_line in text.lines() {
        let mut segments = source_line.split(BULLET);
        let lead = segments.next().unwrap_or("").trim();
        let has_glyph = source_line.contains(BULLET);

        if !lead.is_empty() {
            let is_heading = lead.ends_with(':') || lead.ends_with('：');
            if has_glyph && !is_heading {
                lines.push(TextLine::Bullet(lead.to_string()));
            } else {
                lines.push(TextLine::Paragraph(lead.to_string()));
            }
        }

        for segment in segments {
            let segment = segment.trim();
            if !segment.is_empty() {
                lines.push(TextLine::Bullet(segment.to_string()));
            }
        }
    }
    lines
}

/// Escape text for HTML element content and quoted attribute values.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape `text` and turn `**x**` into `<strong>x</strong>`. Unpaired
/// markers are dropped so no literal `**` reaches the output.
pub fn render_inline(text: &str) -> String {
    static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

    let escaped = html_escape(text);
    let emphasized = EMPHASIS.replace_all(&escaped, "<strong>$1</strong>");
    emphasized.replace("**", "")
}

/// Render a field as HTML: consecutive bullets become one `<ul>`, other
/// lines become `<p>`. Empty input renders as an empty string.
pub fn format_text(text: &str) -> String {
    let mut out = String::new();
    let mut in_list = false;

    for line in split_lines(text) {
        match &line {
            TextLine::Bullet(item) => {
                if !in_list {
                    out.push_str("<ul class=\"bullets\">");
                    in_list = true;
                }
                out.push_str(&format!("<li>{}</li>", render_inline(item)));
            }
            TextLine::Paragraph(para) => {
                if in_list {
                    out.push_str("</ul>");
                    in_list = false;
                }
                out.push_str(&format!("<p>{}</p>", render_inline(para)));
            }
        }
    }
    if in_list {
        out.push_str("</ul>");
    }
    out
}

/// Plain-text rendering for terminals: bullets keep the glyph, emphasis
/// markers are removed.
pub fn format_plain(text: &str) -> Vec<String> {
    split_lines(text)
        .into_iter()
        .map(|line| {
            let body = line.text().replace("**", "");
            if line.is_bullet() {
                format!("{} {}", BULLET, body)
            } else {
                body
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_glyphs_split_into_bullets() {
        let lines = split_lines("Task A•Task B\n•Task C");
        assert_eq!(
            lines,
            vec![
                TextLine::Bullet("Task A".into()),
                TextLine::Bullet("Task B".into()),
                TextLine::Bullet("Task C".into()),
            ]
        );
    }

    #[test]
    fn heading_before_glyph_stays_paragraph() {
        let lines = split_lines("Generation: • Summarization • QA");
        assert_eq!(lines[0], TextLine::Paragraph("Generation:".into()));
        assert!(lines[1..].iter().all(TextLine::is_bullet));
        assert_eq!(lines.len(), 3);

        let zh = split_lines("分类：• 情感分析");
        assert_eq!(zh[0], TextLine::Paragraph("分类：".into()));
    }

    #[test]
    fn blank_lines_dropped_and_trimmed() {
        let lines = split_lines("  first  \n\n   \n• second \n•\n");
        assert_eq!(
            lines,
            vec![
                TextLine::Paragraph("first".into()),
                TextLine::Bullet("second".into()),
            ]
        );
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn emphasis_becomes_strong() {
        assert_eq!(
            render_inline("uses **RoPE** embeddings"),
            "uses <strong>RoPE</strong> embeddings"
        );
        assert_eq!(
            render_inline("**a** and **b**"),
            "<strong>a</strong> and <strong>b</strong>"
        );
    }

    #[test]
    fn unpaired_markers_removed() {
        let out = render_inline("**bold** then **dangling");
        assert_eq!(out, "<strong>bold</strong> then dangling");
        assert!(!out.contains("**"));
    }

    #[test]
    fn text_is_escaped_before_markup() {
        let out = render_inline("a <script> & **b<c**");
        assert_eq!(out, "a &lt;script&gt; &amp; <strong>b&lt;c</strong>");
    }

    #[test]
    fn format_groups_consecutive_bullets() {
        let html = format_text("Intro\n• one\n• **two**\nOutro");
        assert_eq!(
            html,
            "<p>Intro</p><ul class=\"bullets\"><li>one</li><li><strong>two</strong></li></ul><p>Outro</p>"
        );
        assert_eq!(format_text("   "), "");
    }

    #[test]
    fn plain_rendering_keeps_glyph() {
        assert_eq!(
            format_plain("x•**y**"),
            vec!["• x".to_string(), "• y".to_string()]
        );
    }
}
