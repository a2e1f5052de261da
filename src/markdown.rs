//! Rendering of plain-text chat messages.

/// Turns decoded chat text into safe markup.
///
/// Only called for plain-text messages; rich payloads and legacy i18n
/// messages never reach the renderer.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, text: &str) -> String;
}

impl<F> MarkdownRenderer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn render(&self, text: &str) -> String {
        self(text)
    }
}

/// Default renderer: escapes HTML and keeps everything else as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapingRenderer;

impl MarkdownRenderer for EscapingRenderer {
    fn render(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                _ => out.push(c),
            }
        }
        out
    }
}
