//! Code rendering: syntect highlighting, diagram fences, and the inline
//! code class.
//!
//! syntect themes emit inline `style` attributes, which is exactly what the
//! service's markup format needs; no class inlining is required for code.

use pulldown_cmark::{CodeBlockKind, Event, Tag, TagEnd};
use std::sync::OnceLock;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use super::{html_escape, owned, RenderError};

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

/// Transformer for code blocks and inline code spans.
#[derive(Debug)]
pub struct CodeTransformer {
    theme: &'static Theme,
}

impl CodeTransformer {
    /// Resolve the highlight theme by name. Unknown names are an error
    /// rather than a silent fallback so config typos surface immediately.
    pub fn new(theme_name: &str) -> Result<Self, RenderError> {
        let themes = theme_set();
        let theme = themes.themes.get(theme_name).ok_or_else(|| {
            let mut available: Vec<&str> =
                themes.themes.keys().map(String::as_str).collect();
            available.sort_unstable();
            RenderError::UnknownTheme {
                name: theme_name.to_string(),
                available: available.join(", "),
            }
        })?;

        Ok(Self { theme })
    }

    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        let mut result = Vec::with_capacity(events.len());
        let mut in_code_block = false;
        let mut code_lang: Option<String> = None;
        let mut code_content = String::new();

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_lang = match kind {
                        CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                        _ => None,
                    };
                    code_content.clear();
                }
                Event::Text(text) if in_code_block => {
                    code_content.push_str(&text);
                }
                Event::End(TagEnd::CodeBlock) if in_code_block => {
                    in_code_block = false;
                    let rendered = self.render_block(&code_content, code_lang.as_deref());
                    result.push(Event::Html(owned(&rendered)));
                    code_lang = None;
                }
                Event::Code(code) => {
                    result.push(Event::InlineHtml(owned(&format!(
                        r#"<code class="inline">{}</code>"#,
                        html_escape(&code)
                    ))));
                }
                other => result.push(other),
            }
        }

        result
    }

    /// Highlight a fenced block, or mark it for diagram rendering.
    ///
    /// Never fails: unknown languages auto-detect by first line, and any
    /// highlighting error falls back to an escaped plain block.
    fn render_block(&self, code: &str, lang: Option<&str>) -> String {
        if is_diagram(code) {
            return format!(r#"<div class="mermaid">{}</div>"#, html_escape(code));
        }

        let ss = syntax_set();
        let syntax = lang
            .and_then(|l| ss.find_syntax_by_token(l))
            .or_else(|| ss.find_syntax_by_first_line(code.lines().next().unwrap_or_default()))
            .unwrap_or_else(|| ss.find_syntax_plain_text());

        match highlighted_html_for_string(code, ss, syntax, self.theme) {
            Ok(html) => html,
            Err(_) => format!("<pre><code>{}</code></pre>", html_escape(code)),
        }
    }
}

/// Fence bodies in the flowchart/sequence/gantt diagram grammars are
/// rasterized by the asset pipeline instead of highlighted.
fn is_diagram(code: &str) -> bool {
    code.starts_with("graph") || code.starts_with("sequenceDiagram") || code.starts_with("gantt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{MarkdownProcessor, RenderOptions};

    fn render(markdown: &str) -> String {
        let events = MarkdownProcessor::new()
            .render(markdown, &RenderOptions::default())
            .unwrap();
        MarkdownProcessor::to_html(&events)
    }

    #[test]
    fn highlights_known_language() {
        let html = render("```rust\nfn main() {}\n```");
        assert!(html.contains("<pre"));
        assert!(html.contains("style="));
        assert!(html.contains("main"));
    }

    #[test]
    fn unknown_language_falls_back_to_plain() {
        let html = render("```nosuchlang\nplain <text>\n```");
        assert!(html.contains("plain"));
        assert!(html.contains("&lt;text&gt;"));
    }

    #[test]
    fn diagram_fences_become_mermaid_markers() {
        for source in ["graph TD;\nA-->B;", "sequenceDiagram\nA->>B: hi", "gantt\ntitle x"] {
            let html = render(&format!("```\n{source}\n```"));
            assert!(
                html.contains(r#"<div class="mermaid">"#),
                "no marker for {source:?}"
            );
        }
    }

    #[test]
    fn inline_code_gets_distinguishing_class() {
        let html = render("use `let x = 1;` here");
        assert!(html.contains(r#"<code class="inline">let x = 1;</code>"#));
    }

    #[test]
    fn theme_error_lists_available_themes() {
        let err = CodeTransformer::new("missing").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing"));
        assert!(message.contains("InspiredGitHub"));
    }
}
