//! Bare-URL autolinking.
//!
//! pulldown-cmark has no linkify option, so URL-like text outside code and
//! existing links is split into link events here.

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, LinkType, Tag, TagEnd};
use regex::Regex;

use super::owned;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s<>]+").expect("valid url regex"));

/// Characters a URL match never ends with; sentence punctuation after a
/// bare link belongs to the prose.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

pub struct AutolinkTransformer;

impl AutolinkTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        let mut result = Vec::with_capacity(events.len());
        let mut in_code_block = false;
        let mut in_link = false;

        for event in events {
            match &event {
                Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
                Event::End(TagEnd::CodeBlock) => in_code_block = false,
                Event::Start(Tag::Link { .. }) => in_link = true,
                Event::End(TagEnd::Link) => in_link = false,
                Event::Text(text) if !in_code_block && !in_link => {
                    if URL_RE.is_match(text) {
                        let text = text.to_string();
                        split_links(&text, &mut result);
                        continue;
                    }
                }
                _ => {}
            }
            result.push(event);
        }

        result
    }
}

impl Default for AutolinkTransformer {
    fn default() -> Self {
        Self::new()
    }
}

fn split_links(text: &str, out: &mut Vec<Event<'static>>) {
    let mut last = 0;
    for m in URL_RE.find_iter(text) {
        let url = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        if url.is_empty() {
            continue;
        }

        if m.start() > last {
            out.push(Event::Text(owned(&text[last..m.start()])));
        }

        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: owned(url),
            title: owned(""),
            id: owned(""),
        }));
        out.push(Event::Text(owned(url)));
        out.push(Event::End(TagEnd::Link));

        last = m.start() + url.len();
    }

    if last < text.len() {
        out.push(Event::Text(owned(&text[last..])));
    }
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
    fn links_bare_urls() {
        let html = render("see https://example.com/a for details");
        assert!(html.contains(r#"<a href="https://example.com/a">https://example.com/a</a>"#));
    }

    #[test]
    fn trims_sentence_punctuation() {
        let html = render("read https://example.com/a.");
        assert!(html.contains(r#"href="https://example.com/a""#));
        assert!(html.contains("</a>."));
    }

    #[test]
    fn skips_code() {
        let html = render("`https://example.com` and\n\n```\nhttps://example.com\n```");
        assert!(!html.contains("<a href"));
    }

    #[test]
    fn skips_existing_links() {
        let html = render("[here](https://example.com)");
        assert_eq!(html.matches("<a href").count(), 1);
    }
}
