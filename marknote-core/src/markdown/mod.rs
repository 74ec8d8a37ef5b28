//! Markdown processing pipeline with the note-service extensions.
//!
//! Rendering is a pure transformation: parse into pulldown-cmark events,
//! then run a chain of transformers over the event vec. Nothing here
//! touches the filesystem or the network; diagram and math markers are
//! resolved later by the asset pipeline.

pub mod autolink;
pub mod emoji;
pub mod highlight;
pub mod todo;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag};
use thiserror::Error;

pub use autolink::AutolinkTransformer;
pub use emoji::EmojiTransformer;
pub use highlight::CodeTransformer;
pub use todo::TodoTransformer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown highlight theme {name:?} (available: {available})")]
    UnknownTheme { name: String, available: String },
}

/// Options for one render pass.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Highlight theme name, resolved against syntect's default theme set.
    pub highlight_theme: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            highlight_theme: String::from("InspiredGitHub"),
        }
    }
}

/// Markdown processor producing the transformed event stream.
pub struct MarkdownProcessor {
    options: Options,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_SUPERSCRIPT);
        options.insert(Options::ENABLE_SUBSCRIPT);
        options.insert(Options::ENABLE_MATH);

        Self { options }
    }

    /// Parse and transform markdown into the final event stream.
    ///
    /// Deterministic for a given options value: identical input yields an
    /// identical event vec.
    pub fn render(
        &self,
        markdown: &str,
        opts: &RenderOptions,
    ) -> Result<Vec<Event<'static>>, RenderError> {
        let code = CodeTransformer::new(&opts.highlight_theme)?;

        let events: Vec<Event<'static>> = Parser::new_ext(markdown, self.options)
            .map(event_into_static)
            .collect();

        let events = EmojiTransformer::new().transform(events);
        let events = AutolinkTransformer::new().transform(events);
        let events = TodoTransformer::new().transform(events);
        let events = mark_math(events);
        let events = code.transform(events);

        Ok(events)
    }

    /// Serialize an event stream to HTML.
    pub fn to_html(events: &[Event<'static>]) -> String {
        let mut output = String::new();
        html::push_html(&mut output, events.iter().cloned());
        output
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace math events with marker elements carrying the escaped source.
/// The asset pipeline turns these into rendered image references.
fn mark_math(events: Vec<Event<'static>>) -> Vec<Event<'static>> {
    events
        .into_iter()
        .map(|event| match event {
            Event::InlineMath(math) => Event::InlineHtml(owned(&format!(
                r#"<span class="math-inline">{}</span>"#,
                html_escape(&math)
            ))),
            Event::DisplayMath(math) => Event::Html(owned(&format!(
                r#"<div class="math-display">{}</div>"#,
                html_escape(&math)
            ))),
            other => other,
        })
        .collect()
}

pub(crate) fn owned(s: &str) -> CowStr<'static> {
    CowStr::Boxed(s.to_string().into_boxed_str())
}

pub(crate) fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub(crate) fn event_into_static(event: Event<'_>) -> Event<'static> {
    match event {
        Event::Start(tag) => Event::Start(tag_into_static(tag)),
        Event::End(tag) => Event::End(tag),
        Event::Text(text) => Event::Text(owned(&text)),
        Event::Code(code) => Event::Code(owned(&code)),
        Event::Html(html) => Event::Html(owned(&html)),
        Event::InlineHtml(html) => Event::InlineHtml(owned(&html)),
        Event::FootnoteReference(r) => Event::FootnoteReference(owned(&r)),
        Event::SoftBreak => Event::SoftBreak,
        Event::HardBreak => Event::HardBreak,
        Event::Rule => Event::Rule,
        Event::TaskListMarker(checked) => Event::TaskListMarker(checked),
        Event::InlineMath(math) => Event::InlineMath(owned(&math)),
        Event::DisplayMath(math) => Event::DisplayMath(owned(&math)),
    }
}

fn tag_into_static(tag: Tag<'_>) -> Tag<'static> {
    match tag {
        Tag::Paragraph => Tag::Paragraph,
        Tag::Heading {
            level,
            id,
            classes,
            attrs,
        } => Tag::Heading {
            level,
            id: id.map(|s| owned(&s)),
            classes: classes.into_iter().map(|s| owned(&s)).collect(),
            attrs: attrs
                .into_iter()
                .map(|(k, v)| (owned(&k), v.map(|s| owned(&s))))
                .collect(),
        },
        Tag::BlockQuote(kind) => Tag::BlockQuote(kind),
        Tag::CodeBlock(kind) => Tag::CodeBlock(match kind {
            CodeBlockKind::Indented => CodeBlockKind::Indented,
            CodeBlockKind::Fenced(lang) => CodeBlockKind::Fenced(owned(&lang)),
        }),
        Tag::HtmlBlock => Tag::HtmlBlock,
        Tag::List(start) => Tag::List(start),
        Tag::Item => Tag::Item,
        Tag::FootnoteDefinition(label) => Tag::FootnoteDefinition(owned(&label)),
        Tag::Table(alignments) => Tag::Table(alignments),
        Tag::TableHead => Tag::TableHead,
        Tag::TableRow => Tag::TableRow,
        Tag::TableCell => Tag::TableCell,
        Tag::Emphasis => Tag::Emphasis,
        Tag::Strong => Tag::Strong,
        Tag::Strikethrough => Tag::Strikethrough,
        Tag::Superscript => Tag::Superscript,
        Tag::Subscript => Tag::Subscript,
        Tag::DefinitionList => Tag::DefinitionList,
        Tag::DefinitionListTitle => Tag::DefinitionListTitle,
        Tag::DefinitionListDefinition => Tag::DefinitionListDefinition,
        Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        } => Tag::Link {
            link_type,
            dest_url: owned(&dest_url),
            title: owned(&title),
            id: owned(&id),
        },
        Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        } => Tag::Image {
            link_type,
            dest_url: owned(&dest_url),
            title: owned(&title),
            id: owned(&id),
        },
        Tag::MetadataBlock(kind) => Tag::MetadataBlock(kind),
    }
}
