//! Title and notebook/tag directive extraction from the event stream.

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Tag, TagEnd};
use regex::Regex;

/// `@(Notebook)[tag|tag]` on a line of its own; the bracket group is
/// optional.
static DIRECTIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*@\((.+)\)(\[(.+)\])?\s*$").expect("valid directive regex"));

pub const UNTITLED: &str = "untitled";

/// Essential note attributes derived from the rendered token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteMetadata {
    pub title: String,
    pub notebook_name: Option<String>,
    /// `None` when no bracket group was written; callers distinguish "no
    /// tags specified" from an explicitly empty tag list.
    pub tag_names: Option<Vec<String>>,
}

/// Scan the event stream for the title and the notebook directive.
///
/// The directive line itself stays in the rendered output; only the first
/// matching line counts. Adjacent text fragments are coalesced before
/// matching, since the parser may split bracketed text into several events.
pub fn extract_metadata(events: &[Event<'_>]) -> NoteMetadata {
    let title = first_heading(events).unwrap_or_else(|| UNTITLED.to_string());

    let mut directive = None;
    let mut line = String::new();
    for event in events {
        match event {
            Event::Text(text) => line.push_str(text),
            Event::Code(code) => line.push_str(code),
            _ => {
                directive = match_directive(&line);
                line.clear();
                if directive.is_some() {
                    break;
                }
            }
        }
    }
    if directive.is_none() {
        directive = match_directive(&line);
    }

    let (notebook_name, tag_names) = directive.unwrap_or((None, None));
    NoteMetadata {
        title,
        notebook_name,
        tag_names,
    }
}

type Directive = (Option<String>, Option<Vec<String>>);

fn match_directive(line: &str) -> Option<Directive> {
    let caps = DIRECTIVE_RE.captures(line)?;

    let notebook_name = Some(caps[1].trim().to_string());
    let tag_names = caps.get(3).map(|group| {
        group
            .as_str()
            .split('|')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(String::from)
            .collect()
    });
    Some((notebook_name, tag_names))
}

fn first_heading(events: &[Event<'_>]) -> Option<String> {
    let mut current: Option<String> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { .. }) => current = Some(String::new()),
            Event::Text(text) => {
                if let Some(title) = current.as_mut() {
                    title.push_str(text);
                }
            }
            Event::Code(code) => {
                if let Some(title) = current.as_mut() {
                    title.push_str(code);
                }
            }
            Event::End(TagEnd::Heading(_)) => return current,
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{MarkdownProcessor, RenderOptions};

    fn extract(markdown: &str) -> NoteMetadata {
        let events = MarkdownProcessor::new()
            .render(markdown, &RenderOptions::default())
            .unwrap();
        extract_metadata(&events)
    }

    #[test]
    fn title_is_first_heading() {
        let meta = extract("intro\n\n# Real Title\n\n## Second");
        assert_eq!(meta.title, "Real Title");
    }

    #[test]
    fn missing_heading_yields_untitled() {
        let meta = extract("just a paragraph\n");
        assert_eq!(meta.title, UNTITLED);
    }

    #[test]
    fn directive_with_tags() {
        let meta = extract("# T\n\n@(Work)[urgent|later| spaced ]\n");
        assert_eq!(meta.notebook_name.as_deref(), Some("Work"));
        assert_eq!(
            meta.tag_names,
            Some(vec![
                "urgent".to_string(),
                "later".to_string(),
                "spaced".to_string()
            ])
        );
    }

    #[test]
    fn directive_without_tags_has_none() {
        let meta = extract("# T\n\n@(Inbox)\n");
        assert_eq!(meta.notebook_name.as_deref(), Some("Inbox"));
        assert_eq!(meta.tag_names, None);
    }

    #[test]
    fn first_directive_wins() {
        let meta = extract("# T\n\n@(First)[a]\n\n@(Second)[b]\n");
        assert_eq!(meta.notebook_name.as_deref(), Some("First"));
        assert_eq!(meta.tag_names, Some(vec!["a".to_string()]));
    }

    #[test]
    fn no_directive_means_no_notebook() {
        let meta = extract("# T\n\nemail me @ (work)\n");
        assert_eq!(meta.notebook_name, None);
        assert_eq!(meta.tag_names, None);
    }

    #[test]
    fn empty_tag_entries_are_dropped() {
        let meta = extract("# T\n\n@(Work)[a||b|]\n");
        assert_eq!(
            meta.tag_names,
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }
}
