//! `:shortcode:` emoji replacement in text runs.

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Tag, TagEnd};
use regex::Regex;

use super::owned;

static SHORTCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([a-zA-Z0-9_+-]+):").expect("valid shortcode regex"));

pub struct EmojiTransformer;

impl EmojiTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        let mut result = Vec::with_capacity(events.len());
        let mut in_code_block = false;

        for event in events {
            match &event {
                Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
                Event::End(TagEnd::CodeBlock) => in_code_block = false,
                Event::Text(text) if !in_code_block => {
                    let replaced = replace_shortcodes(text);
                    if replaced != text.as_ref() {
                        result.push(Event::Text(owned(&replaced)));
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

impl Default for EmojiTransformer {
    fn default() -> Self {
        Self::new()
    }
}

/// Known shortcodes become their emoji; unknown ones are left verbatim.
fn replace_shortcodes(text: &str) -> String {
    SHORTCODE_RE
        .replace_all(text, |caps: &regex::Captures| {
            match emojis::get_by_shortcode(&caps[1]) {
                Some(emoji) => emoji.as_str().to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_known_shortcodes() {
        assert_eq!(replace_shortcodes("ship it :tada:"), "ship it 🎉");
        assert_eq!(replace_shortcodes(":+1: looks good"), "👍 looks good");
    }

    #[test]
    fn keeps_unknown_shortcodes() {
        assert_eq!(
            replace_shortcodes("a :definitely-not-an-emoji: b"),
            "a :definitely-not-an-emoji: b"
        );
    }

    #[test]
    fn plain_colons_are_untouched() {
        assert_eq!(replace_shortcodes("time: 12:30"), "time: 12:30");
    }
}
