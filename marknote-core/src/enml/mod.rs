//! Final markup assembly for the note service.
//!
//! The service's body format is XML, not HTML: a fixed declaration and
//! doctype around a single `<en-note>` root, inline styles only, no
//! `<style>` tags or class selectors, and strictly self-closed void
//! elements.

pub mod inline;
pub mod xhtml;

pub use inline::apply_theme;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
pub const DOCTYPE: &str =
    r#"<!DOCTYPE en-note SYSTEM "http://xml.evernote.com/pub/enml2.dtd">"#;

/// Wrap an inlined body into the complete note document.
pub fn wrap_document(body: &str) -> String {
    let body = xhtml::to_xhtml(body);
    format!("{XML_DECLARATION}{DOCTYPE}<en-note>{body}</en-note>")
}

/// Reverse the HTML escaping applied when marker elements were emitted.
pub(crate) fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
