//! CSS class flattening.
//!
//! The base theme ships as a stylesheet, but the service's markup forbids
//! `<style>` tags and class attributes. This module applies the theme's
//! rules as inline `style` attributes on the rendered markup and strips the
//! classes afterward. Pre-existing inline styles win over theme rules.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static THEME_CSS: &str = include_str!("theme.css");

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid comment regex"));
static BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)([^{}]+)\{([^{}]*)\}").expect("valid block regex"));

static OPEN_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<([a-zA-Z][a-zA-Z0-9-]*)((?:"[^"]*"|'[^']*'|[^>"'])*)>"#)
        .expect("valid open tag regex")
});
static CLASS_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s+class\s*=\s*("[^"]*"|'[^']*')"#).expect("valid class regex"));
static STYLE_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s+style\s*=\s*("[^"]*"|'[^']*')"#).expect("valid style regex"));

#[derive(Debug, Clone)]
struct Rule {
    tag: Option<String>,
    class: Option<String>,
    declarations: String,
}

#[derive(Debug, Default)]
struct Stylesheet {
    rules: Vec<Rule>,
}

impl Stylesheet {
    fn parse(css: &str) -> Self {
        let css = COMMENT_RE.replace_all(css, "");

        let mut rules = Vec::new();
        for block in BLOCK_RE.captures_iter(&css) {
            let declarations = normalize_declarations(&block[2]);
            if declarations.is_empty() {
                continue;
            }

            for selector in block[1].split(',') {
                if let Some((tag, class)) = parse_selector(selector.trim()) {
                    rules.push(Rule {
                        tag,
                        class,
                        declarations: declarations.clone(),
                    });
                }
            }
        }

        Self { rules }
    }

    /// Declarations applying to an element, tag rules before class rules so
    /// class styling overrides.
    fn declarations_for(&self, tag: &str, classes: &[&str]) -> String {
        let mut out = String::new();
        for rule in &self.rules {
            if rule.class.is_none() && rule.tag.as_deref() == Some(tag) {
                push_declarations(&mut out, &rule.declarations);
            }
        }
        for rule in &self.rules {
            if let Some(class) = rule.class.as_deref() {
                let tag_matches = rule.tag.as_deref().map_or(true, |t| t == tag);
                if tag_matches && classes.contains(&class) {
                    push_declarations(&mut out, &rule.declarations);
                }
            }
        }
        out
    }
}

/// Supported selector forms: `tag`, `.class`, `tag.class`.
fn parse_selector(selector: &str) -> Option<(Option<String>, Option<String>)> {
    if selector.is_empty() || selector.contains(char::is_whitespace) {
        return None;
    }

    match selector.split_once('.') {
        Some(("", class)) => Some((None, Some(class.to_string()))),
        Some((tag, class)) => Some((Some(tag.to_string()), Some(class.to_string()))),
        None => Some((Some(selector.to_string()), None)),
    }
}

fn normalize_declarations(body: &str) -> String {
    let mut out = String::new();
    for declaration in body.split(';') {
        let declaration: String = declaration.split_whitespace().collect::<Vec<_>>().join(" ");
        if !declaration.is_empty() {
            push_declarations(&mut out, &declaration);
        }
    }
    out
}

fn push_declarations(out: &mut String, declarations: &str) {
    if !out.is_empty() && !out.ends_with(';') {
        out.push(';');
    }
    out.push_str(declarations);
}

fn stylesheet() -> &'static Stylesheet {
    static SHEET: Lazy<Stylesheet> = Lazy::new(|| Stylesheet::parse(THEME_CSS));
    &SHEET
}

/// Apply the base theme to rendered body markup.
///
/// Wraps the body in the theme shell, inlines every matching rule, strips
/// class attributes, and removes the inline style from `en-todo` elements
/// (the service applies its own fixed checkbox styling; a leftover style
/// renders a doubled border).
pub fn apply_theme(body: &str) -> String {
    let wrapped = format!(r#"<div class="markdown-body">{body}</div>"#);
    let styled = inline_rules(&wrapped, stylesheet());
    strip_todo_styles(&strip_classes(&styled))
}

fn inline_rules(html: &str, sheet: &Stylesheet) -> String {
    OPEN_TAG_RE
        .replace_all(html, |caps: &Captures| {
            let tag = caps[1].to_lowercase();
            let attrs = &caps[2];

            let class_value = CLASS_ATTR_RE
                .captures(attrs)
                .map(|c| unquote(&c[1]).to_string())
                .unwrap_or_default();
            let classes: Vec<&str> = class_value.split_whitespace().collect();

            let theme_style = sheet.declarations_for(&tag, &classes);
            let existing_style = STYLE_ATTR_RE
                .captures(attrs)
                .map(|c| unquote(&c[1]).to_string())
                .unwrap_or_default();

            if theme_style.is_empty() && existing_style.is_empty() {
                return caps[0].to_string();
            }

            let mut style = theme_style;
            if !existing_style.is_empty() {
                push_declarations(&mut style, &existing_style);
            }

            let self_closing = attrs.trim_end().ends_with('/');
            let attrs = STYLE_ATTR_RE.replace_all(attrs, "");
            let attrs = attrs.trim_end().trim_end_matches('/').trim_end();
            let suffix = if self_closing { "/" } else { "" };
            format!(r#"<{}{} style="{}"{}>"#, &caps[1], attrs, style, suffix)
        })
        .into_owned()
}

fn strip_classes(html: &str) -> String {
    CLASS_ATTR_RE.replace_all(html, "").into_owned()
}

fn strip_todo_styles(html: &str) -> String {
    static TODO_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"<en-todo((?:[^>])*)>").expect("valid todo regex"));

    TODO_RE
        .replace_all(html, |caps: &Captures| {
            let attrs = STYLE_ATTR_RE.replace_all(&caps[1], "");
            format!("<en-todo{}>", attrs)
        })
        .into_owned()
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}
