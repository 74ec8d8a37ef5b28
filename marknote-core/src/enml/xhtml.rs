//! XHTML conformance fixups.
//!
//! The note document is parsed as XML on the service side, so HTML void
//! elements must be self-closed. Everything the renderer emits is already
//! well-formed; this pass exists for raw HTML passed through from the
//! markdown source.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static VOID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)<(area|base|br|col|embed|hr|img|input|link|meta|param|source|track|wbr|en-media|en-todo)((?:[\s/](?:"[^"]*"|'[^']*'|[^>"'])*)?)>"#,
    )
    .expect("valid void element regex")
});

/// Self-close every void element occurrence.
pub fn to_xhtml(html: &str) -> String {
    VOID_RE
        .replace_all(html, |caps: &Captures| {
            let attrs = caps[2].trim_end().trim_end_matches('/').trim_end();
            format!("<{}{}/>", &caps[1], attrs)
        })
        .into_owned()
}
