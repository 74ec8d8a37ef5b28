//! Asset pipeline: diagram fences, math markers, and local images become
//! embedded media on the note.
//!
//! Runs after rendering and produces the resource list the note carries.
//! Rendered diagram and equation files are cached on disk under a
//! content-hash name; an existing file is never re-rendered.

pub mod diagram;
pub mod math;

use md5::{Digest, Md5};
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use marknote_client::Resource;

pub use diagram::render_diagrams;
pub use math::render_math;

/// Subdirectory of the notes root holding rendered diagram and equation
/// files. References produced here are relative to the notes root, like
/// every other image reference.
pub const ASSETS_SUBDIR: &str = ".assets";

pub const DEFAULT_RESOURCE_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read image {path:?}")]
    MissingImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("diagram renderer {command:?} failed on {source_path:?}: {detail}")]
    DiagramRender {
        command: String,
        source_path: PathBuf,
        detail: String,
    },

    #[error("math rendering failed for {snippet:?}: {detail}")]
    MathRender { snippet: String, detail: String },

    #[error("failed to write asset {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Workspace context the pipeline resolves against.
#[derive(Debug, Clone)]
pub struct AssetContext {
    /// Root directory all relative image references resolve against.
    pub notes_dir: PathBuf,
    /// External command used to rasterize diagram sources.
    pub mermaid_command: String,
}

impl AssetContext {
    pub fn assets_dir(&self) -> PathBuf {
        self.notes_dir.join(ASSETS_SUBDIR)
    }
}

/// Fixed extension → MIME table for embedded media.
pub fn resource_type(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        _ => DEFAULT_RESOURCE_TYPE,
    }
}

pub(crate) fn md5_hex(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

static IMG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img((?:[\s/](?:"[^"]*"|'[^']*'|[^>"'])*)?)>"#).expect("valid img regex")
});
static SRC_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s+src\s*=\s*("[^"]*"|'[^']*')"#).expect("valid src regex"));
static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").expect("valid scheme regex"));

/// Convert local images into embedded-media elements and collect their
/// bodies as resources, in document order.
///
/// Remote images (any `scheme://` src) are left untouched and contribute
/// no resource.
pub fn attach_images(
    html: &str,
    ctx: &AssetContext,
) -> Result<(String, Vec<Resource>), AssetError> {
    let mut resources = Vec::new();
    let mut output = String::with_capacity(html.len());
    let mut last = 0;

    for caps in IMG_RE.captures_iter(html) {
        let whole = caps.get(0).expect("capture group 0 always present");
        let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

        let src = match SRC_ATTR_RE.captures(attrs) {
            Some(src_caps) => unquote(&src_caps[1]).to_string(),
            None => continue,
        };
        if SCHEME_RE.is_match(&src) {
            continue;
        }

        let decoded = percent_decode_str(&src).decode_utf8_lossy();
        let path = ctx.notes_dir.join(decoded.as_ref());
        let bytes = fs::read(&path).map_err(|source| AssetError::MissingImage {
            path: path.clone(),
            source,
        })?;
        debug!(path = ?path, size = bytes.len(), "attaching image");

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let resource = Resource::new(resource_type(extension), bytes);

        let rest = SRC_ATTR_RE.replace(attrs, "");
        let rest = rest.trim_end().trim_end_matches('/').trim_end();
        output.push_str(&html[last..whole.start()]);
        output.push_str(&format!(
            r#"<en-media type="{}" hash="{}"{}/>"#,
            resource.mime, resource.body_hash, rest
        ));
        last = whole.end();

        resources.push(resource);
    }

    output.push_str(&html[last..]);
    Ok((output, resources))
}

pub(crate) fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx(dir: &TempDir) -> AssetContext {
        AssetContext {
            notes_dir: dir.path().to_path_buf(),
            mermaid_command: String::from("mmdc"),
        }
    }

    #[test]
    fn mime_table_is_fixed() {
        assert_eq!(resource_type("png"), "image/png");
        assert_eq!(resource_type("JPG"), "image/jpeg");
        assert_eq!(resource_type("jpeg"), "image/jpeg");
        assert_eq!(resource_type("gif"), "image/gif");
        assert_eq!(resource_type("webp"), DEFAULT_RESOURCE_TYPE);
        assert_eq!(resource_type(""), DEFAULT_RESOURCE_TYPE);
    }

    #[test]
    fn local_image_becomes_en_media_with_md5() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pic.png"), b"hello").unwrap();

        let html = r#"<p><img src="pic.png" alt="p"/></p>"#;
        let (out, resources) = attach_images(html, &ctx(&dir)).unwrap();

        // md5("hello"), computed independently of the pipeline.
        assert!(out.contains(
            r#"<en-media type="image/png" hash="5d41402abc4b2a76b9719d911017c592" alt="p"/>"#
        ));
        assert!(!out.contains("src="));
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].size, 5);
    }

    #[test]
    fn remote_images_are_untouched() {
        let dir = TempDir::new().unwrap();
        let html = r#"<img src="https://cdn.example.com/x.png"/>"#;
        let (out, resources) = attach_images(html, &ctx(&dir)).unwrap();

        assert_eq!(out, html);
        assert!(resources.is_empty());
    }

    #[test]
    fn percent_encoded_sources_resolve() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("my pic.png"), b"x").unwrap();

        let html = r#"<img src="my%20pic.png"/>"#;
        let (out, resources) = attach_images(html, &ctx(&dir)).unwrap();
        assert!(out.contains("<en-media"));
        assert_eq!(resources.len(), 1);
    }

    #[test]
    fn missing_image_is_a_contextual_error() {
        let dir = TempDir::new().unwrap();
        let err = attach_images(r#"<img src="nope.png"/>"#, &ctx(&dir)).unwrap_err();
        match err {
            AssetError::MissingImage { path, .. } => {
                assert!(path.ends_with("nope.png"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn resources_keep_document_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.png"), b"aaa").unwrap();
        fs::write(dir.path().join("b.gif"), b"bbb").unwrap();

        let html = r#"<img src="a.png"/><img src="b.gif"/>"#;
        let (_, resources) = attach_images(html, &ctx(&dir)).unwrap();
        assert_eq!(resources[0].mime, "image/png");
        assert_eq!(resources[1].mime, "image/gif");
    }
}
