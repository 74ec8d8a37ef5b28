//! External diagram rasterization.
//!
//! Mermaid-style fences are rendered by an external command (configurable,
//! `mmdc` by default) into PNG files named by the source's content hash.
//! Renderer failures are fatal to the publish; the error keeps the written
//! source file so the input can be inspected.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use super::{md5_hex, AssetContext, AssetError, ASSETS_SUBDIR};
use crate::enml::unescape_entities;

static DIAGRAM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div class="mermaid">(.*?)</div>"#).expect("valid diagram regex")
});

/// Replace every diagram marker with a rendered image reference.
pub async fn render_diagrams(html: &str, ctx: &AssetContext) -> Result<String, AssetError> {
    if !DIAGRAM_RE.is_match(html) {
        return Ok(html.to_string());
    }

    let assets_dir = ctx.assets_dir();
    let mut output = String::with_capacity(html.len());
    let mut last = 0;

    for caps in DIAGRAM_RE.captures_iter(html) {
        let whole = caps.get(0).expect("capture group 0 always present");
        let source = unescape_entities(caps[1].trim());

        let hash = md5_hex(source.as_bytes());
        let file_name = format!("{hash}.png");
        let target = assets_dir.join(&file_name);

        if !target.exists() {
            rasterize(&source, &assets_dir, &hash, &target, ctx).await?;
        } else {
            debug!(path = ?target, "diagram already rendered");
        }

        output.push_str(&html[last..whole.start()]);
        output.push_str(&format!(
            r#"<img src="{ASSETS_SUBDIR}/{file_name}" alt="diagram"/>"#
        ));
        last = whole.end();
    }

    output.push_str(&html[last..]);
    Ok(output)
}

async fn rasterize(
    source: &str,
    assets_dir: &Path,
    hash: &str,
    target: &Path,
    ctx: &AssetContext,
) -> Result<(), AssetError> {
    tokio::fs::create_dir_all(assets_dir)
        .await
        .map_err(|source| AssetError::Io {
            path: assets_dir.to_path_buf(),
            source,
        })?;

    let source_path = assets_dir.join(format!("{hash}.mmd"));
    tokio::fs::write(&source_path, source)
        .await
        .map_err(|source| AssetError::Io {
            path: source_path.clone(),
            source,
        })?;

    debug!(command = %ctx.mermaid_command, input = ?source_path, "rendering diagram");
    let result = Command::new(&ctx.mermaid_command)
        .arg("-i")
        .arg(&source_path)
        .arg("-o")
        .arg(target)
        .output()
        .await
        .map_err(|err| AssetError::DiagramRender {
            command: ctx.mermaid_command.clone(),
            source_path: source_path.clone(),
            detail: err.to_string(),
        })?;

    if !result.status.success() {
        return Err(AssetError::DiagramRender {
            command: ctx.mermaid_command.clone(),
            source_path,
            detail: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn ctx(dir: &TempDir) -> AssetContext {
        AssetContext {
            notes_dir: dir.path().to_path_buf(),
            mermaid_command: String::from("mmdc"),
        }
    }

    #[tokio::test]
    async fn html_without_diagrams_is_untouched() {
        let dir = TempDir::new().unwrap();
        let html = "<p>no diagrams here</p>";
        assert_eq!(render_diagrams(html, &ctx(&dir)).await.unwrap(), html);
    }

    #[tokio::test]
    async fn prerendered_diagram_is_reused() {
        let dir = TempDir::new().unwrap();
        let source = "graph TD;\nA-->B;";
        let hash = md5_hex(source.as_bytes());

        let assets = dir.path().join(ASSETS_SUBDIR);
        fs::create_dir_all(&assets).unwrap();
        fs::write(assets.join(format!("{hash}.png")), b"png-bytes").unwrap();

        let html = format!(
            r#"<div class="mermaid">{}</div>"#,
            crate::markdown::html_escape(source)
        );
        let out = render_diagrams(&html, &ctx(&dir)).await.unwrap();

        assert!(out.contains(&format!(r#"<img src="{ASSETS_SUBDIR}/{hash}.png""#)));
        assert!(!out.contains("mermaid"));
    }

    #[tokio::test]
    async fn missing_renderer_is_fatal() {
        let dir = TempDir::new().unwrap();
        let context = AssetContext {
            notes_dir: dir.path().to_path_buf(),
            mermaid_command: String::from("definitely-not-a-real-renderer"),
        };

        let html = r#"<div class="mermaid">graph TD;</div>"#;
        let err = render_diagrams(html, &context).await.unwrap_err();
        assert!(matches!(err, AssetError::DiagramRender { .. }));
    }
}
