//! Equation rendering via typst.
//!
//! Math markers left by the renderer are compiled to standalone SVG files
//! under the assets directory and replaced with sized image references.
//! Unlike code highlighting, a failed compile here is fatal to the publish:
//! silently shipping the raw source would corrupt the note body.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use typst::layout::{Abs, PagedDocument};
use typst_as_lib::TypstEngine;

use super::{md5_hex, AssetContext, AssetError, ASSETS_SUBDIR};
use crate::enml::unescape_entities;

/// Pixel size of one typst point in generated image references.
const PX_PER_PT: f64 = 96.0 / 72.0;

static FONTS: Lazy<Vec<&'static [u8]>> = Lazy::new(|| typst_assets::fonts().collect());

static MATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<(?:span|div) class="math-(inline|display)">(.*?)</(?:span|div)>"#)
        .expect("valid math marker regex")
});

static SVG_SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"width="([0-9.]+)pt" height="([0-9.]+)pt""#).expect("valid svg size regex")
});

/// Replace math markers with rendered equation image references.
pub fn render_math(html: &str, ctx: &AssetContext) -> Result<String, AssetError> {
    if !MATH_RE.is_match(html) {
        return Ok(html.to_string());
    }

    let assets_dir = ctx.assets_dir();
    let mut output = String::with_capacity(html.len());
    let mut last = 0;

    for caps in MATH_RE.captures_iter(html) {
        let whole = caps.get(0).expect("capture group 0 always present");
        let display = &caps[1] == "display";
        let source = unescape_entities(caps[2].trim());

        let hash = md5_hex(format!("{}:{source}", &caps[1]).as_bytes());
        let file_name = format!("{hash}.svg");
        let target = assets_dir.join(&file_name);

        let (width, height) = match rendered_size(&target) {
            Some(size) => {
                debug!(path = ?target, "equation already rendered");
                size
            }
            None => {
                let (svg, size) = compile(&source, display)?;
                fs::create_dir_all(&assets_dir).map_err(|source| AssetError::Io {
                    path: assets_dir.clone(),
                    source,
                })?;
                fs::write(&target, &svg).map_err(|source| AssetError::Io {
                    path: target.clone(),
                    source,
                })?;
                size
            }
        };

        let reference = format!(
            r#"<img src="{ASSETS_SUBDIR}/{file_name}" alt="equation" width="{width}" height="{height}"/>"#
        );
        output.push_str(&html[last..whole.start()]);
        if display {
            output.push_str(&format!("<div>{reference}</div>"));
        } else {
            output.push_str(&reference);
        }
        last = whole.end();
    }

    output.push_str(&html[last..]);
    Ok(output)
}

/// Pixel dimensions of an already-rendered equation file, if it exists and
/// still carries the size attributes the compiler wrote.
fn rendered_size(target: &Path) -> Option<(u32, u32)> {
    let svg = fs::read_to_string(target).ok()?;
    let caps = SVG_SIZE_RE.captures(&svg)?;
    let width: f64 = caps[1].parse().ok()?;
    let height: f64 = caps[2].parse().ok()?;
    Some(scale(width, height))
}

fn compile(source: &str, display: bool) -> Result<(String, (u32, u32)), AssetError> {
    let engine = TypstEngine::builder()
        .main_file(template(source, display))
        .fonts(FONTS.iter().copied())
        .build();

    let compiled = engine.compile::<PagedDocument>();
    for warning in &compiled.warnings {
        warn!("typst warning: {warning:?}");
    }

    let doc = compiled.output.map_err(|err| AssetError::MathRender {
        snippet: snippet(source),
        detail: err.to_string(),
    })?;

    let page = doc.pages.first().ok_or_else(|| AssetError::MathRender {
        snippet: snippet(source),
        detail: String::from("compilation produced no pages"),
    })?;
    let size = page.frame.size();
    let dimensions = scale(size.x.to_pt(), size.y.to_pt());

    let svg = typst_svg::svg_merged(&doc, Abs::pt(0.5));
    Ok((svg, dimensions))
}

fn template(math: &str, display: bool) -> String {
    let body = if display {
        format!("$ {math} $")
    } else {
        format!("${math}$")
    };
    format!(
        r#"
#set page(width: auto, height: auto, margin: 0pt, fill: none)
#set text(size: 14pt, fill: black)
#set math.equation(numbering: none)

{body}
"#
    )
}

fn scale(width_pt: f64, height_pt: f64) -> (u32, u32) {
    let width = (width_pt * PX_PER_PT).ceil() as u32;
    let height = (height_pt * PX_PER_PT).ceil() as u32;
    (width.max(1), height.max(1))
}

fn snippet(source: &str) -> String {
    source.chars().take(80).collect()
}
