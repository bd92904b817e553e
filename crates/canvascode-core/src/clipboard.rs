//! Clipboard text protocol and paste-source parsing.
//!
//! Copying serializes the selection twice: into an in-process buffer (always
//! available) and into protocol text for the system clipboard so objects
//! survive across editor instances. Paste inspects the incoming payload in a
//! fixed priority order; the [`crate::engine::Editor`] drives the dispatch.

use crate::object::CanvasObject;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

/// Marker distinguishing protocol text from arbitrary clipboard text.
pub const PROTOCOL_PREFIX: &str = "canvas-code-pro";

/// Canvas-unit offset applied to pasted and duplicated objects so the copy
/// never lands exactly on the original.
pub const PASTE_OFFSET: f64 = 20.0;

/// Default size for pasted SVG markup that declares no usable dimensions.
pub const SVG_DEFAULT_SIZE: f64 = 200.0;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard payload is not valid protocol JSON: {0}")]
    MalformedProtocol(#[from] serde_json::Error),
    #[error("protocol object rejected: {0}")]
    InvalidObject(String),
    #[error("system clipboard unavailable: {0}")]
    System(String),
}

/// A bitmap ready to be placed on the canvas: data URI plus its already
/// fitted canvas-space size. Decoding happens upstream (render crate or
/// shell); the engine itself never touches pixel data.
#[derive(Debug, Clone, PartialEq)]
pub struct PastedImage {
    pub src: String,
    pub width: f64,
    pub height: f64,
}

/// Everything a host shell scraped off the system clipboard for one paste.
#[derive(Debug, Clone, Default)]
pub struct PastePayload {
    pub text: Option<String>,
    pub images: Vec<PastedImage>,
}

impl PastePayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            images: Vec::new(),
        }
    }

    pub fn images(images: Vec<PastedImage>) -> Self {
        Self {
            text: None,
            images,
        }
    }
}

/// Serialize objects into protocol text for the system clipboard.
pub fn protocol_text(objects: &[CanvasObject]) -> Result<String, ClipboardError> {
    let json = serde_json::to_string(objects)?;
    Ok(format!("{PROTOCOL_PREFIX}:{json}"))
}

/// Parse protocol text back into objects, validating the geometry of each.
/// Any malformed entry rejects the whole paste.
pub fn parse_protocol(text: &str) -> Result<Vec<CanvasObject>, ClipboardError> {
    let json = text
        .strip_prefix(PROTOCOL_PREFIX)
        .and_then(|rest| rest.strip_prefix(':'))
        .ok_or_else(|| ClipboardError::InvalidObject("missing protocol prefix".to_string()))?;
    let objects: Vec<CanvasObject> = serde_json::from_str(json)?;
    for obj in &objects {
        validate_geometry(obj)?;
    }
    Ok(objects)
}

fn validate_geometry(obj: &CanvasObject) -> Result<(), ClipboardError> {
    if !obj.x.is_finite() || !obj.y.is_finite() {
        return Err(ClipboardError::InvalidObject(format!(
            "object {} has non-finite position",
            obj.id
        )));
    }
    if !(obj.width.is_finite() && obj.width > 0.0)
        || !(obj.height.is_finite() && obj.height > 0.0)
    {
        return Err(ClipboardError::InvalidObject(format!(
            "object {} has invalid size",
            obj.id
        )));
    }
    Ok(())
}

/// SVG markup detected in pasted text, wrapped for placement as an image.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgPaste {
    /// Base64 `data:image/svg+xml` URI of the extracted markup.
    pub data_uri: String,
    pub width: f64,
    pub height: f64,
}

/// Extract `<svg>…</svg>` markup from pasted text, if present. Dimensions
/// come from the `width`/`height` attributes, then the `viewBox`, then
/// [`SVG_DEFAULT_SIZE`].
pub fn extract_svg(text: &str) -> Option<SvgPaste> {
    let start = text.find("<svg")?;
    let end = text[start..].find("</svg>")? + start + "</svg>".len();
    let svg = &text[start..end];
    let open_tag_end = svg.find('>')?;
    let open_tag = &svg[..open_tag_end];

    let mut width = attr_number(open_tag, "width");
    let mut height = attr_number(open_tag, "height");
    if width.is_none() || height.is_none() {
        if let Some(view_box) = attr_value(open_tag, "viewBox") {
            let parts: Vec<f64> = view_box
                .split_whitespace()
                .filter_map(|p| p.parse().ok())
                .collect();
            if parts.len() == 4 {
                width = width.or(Some(parts[2]));
                height = height.or(Some(parts[3]));
            }
        }
    }

    let width = width.filter(|w| *w > 0.0).unwrap_or(SVG_DEFAULT_SIZE);
    let height = height.filter(|h| *h > 0.0).unwrap_or(SVG_DEFAULT_SIZE);
    Some(SvgPaste {
        data_uri: format!("data:image/svg+xml;base64,{}", BASE64.encode(svg)),
        width,
        height,
    })
}

/// Pull a quoted attribute value out of an opening tag.
fn attr_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let mut search = tag;
    loop {
        let at = search.find(name)?;
        // Attribute name must not be a suffix of a longer name.
        let preceded_ok = at == 0
            || search[..at]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_whitespace());
        let rest = search[at + name.len()..].trim_start();
        if preceded_ok && rest.starts_with('=') {
            let rest = rest[1..].trim_start();
            let quote = rest.chars().next()?;
            if quote == '"' || quote == '\'' {
                let body = &rest[1..];
                let close = body.find(quote)?;
                return Some(&body[..close]);
            }
        }
        search = &search[at + name.len()..];
    }
}

fn attr_number(tag: &str, name: &str) -> Option<f64> {
    let raw = attr_value(tag, name)?;
    raw.trim_end_matches("px").trim().parse().ok()
}

/// System clipboard access behind a `Result` surface, so headless
/// environments fall back to the in-process buffer instead of failing.
#[cfg(not(target_arch = "wasm32"))]
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

#[cfg(not(target_arch = "wasm32"))]
impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        arboard::Clipboard::new()
            .map(|inner| Self { inner })
            .map_err(|e| ClipboardError::System(e.to_string()))
    }

    pub fn get_text(&mut self) -> Result<String, ClipboardError> {
        self.inner
            .get_text()
            .map_err(|e| ClipboardError::System(e.to_string()))
    }

    pub fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .set_text(text)
            .map_err(|e| ClipboardError::System(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{CanvasObject, ObjectKind};

    fn text_obj(content: &str) -> CanvasObject {
        CanvasObject::new(
            ObjectKind::Text {
                content: content.to_string(),
                font_size: 16.0,
            },
            10.0,
            20.0,
            100.0,
            30.0,
        )
    }

    #[test]
    fn test_protocol_round_trip() {
        let objects = vec![text_obj("a"), text_obj("b")];
        let text = protocol_text(&objects).unwrap();
        assert!(text.starts_with("canvas-code-pro:["));
        let back = parse_protocol(&text).unwrap();
        assert_eq!(back, objects);
    }

    #[test]
    fn test_malformed_protocol_rejected() {
        assert!(parse_protocol("canvas-code-pro:{not an array").is_err());
        assert!(parse_protocol("unrelated text").is_err());
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let mut obj = text_obj("x");
        obj.width = 0.0;
        let text = protocol_text(&[obj]).unwrap();
        assert!(matches!(
            parse_protocol(&text),
            Err(ClipboardError::InvalidObject(_))
        ));
    }

    #[test]
    fn test_svg_with_explicit_dimensions() {
        let text = r#"before <svg width="120" height="80" xmlns="http://www.w3.org/2000/svg"><rect/></svg> after"#;
        let svg = extract_svg(text).unwrap();
        assert!((svg.width - 120.0).abs() < f64::EPSILON);
        assert!((svg.height - 80.0).abs() < f64::EPSILON);
        assert!(svg.data_uri.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_svg_falls_back_to_viewbox_then_default() {
        let svg = extract_svg(r#"<svg viewBox="0 0 300 150"></svg>"#).unwrap();
        assert!((svg.width - 300.0).abs() < f64::EPSILON);
        assert!((svg.height - 150.0).abs() < f64::EPSILON);

        let svg = extract_svg("<svg><circle/></svg>").unwrap();
        assert!((svg.width - SVG_DEFAULT_SIZE).abs() < f64::EPSILON);
        assert!((svg.height - SVG_DEFAULT_SIZE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_svg_text_is_not_matched() {
        assert!(extract_svg("just some text").is_none());
    }
}
