//! Headless compositing of object subsets into a single PNG.
//!
//! Objects are drawn into an SVG intermediate representation and rasterized
//! with the resvg/tiny-skia pipeline, so the output is deterministic for
//! identical input and needs no GPU or window.

use std::fmt::Write;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use canvascode_core::object::{CanvasObject, ObjectId, ObjectKind};
use canvascode_core::scene::SceneStore;
use kurbo::{Point, Rect};

use crate::error::{RenderError, RenderResult};

/// Canvas units of whitespace added around the composited objects.
pub const COMPOSITE_PADDING: f64 = 40.0;

/// Fill used when an image source cannot be resolved to decodable pixels.
const PLACEHOLDER_FILL: &str = "#cccccc";

/// Configuration for compositing.
#[derive(Debug, Clone)]
pub struct CompositeConfig {
    /// Background color as RGBA bytes.
    pub background: [u8; 4],
    /// Raster scale factor (e.g. 2.0 for retina output).
    pub scale: f32,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            background: [255, 255, 255, 255],
            scale: 1.0,
        }
    }
}

/// Composite the listed objects into encoded PNG bytes.
///
/// Groups among `ids` are expanded to their live members. The output covers
/// the union of the resolved objects' boxes plus [`COMPOSITE_PADDING`] on
/// each side; objects paint in ascending z exactly as on the canvas.
///
/// # Errors
///
/// Returns [`RenderError::EmptySelection`] when nothing paintable resolves,
/// or an encoding error from the raster pipeline.
pub fn compose(
    store: &SceneStore,
    ids: &[ObjectId],
    config: &CompositeConfig,
) -> RenderResult<Vec<u8>> {
    let svg = compose_svg(store, ids, config)?;
    let pixmap = rasterize_svg(&svg)?;
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
}

/// Build the SVG intermediate for the listed objects.
pub fn compose_svg(
    store: &SceneStore,
    ids: &[ObjectId],
    config: &CompositeConfig,
) -> RenderResult<String> {
    let resolved = resolve_ids(store, ids);
    let bounds = resolved
        .iter()
        .filter_map(|id| store.get(id))
        .map(CanvasObject::bounds)
        .reduce(|a, b| a.union(b))
        .ok_or(RenderError::EmptySelection)?
        .inflate(COMPOSITE_PADDING, COMPOSITE_PADDING);

    let view_w = bounds.width().max(1.0);
    let view_h = bounds.height().max(1.0);
    let out_w = (view_w * f64::from(config.scale)).round().max(1.0);
    let out_h = (view_h * f64::from(config.scale)).round().max(1.0);

    let mut svg = String::with_capacity(4096);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {view_w} {view_h}\">",
    );

    let bg = &config.background;
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"rgba({},{},{},{})\"/>",
        bg[0],
        bg[1],
        bg[2],
        f32::from(bg[3]) / 255.0,
    );

    // Paint in canvas stacking order, shifted so the padded box's top-left
    // is the raster origin.
    let origin = bounds.origin();
    let mut clip_seq = 0usize;
    for obj in store.objects_by_z() {
        if resolved.contains(&obj.id) {
            render_object_svg(&mut svg, obj, origin, &mut clip_seq);
        }
    }

    svg.push_str("</svg>");
    Ok(svg)
}

/// Expand group ids to their live members, deduplicated, groups dropped.
fn resolve_ids(store: &SceneStore, ids: &[ObjectId]) -> Vec<ObjectId> {
    let mut resolved = Vec::new();
    for id in ids {
        let Some(obj) = store.get(id) else {
            continue;
        };
        if obj.is_group() {
            for member in store.members_of(id) {
                if !resolved.contains(&member) {
                    resolved.push(member);
                }
            }
        } else if !resolved.contains(id) {
            resolved.push(id.clone());
        }
    }
    resolved
}

fn render_object_svg(svg: &mut String, obj: &CanvasObject, origin: Point, clip_seq: &mut usize) {
    let b = obj.bounds();
    let (x, y) = (b.x0 - origin.x, b.y0 - origin.y);
    let (w, h) = (obj.width, obj.height);

    match &obj.kind {
        ObjectKind::Image { src, image_state } => {
            let Some(href) = validated_image_href(src) else {
                log::warn!(
                    "compositor: object {} has no decodable image source, painting placeholder",
                    obj.id
                );
                let _ = write!(
                    svg,
                    "<rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" fill=\"{PLACEHOLDER_FILL}\"/>",
                );
                return;
            };
            let escaped_src = escape_xml(href);
            match image_state {
                Some(state) => {
                    // Honor the crop window: the bitmap keeps its scaled
                    // size and the container box clips it.
                    *clip_seq += 1;
                    let clip_id = format!("clip{clip_seq}");
                    let ix = x + state.offset_x;
                    let iy = y + state.offset_y;
                    let iw = state.display_width();
                    let ih = state.display_height();
                    let _ = write!(
                        svg,
                        "<clipPath id=\"{clip_id}\"><rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\"/></clipPath>\
                         <image x=\"{ix}\" y=\"{iy}\" width=\"{iw}\" height=\"{ih}\" preserveAspectRatio=\"none\" clip-path=\"url(#{clip_id})\" href=\"{escaped_src}\"/>",
                    );
                }
                None => {
                    let _ = write!(
                        svg,
                        "<image x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"none\" href=\"{escaped_src}\"/>",
                    );
                }
            }
        }

        ObjectKind::Text { content, font_size } => {
            let escaped = escape_xml(content);
            let cx = x + w / 2.0;
            // Approximate vertical centering without relying on
            // dominant-baseline support.
            let ty = y + h / 2.0 + font_size * 0.35;
            let _ = write!(
                svg,
                "<text x=\"{cx}\" y=\"{ty}\" font-size=\"{font_size}\" fill=\"#000000\" text-anchor=\"middle\" font-family=\"sans-serif\">{escaped}</text>",
            );
        }

        ObjectKind::Rectangle { background_color } => {
            let fill = escape_xml(background_color.as_deref().unwrap_or("#ffffff"));
            let _ = write!(
                svg,
                "<rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" fill=\"{fill}\"/>",
            );
        }

        ObjectKind::Layout { background_color } => {
            let fill = escape_xml(background_color.as_deref().unwrap_or("#ffffff"));
            let _ = write!(
                svg,
                "<rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" fill=\"{fill}\" stroke=\"#e0e0e0\" stroke-width=\"1\"/>",
            );
        }

        // Group objects are containers only.
        ObjectKind::Group => {}
    }
}

/// Accept a source only if it will actually paint: a base64 data URI that is
/// either SVG markup or decodable raster bytes. Remote URLs are rejected,
/// compositing never touches the network.
fn validated_image_href(src: &str) -> Option<&str> {
    let rest = src.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    if mime == "image/svg+xml" {
        return Some(src);
    }
    let bytes = BASE64.decode(payload).ok()?;
    image::load_from_memory(&bytes).ok()?;
    Some(src)
}

/// Rasterize an SVG string to a tiny-skia Pixmap.
fn rasterize_svg(svg: &str) -> RenderResult<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree =
        usvg::Tree::from_str(svg, &opt).map_err(|e| RenderError::Svg(e.to_string()))?;

    let px_w = tree.size().width() as u32;
    let px_h = tree.size().height() as u32;
    let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
        .ok_or_else(|| RenderError::Encode("failed to allocate pixmap".to_string()))?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Composited output size for a given bounds, exposed for shells that need
/// to pre-allocate.
pub fn output_size(bounds: Rect, scale: f32) -> (u32, u32) {
    let padded = bounds.inflate(COMPOSITE_PADDING, COMPOSITE_PADDING);
    let w = (padded.width().max(1.0) * f64::from(scale)).round() as u32;
    let h = (padded.height().max(1.0) * f64::from(scale)).round() as u32;
    (w.max(1), h.max(1))
}
