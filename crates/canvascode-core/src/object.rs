//! Canvas object model.
//!
//! `CanvasObject` is the only persisted entity. Geometry is stored in canvas
//! space with `x`/`y` at the object's **center**; serialized field names are
//! camelCase so the clipboard text protocol and the editable-layer contract
//! share one wire shape.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Unique identifier for canvas objects.
///
/// Opaque string, stable for the object's lifetime. Built from a
/// monotonically-increasing millisecond timestamp plus a random suffix so
/// bulk creation (paste, editable-layer splice) never collides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        static LAST_MILLIS: AtomicU64 = AtomicU64::new(0);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        // Keep the timestamp part strictly increasing even when several ids
        // are minted within one millisecond.
        let millis = LAST_MILLIS
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
                Some(if now > last { now } else { last + 1 })
            })
            .map(|last| if now > last { now } else { last + 1 })
            .unwrap_or(now);

        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{millis}-{}", &suffix[..6]))
    }

    /// Borrow the raw string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Bitmap placement relative to its container box.
///
/// The displayed bitmap size is `original_width * scale` by
/// `original_height * scale`; `offset_x`/`offset_y` position the bitmap's
/// top-left relative to the container's top-left. Cropping (edge drag)
/// changes the container and the offsets but never `scale`; corner scaling
/// changes `scale` and the container together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageState {
    pub original_width: f64,
    pub original_height: f64,
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ImageState {
    /// State for a freshly ingested image: the fitted size becomes the
    /// native size, so the displayed size equals the fitted size.
    pub fn fitted(width: f64, height: f64) -> Self {
        Self {
            original_width: width,
            original_height: height,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Displayed bitmap width in canvas units.
    pub fn display_width(&self) -> f64 {
        self.original_width * self.scale
    }

    /// Displayed bitmap height in canvas units.
    pub fn display_height(&self) -> f64 {
        self.original_height * self.scale
    }
}

fn default_font_size() -> f64 {
    16.0
}

/// Type payload of a canvas object. Serialized under the `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectKind {
    #[serde(rename_all = "camelCase")]
    Image {
        /// Data URI or URL of the bitmap.
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_state: Option<ImageState>,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        content: String,
        #[serde(default = "default_font_size")]
        font_size: f64,
    },
    #[serde(rename_all = "camelCase")]
    Rectangle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        background_color: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Layout {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        background_color: Option<String>,
    },
    Group,
}

impl ObjectKind {
    /// User-facing type label, also the default object name.
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectKind::Image { .. } => "Image",
            ObjectKind::Text { .. } => "Text",
            ObjectKind::Rectangle { .. } => "Rectangle",
            ObjectKind::Layout { .. } => "Layout",
            ObjectKind::Group => "Group",
        }
    }
}

/// A single object on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasObject {
    pub id: ObjectId,
    #[serde(flatten)]
    pub kind: ObjectKind,
    /// User-facing label, independent of `id`.
    #[serde(default)]
    pub name: String,
    /// Canvas-space center.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Stacking order; not necessarily contiguous, ties break by array position.
    #[serde(default)]
    pub z_index: i64,
    /// Membership back-reference to a group object. Never ownership: a
    /// member stays independently addressable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<ObjectId>,
}

impl CanvasObject {
    /// Create an object with a fresh id and a default name.
    pub fn new(kind: ObjectKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        let name = kind.type_name().to_string();
        Self {
            id: ObjectId::generate(),
            kind,
            name,
            x,
            y,
            width,
            height,
            z_index: 0,
            group_id: None,
        }
    }

    /// Bounding box in canvas space.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x - self.width / 2.0,
            self.y - self.height / 2.0,
            self.x + self.width / 2.0,
            self.y + self.height / 2.0,
        )
    }

    /// Point-in-box test in canvas space.
    pub fn contains(&self, point: Point) -> bool {
        self.bounds().contains(point)
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ObjectKind::Group)
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, ObjectKind::Image { .. })
    }

    /// Bitmap source if this object is an image.
    pub fn image_src(&self) -> Option<&str> {
        match &self.kind {
            ObjectKind::Image { src, .. } => Some(src),
            _ => None,
        }
    }

    pub fn image_state(&self) -> Option<&ImageState> {
        match &self.kind {
            ObjectKind::Image { image_state, .. } => image_state.as_ref(),
            _ => None,
        }
    }

    pub fn image_state_mut(&mut self) -> Option<&mut ImageState> {
        match &mut self.kind {
            ObjectKind::Image { image_state, .. } => image_state.as_mut(),
            _ => None,
        }
    }

    /// Fill color for rectangle/layout objects.
    pub fn background_color(&self) -> Option<&str> {
        match &self.kind {
            ObjectKind::Rectangle { background_color }
            | ObjectKind::Layout { background_color } => background_color.as_deref(),
            _ => None,
        }
    }

    /// Move by a canvas-space delta.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Assign a new unique id, used when duplicating or pasting.
    pub fn regenerate_id(&mut self) {
        self.id = ObjectId::generate();
    }
}

/// Input to [`crate::scene::SceneStore::create`]: everything except the
/// fields the store assigns (id, z-index).
#[derive(Debug, Clone)]
pub struct ObjectDraft {
    pub kind: ObjectKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub name: Option<String>,
}

impl ObjectDraft {
    pub fn new(kind: ObjectKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            kind,
            x,
            y,
            width,
            height,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_uniqueness_in_bulk() {
        let ids: Vec<ObjectId> = (0..200).map(|_| ObjectId::generate()).collect();
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn test_bounds_centered() {
        let obj = CanvasObject::new(
            ObjectKind::Rectangle {
                background_color: None,
            },
            100.0,
            50.0,
            40.0,
            20.0,
        );
        let b = obj.bounds();
        assert!((b.x0 - 80.0).abs() < f64::EPSILON);
        assert!((b.y0 - 40.0).abs() < f64::EPSILON);
        assert!((b.x1 - 120.0).abs() < f64::EPSILON);
        assert!((b.y1 - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serde_camel_case_wire_shape() {
        let mut obj = CanvasObject::new(
            ObjectKind::Text {
                content: "hello".to_string(),
                font_size: 18.0,
            },
            10.0,
            20.0,
            100.0,
            30.0,
        );
        obj.z_index = 3;
        let json = serde_json::to_string(&obj).unwrap();
        assert!(json.contains("\"type\":\"text\""));
        assert!(json.contains("\"fontSize\":18.0"));
        assert!(json.contains("\"zIndex\":3"));
        assert!(!json.contains("groupId"));

        let back: CanvasObject = serde_json::from_str(&json).unwrap();
        assert_eq!(back, obj);
    }

    #[test]
    fn test_image_state_round_trip() {
        let obj = CanvasObject::new(
            ObjectKind::Image {
                src: "data:image/png;base64,AAAA".to_string(),
                image_state: Some(ImageState::fitted(400.0, 300.0)),
            },
            0.0,
            0.0,
            400.0,
            300.0,
        );
        let json = serde_json::to_string(&obj).unwrap();
        assert!(json.contains("\"imageState\""));
        assert!(json.contains("\"originalWidth\":400.0"));

        let back: CanvasObject = serde_json::from_str(&json).unwrap();
        let state = back.image_state().unwrap();
        assert!((state.display_width() - 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_font_size_defaults_when_missing() {
        let json = r#"{"id":"a","type":"text","content":"hi","x":0,"y":0,"width":10,"height":10}"#;
        let obj: CanvasObject = serde_json::from_str(json).unwrap();
        match obj.kind {
            ObjectKind::Text { font_size, .. } => assert!((font_size - 16.0).abs() < f64::EPSILON),
            _ => panic!("expected text object"),
        }
    }
}
