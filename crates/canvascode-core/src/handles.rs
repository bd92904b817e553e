//! Resize handle geometry.

use kurbo::{Point, Rect};

/// Screen-pixel radius within which a pointer grabs a handle.
pub const HANDLE_TOLERANCE_PX: f64 = 8.0;

/// One of the eight resize affordances around a selected object.
///
/// Corner handles scale both axes; edge handles act on a single axis
/// (and crop for images).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Nw,
    Ne,
    Sw,
    Se,
    N,
    S,
    E,
    W,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::Nw,
        Handle::Ne,
        Handle::Sw,
        Handle::Se,
        Handle::N,
        Handle::S,
        Handle::E,
        Handle::W,
    ];

    pub fn is_corner(self) -> bool {
        matches!(self, Handle::Nw | Handle::Ne | Handle::Sw | Handle::Se)
    }

    pub fn is_edge(self) -> bool {
        !self.is_corner()
    }

    /// Handle anchor point on the object's bounding box.
    pub fn position(self, bounds: Rect) -> Point {
        let cx = (bounds.x0 + bounds.x1) / 2.0;
        let cy = (bounds.y0 + bounds.y1) / 2.0;
        match self {
            Handle::Nw => Point::new(bounds.x0, bounds.y0),
            Handle::Ne => Point::new(bounds.x1, bounds.y0),
            Handle::Sw => Point::new(bounds.x0, bounds.y1),
            Handle::Se => Point::new(bounds.x1, bounds.y1),
            Handle::N => Point::new(cx, bounds.y0),
            Handle::S => Point::new(cx, bounds.y1),
            Handle::E => Point::new(bounds.x1, cy),
            Handle::W => Point::new(bounds.x0, cy),
        }
    }
}

/// Find the handle under `point` (canvas space), if any. Tolerance is fixed
/// in screen pixels, so it shrinks in canvas units as the view zooms in.
pub fn handle_at(bounds: Rect, point: Point, view_scale: f64) -> Option<Handle> {
    let tolerance = HANDLE_TOLERANCE_PX / view_scale.max(f64::MIN_POSITIVE);
    Handle::ALL
        .into_iter()
        .find(|h| h.position(bounds).distance(point) <= tolerance)
}
