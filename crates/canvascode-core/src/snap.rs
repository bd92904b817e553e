//! Center-to-center alignment snapping for single-object drags.

use crate::object::ObjectId;
use crate::scene::SceneStore;
use kurbo::Point;

/// Maximum center distance, in canvas units per axis, at which a drag locks
/// onto another object's center line. Constant in canvas space, so on-screen
/// stickiness grows with zoom.
pub const SNAP_THRESHOLD: f64 = 5.0;

/// Alignment guide lines to draw while a snap is active, in canvas space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnapGuides {
    /// x of the matched vertical center line.
    pub vertical: Option<f64>,
    /// y of the matched horizontal center line.
    pub horizontal: Option<f64>,
}

impl SnapGuides {
    pub fn is_active(&self) -> bool {
        self.vertical.is_some() || self.horizontal.is_some()
    }
}

/// Outcome of snapping a proposed center position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    pub center: Point,
    pub guides: SnapGuides,
}

/// Snap `proposed` (the dragged object's candidate center) against the
/// centers of every other top-level object. Each axis snaps independently to
/// its nearest candidate within [`SNAP_THRESHOLD`]; axes beyond the threshold
/// pass through unchanged.
pub fn snap_center(store: &SceneStore, moving: &[ObjectId], proposed: Point) -> SnapResult {
    let mut best_x: Option<(f64, f64)> = None; // (distance, candidate x)
    let mut best_y: Option<(f64, f64)> = None;

    for obj in store.iter() {
        if moving.contains(&obj.id) || obj.group_id.is_some() {
            continue;
        }
        let dx = (obj.x - proposed.x).abs();
        if dx < SNAP_THRESHOLD && best_x.is_none_or(|(d, _)| dx < d) {
            best_x = Some((dx, obj.x));
        }
        let dy = (obj.y - proposed.y).abs();
        if dy < SNAP_THRESHOLD && best_y.is_none_or(|(d, _)| dy < d) {
            best_y = Some((dy, obj.y));
        }
    }

    let guides = SnapGuides {
        vertical: best_x.map(|(_, x)| x),
        horizontal: best_y.map(|(_, y)| y),
    };
    SnapResult {
        center: Point::new(
            guides.vertical.unwrap_or(proposed.x),
            guides.horizontal.unwrap_or(proposed.y),
        ),
        guides,
    }
}
